//! # Architecture Abstraction Layer
//!
//! Binds the scheduler to a hardware tick source. Currently implements the
//! Cortex-M SysTick port; other targets add sibling modules.

pub mod systick;
