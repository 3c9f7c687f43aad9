//! # ticksched — Cooperative Tick Scheduler
//!
//! A fixed-capacity registry of timed callbacks for single-core
//! microcontrollers, advanced by a periodic tick interrupt and drained by a
//! polling loop on the main thread.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │          Task bodies (LED, sensor, display, ...)        │
//! ├────────────────────────────────────────────────────────┤
//! │                 Kernel API (kernel.rs)                  │
//! │   init() · register() · cancel() · reschedule() · run() │
//! ├───────────────────────────┬────────────────────────────┤
//! │  Scheduler (scheduler.rs) │  Sync (sync.rs)            │
//! │  ─ tick()     producer    │  ─ critical_section()      │
//! │  ─ dispatch() consumer    │                            │
//! ├───────────────────────────┴────────────────────────────┤
//! │        Task slots (task.rs) · Errors (error.rs)         │
//! ├────────────────────────────────────────────────────────┤
//! │             Arch port (arch/systick.rs)                 │
//! │          SysTick configuration · SysTick handler        │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Timing model
//!
//! - A task registered with `(delay, reload)` first triggers `delay` ticks
//!   later (on the next tick when `delay` is 0), then every `reload` ticks.
//! - `reload == 0` makes the task one-shot: it runs once and its slot is
//!   freed in the same dispatch pass.
//! - Triggers do not queue. A task whose countdown expires several times
//!   before a dispatch pass runs once.
//!
//! ## Contract
//!
//! Scheduling is cooperative: a task body that blocks starves every other
//! task. Handlers must be short and must return.
//!
//! ## Memory Model
//!
//! - **No heap**: the registry is a `[TaskSlot; MAX_TASKS]` in a `static`
//! - **No `alloc`**: pure `core`
//! - **Critical sections**: the `critical-section` crate guards the registry

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod error;
pub mod kernel;
pub mod scheduler;
pub mod sync;
pub mod task;

#[cfg(all(target_arch = "arm", target_os = "none"))]
pub mod arch;

pub use error::{SchedulerError, SchedulerResult};
pub use scheduler::Scheduler;
pub use task::{SlotState, TaskFn, TaskHandle};
