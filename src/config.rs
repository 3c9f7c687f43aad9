//! # Scheduler Configuration
//!
//! Compile-time constants governing the registry and the tick source.
//! All limits are fixed at compile time — no dynamic allocation.

/// Number of task slots in the registry.
/// Registering a task while every slot is occupied fails with
/// [`SchedulerError::RegistryFull`](crate::error::SchedulerError::RegistryFull).
pub const MAX_TASKS: usize = 10;

/// SysTick frequency in Hz. One tick is the scheduler's only unit of time,
/// so at 1000 Hz a `delay` or `reload` of 500 means half a second.
pub const TICK_HZ: u32 = 1000;

/// System clock frequency in Hz (SAMD21 DFLL48M).
pub const SYSTEM_CLOCK_HZ: u32 = 48_000_000;

/// Tick counter type used for `delay` and `reload`.
pub type Ticks = u16;
