//! # Synchronization Primitives
//!
//! The registry is shared between the tick interrupt and the main loop.
//! Every structural access to it goes through a critical section.
//!
//! On target the implementation comes from `cortex-m`'s
//! `critical-section-single-core` feature (PRIMASK masking); host tests use
//! the `critical-section/std` implementation.

pub use ::critical_section::CriticalSection;

/// Execute a closure within a critical section (interrupts disabled).
///
/// Interrupts are disabled on entry and restored on exit, so the tick
/// handler can never observe a slot half-way through registration or
/// retirement.
///
/// # Usage
/// ```ignore
/// sync::critical_section(|cs| {
///     // Access shared state safely
/// });
/// ```
///
/// Keep the enclosed work short: a masked tick is a delayed tick.
#[inline]
pub fn critical_section<F, R>(f: F) -> R
where
    F: FnOnce(CriticalSection<'_>) -> R,
{
    ::critical_section::with(f)
}
