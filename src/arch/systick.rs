//! # Cortex-M SysTick Port
//!
//! SysTick is the tick source: it fires every `1 / TICK_HZ` seconds and its
//! handler advances the global registry. Task bodies never run here; they
//! run from the main loop via [`kernel::run`](crate::kernel::run).
//!
//! SysTick is an exception of fixed nesting level, so it cannot preempt
//! itself. The critical section inside [`kernel::tick`] additionally masks
//! every other interrupt for the duration of the advancement.

use cortex_m::peripheral::syst::SystClkSource;
use cortex_m::peripheral::SYST;

use crate::config::{SYSTEM_CLOCK_HZ, TICK_HZ};
use crate::kernel;

// ---------------------------------------------------------------------------
// SysTick configuration
// ---------------------------------------------------------------------------

/// Configure the SysTick timer for the scheduler tick.
///
/// Sets up SysTick to fire at `TICK_HZ` frequency using the processor
/// clock. Call after registering the start-up tasks.
pub fn configure_systick(syst: &mut SYST) {
    let reload = SYSTEM_CLOCK_HZ / TICK_HZ - 1;
    syst.set_reload(reload);
    syst.clear_current();
    syst.set_clock_source(SystClkSource::Core);
    syst.enable_counter();
    syst.enable_interrupt();
}

/// Idle hook for [`kernel::run`]: sleep until the next interrupt.
#[inline]
pub fn wait_for_tick() {
    cortex_m::asm::wfi();
}

// ---------------------------------------------------------------------------
// SysTick handler
// ---------------------------------------------------------------------------

/// SysTick exception handler — scheduler tick entry point.
#[no_mangle]
#[allow(non_snake_case)]
pub extern "C" fn SysTick() {
    if let Err(err) = kernel::tick() {
        // Registry integrity can no longer be assumed
        panic!("{}", err);
    }
}
