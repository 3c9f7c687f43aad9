//! # ticksched Demo Firmware
//!
//! The sensor demo board loop, driven by the tick scheduler:
//!
//! | Task | Delay | Reload | Behavior |
//! |------|-------|--------|----------|
//! | `sensor_read` | 0 | 2000 | Poll the sensor bus and cache a sample |
//! | `print_display_data` | 0 | 5000 | Redraw the readings region of the display |
//! | `toggle_led` | 0 | 100 → 500 | Fast blink while warming up, then slow |
//! | `clear_splash` | 1500 | 0 | One-shot: remove the start-up logo |
//! | `poll_console` | 0 | 10 | Service one pending console command |
//! | `button_task` | 0 | 10 | Consume the button edge latched by the EIC interrupt |
//!
//! Hardware drivers are outside this crate; the bodies below only update
//! the state a driver would consume.

#![no_std]
#![no_main]

use core::cell::Cell;
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use cortex_m_rt::entry;
use critical_section::Mutex;
use panic_halt as _;

use ticksched::arch::systick;
use ticksched::config::Ticks;
use ticksched::{kernel, TaskHandle};

/// Samples taken before the LED drops to its steady blink rate.
const WARMUP_SAMPLES: u32 = 3;
const LED_STEADY_PERIOD: Ticks = 500;

static LED_ON: AtomicBool = AtomicBool::new(false);
static SPLASH_VISIBLE: AtomicBool = AtomicBool::new(true);
static SENSOR_SAMPLES: AtomicU32 = AtomicU32::new(0);
static DISPLAY_FRAMES: AtomicU32 = AtomicU32::new(0);
static LAST_SAMPLE_TICK: AtomicU32 = AtomicU32::new(0);
/// Latched by the EIC interrupt of the board support code on a button edge.
static BUTTON_EVENT: AtomicBool = AtomicBool::new(false);
static BUTTON_PRESSES: AtomicU32 = AtomicU32::new(0);

static LED_TASK: Mutex<Cell<Option<TaskHandle>>> = Mutex::new(Cell::new(None));

// ---------------------------------------------------------------------------
// Task bodies
// ---------------------------------------------------------------------------

fn sensor_read() {
    // Single writer (the dispatcher), so load/store is enough on Cortex-M0+
    let samples = SENSOR_SAMPLES.load(Ordering::Relaxed) + 1;
    SENSOR_SAMPLES.store(samples, Ordering::Relaxed);
    LAST_SAMPLE_TICK.store(kernel::uptime(), Ordering::Relaxed);

    if samples == WARMUP_SAMPLES {
        let led = critical_section::with(|cs| LED_TASK.borrow(cs).get());
        if let Some(led) = led {
            if let Err(err) = kernel::reschedule(led, LED_STEADY_PERIOD) {
                log::warn!("LED blink rate unchanged: {}", err);
            }
        }
    }
}

fn print_display_data() {
    if SENSOR_SAMPLES.load(Ordering::Relaxed) == 0 {
        return;
    }
    let frames = DISPLAY_FRAMES.load(Ordering::Relaxed);
    DISPLAY_FRAMES.store(frames.wrapping_add(1), Ordering::Relaxed);
}

fn toggle_led() {
    let on = LED_ON.load(Ordering::Relaxed);
    LED_ON.store(!on, Ordering::Relaxed);
}

fn clear_splash() {
    SPLASH_VISIBLE.store(false, Ordering::Relaxed);
}

fn poll_console() {
    // Console input lives in the UART driver; nothing buffered here
}

fn button_task() {
    // No atomic swap on Cortex-M0+; the EIC handler cannot run inside the section
    let pressed = critical_section::with(|_| {
        let pressed = BUTTON_EVENT.load(Ordering::Relaxed);
        BUTTON_EVENT.store(false, Ordering::Relaxed);
        pressed
    });
    if pressed {
        let presses = BUTTON_PRESSES.load(Ordering::Relaxed);
        BUTTON_PRESSES.store(presses.wrapping_add(1), Ordering::Relaxed);
    }
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

#[entry]
fn main() -> ! {
    let mut cp = cortex_m::Peripherals::take().expect("core peripherals taken once");

    kernel::init();

    kernel::register(0, 2000, sensor_read).expect("Failed to register sensor_read");
    kernel::register(0, 5000, print_display_data).expect("Failed to register print_display_data");
    let led = kernel::register(0, 100, toggle_led).expect("Failed to register toggle_led");
    critical_section::with(|cs| LED_TASK.borrow(cs).set(Some(led)));
    kernel::register(1500, 0, clear_splash).expect("Failed to register clear_splash");
    kernel::register(0, 10, poll_console).expect("Failed to register poll_console");
    kernel::register(0, 10, button_task).expect("Failed to register button_task");

    systick::configure_systick(&mut cp.SYST);

    kernel::run(systick::wait_for_tick)
}
