//! # Kernel
//!
//! The process-wide task registry and the entry points the host wires up.
//!
//! ```text
//! reset_handler (cortex-m-rt)
//!   └─► main()
//!         ├─► kernel::init()            ← Empty registry
//!         ├─► kernel::register() (×N)   ← Install tasks
//!         ├─► arch::configure_systick() ← Start the 1 ms tick
//!         └─► kernel::run(idle)         ← Dispatch forever (no return)
//!
//! SysTick ──► kernel::tick()            ← Count down, raise triggers
//! ```
//!
//! Every registry access happens inside a short critical section. The
//! dispatcher claims one trigger at a time, then runs that handler with
//! interrupts enabled and without holding the registry, so ticks keep
//! arriving during long handlers and handlers may call back into this API.

use core::cell::RefCell;

use critical_section::Mutex;
use log::error;

use crate::config::{Ticks, MAX_TASKS};
use crate::error::{SchedulerError, SchedulerResult};
use crate::scheduler::Scheduler;
use crate::sync;
use crate::task::{SlotState, TaskFn, TaskHandle};

// ---------------------------------------------------------------------------
// Global scheduler instance
// ---------------------------------------------------------------------------

/// Global scheduler instance, created empty at start-up and never freed.
static SCHEDULER: Mutex<RefCell<Scheduler>> = Mutex::new(RefCell::new(Scheduler::new()));

fn with_scheduler<R>(f: impl FnOnce(&mut Scheduler) -> R) -> R {
    sync::critical_section(|cs| f(&mut SCHEDULER.borrow_ref_mut(cs)))
}

// ---------------------------------------------------------------------------
// Kernel API
// ---------------------------------------------------------------------------

/// Reset the registry to empty. Call once before starting the tick.
pub fn init() {
    with_scheduler(|scheduler| *scheduler = Scheduler::new());
}

/// Register a task; see [`Scheduler::register`].
///
/// Safe to call from the main loop and from a running task body.
pub fn register(delay: Ticks, reload: Ticks, task: fn()) -> SchedulerResult<TaskHandle> {
    with_scheduler(|scheduler| scheduler.register_task(delay, reload, TaskFn::Plain(task)))
}

pub fn register_with_arg(delay: Ticks, reload: Ticks, task: fn(u32), arg: u32) -> SchedulerResult<TaskHandle> {
    with_scheduler(|scheduler| scheduler.register_task(delay, reload, TaskFn::WithArg(task, arg)))
}

/// Cancel a task. A pending trigger is dropped with it.
pub fn cancel(handle: TaskHandle) -> SchedulerResult<()> {
    with_scheduler(|scheduler| scheduler.cancel(handle))
}

pub fn reschedule(handle: TaskHandle, reload: Ticks) -> SchedulerResult<()> {
    with_scheduler(|scheduler| scheduler.reschedule(handle, reload))
}

pub fn state(handle: TaskHandle) -> Option<SlotState> {
    with_scheduler(|scheduler| scheduler.state(handle))
}

pub fn is_scheduled(handle: TaskHandle) -> bool {
    with_scheduler(|scheduler| scheduler.is_scheduled(handle))
}

/// Number of registered tasks.
pub fn task_count() -> usize {
    with_scheduler(|scheduler| scheduler.len())
}

pub fn has_pending() -> bool {
    with_scheduler(|scheduler| scheduler.has_pending())
}

/// Ticks since start-up.
pub fn uptime() -> u32 {
    with_scheduler(|scheduler| scheduler.uptime())
}

// ---------------------------------------------------------------------------
// Tick and dispatch entry points
// ---------------------------------------------------------------------------

/// Tick entry point, called from the periodic timer interrupt.
///
/// The whole advancement runs with interrupts masked, so on a single core a
/// second tick cannot start before this one ends.
///
/// # Errors
/// [`SchedulerError::ReentrantTick`] if the registry is already borrowed.
/// This is a host contract violation; the registry is left untouched.
pub fn tick() -> SchedulerResult<()> {
    sync::critical_section(|cs| match SCHEDULER.borrow(cs).try_borrow_mut() {
        Ok(mut scheduler) => {
            scheduler.tick();
            Ok(())
        }
        Err(_) => {
            error!("tick entered while the task registry was borrowed");
            Err(SchedulerError::ReentrantTick)
        }
    })
}

/// Run one dispatch pass over the global registry.
///
/// Returns the number of handlers executed.
pub fn dispatch() -> usize {
    let mut ran = 0;

    for index in 0..MAX_TASKS {
        let due = with_scheduler(|scheduler| scheduler.take_triggered(index));

        if let Some((handle, task)) = due {
            task.run();
            ran += 1;
            with_scheduler(|scheduler| scheduler.complete(handle));
        }
    }

    ran
}

/// One iteration of the main loop: dispatch, then idle if there was
/// nothing to do.
///
/// `idle` runs inside a critical section and only when no trigger is
/// pending. On Cortex-M a `wfi` there still wakes on the masked SysTick,
/// whose handler then runs as soon as the section ends, so no tick is
/// slept through.
pub fn poll<F: FnOnce()>(idle: F) -> usize {
    let ran = dispatch();

    if ran == 0 {
        sync::critical_section(|cs| {
            let pending = SCHEDULER.borrow_ref(cs).has_pending();
            if !pending {
                idle();
            }
        });
    }

    ran
}

/// Dispatch forever. Pass `arch::wait_for_tick` for low-power idling, or a
/// no-op closure for a pure busy-poll.
pub fn run<F: FnMut()>(mut idle: F) -> ! {
    loop {
        poll(&mut idle);
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;
    use core::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Mutex as TestLock, MutexGuard};

    // The registry is global; kernel tests must not interleave.
    static KERNEL_LOCK: TestLock<()> = TestLock::new(());

    static RUNS: [AtomicU32; 4] = [
        AtomicU32::new(0),
        AtomicU32::new(0),
        AtomicU32::new(0),
        AtomicU32::new(0),
    ];

    static SAVED: Mutex<Cell<Option<TaskHandle>>> = Mutex::new(Cell::new(None));

    fn setup() -> MutexGuard<'static, ()> {
        let guard = KERNEL_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        init();
        for run in RUNS.iter() {
            run.store(0, Ordering::SeqCst);
        }
        sync::critical_section(|cs| SAVED.borrow(cs).set(None));
        guard
    }

    fn saved() -> Option<TaskHandle> {
        sync::critical_section(|cs| SAVED.borrow(cs).get())
    }

    fn save(handle: TaskHandle) {
        sync::critical_section(|cs| SAVED.borrow(cs).set(Some(handle)));
    }

    fn record(id: u32) {
        RUNS[id as usize].fetch_add(1, Ordering::SeqCst);
    }

    fn runs(id: u32) -> u32 {
        RUNS[id as usize].load(Ordering::SeqCst)
    }

    #[test]
    fn test_tick_and_dispatch_through_kernel() {
        let _guard = setup();
        let handle = register_with_arg(2, 3, record, 0).unwrap();

        tick().unwrap();
        assert_eq!(dispatch(), 0);
        tick().unwrap();
        assert_eq!(state(handle), Some(SlotState::Triggered));
        assert_eq!(dispatch(), 1);
        assert_eq!(runs(0), 1);
        assert_eq!(uptime(), 2);
    }

    #[test]
    fn test_reentrant_tick_is_reported() {
        let _guard = setup();
        register(1, 1, || {}).unwrap();

        let nested = with_scheduler(|_| tick());
        assert_eq!(nested, Err(SchedulerError::ReentrantTick));
        assert!(!has_pending(), "Rejected tick must not touch the registry");
        assert_eq!(uptime(), 0);
    }

    #[test]
    fn test_handler_can_register_follow_up() {
        fn first() {
            record(0);
            register_with_arg(1, 0, record, 1).unwrap();
        }

        let _guard = setup();
        register(0, 0, first).unwrap();

        tick().unwrap();
        dispatch();
        assert_eq!(runs(0), 1);
        assert_eq!(task_count(), 1, "First retired, follow-up registered");

        tick().unwrap();
        dispatch();
        assert_eq!(runs(1), 1);
        assert_eq!(task_count(), 0);
    }

    #[test]
    fn test_handler_cancels_later_triggered_task() {
        fn canceller() {
            record(0);
            if let Some(victim) = saved() {
                cancel(victim).unwrap();
            }
        }

        let _guard = setup();
        register(1, 5, canceller).unwrap();
        let victim = register_with_arg(1, 5, record, 1).unwrap();
        save(victim);

        tick().unwrap();
        assert_eq!(dispatch(), 1, "Cancelled task must not run in the same pass");
        assert_eq!(runs(0), 1);
        assert_eq!(runs(1), 0);
        assert!(!is_scheduled(victim));
    }

    #[test]
    fn test_handler_cancels_itself() {
        fn self_cancel() {
            record(0);
            if let Some(me) = saved() {
                cancel(me).unwrap();
            }
        }

        let _guard = setup();
        let handle = register(0, 1, self_cancel).unwrap();
        save(handle);

        for _ in 0..5 {
            tick().unwrap();
            dispatch();
        }
        assert_eq!(runs(0), 1);
        assert_eq!(task_count(), 0);
    }

    #[test]
    fn test_handler_reschedules_itself() {
        fn slow_down() {
            record(0);
            if let Some(me) = saved() {
                reschedule(me, 4).unwrap();
            }
        }

        let _guard = setup();
        let handle = register(1, 1, slow_down).unwrap();
        save(handle);

        // Fires at tick 1 and 2 (reload 1 was already applied at tick 1),
        // then every 4 ticks: 6, 10
        for _ in 0..10 {
            tick().unwrap();
            dispatch();
        }
        assert_eq!(runs(0), 4);
    }

    #[test]
    fn test_reschedule_retired_task_reports_error() {
        let _guard = setup();
        let handle = register_with_arg(0, 0, record, 0).unwrap();
        tick().unwrap();
        dispatch();

        assert_eq!(reschedule(handle, 500), Err(SchedulerError::InvalidHandle));
        assert_eq!(cancel(handle), Err(SchedulerError::InvalidHandle));
    }

    #[test]
    fn test_poll_idles_only_when_nothing_pending() {
        let _guard = setup();
        register_with_arg(1, 2, record, 0).unwrap();
        let idled = Cell::new(0);

        assert_eq!(poll(|| idled.set(idled.get() + 1)), 0);
        assert_eq!(idled.get(), 1);

        tick().unwrap();
        assert_eq!(poll(|| idled.set(idled.get() + 1)), 1);
        assert_eq!(idled.get(), 1, "Busy pass must not idle");
    }

    #[test]
    fn test_concurrent_tick_source() {
        let _guard = setup();
        register_with_arg(0, 1, record, 0).unwrap();
        let one_shot = register_with_arg(50, 0, record, 1).unwrap();

        let ticker = std::thread::spawn(|| {
            for _ in 0..500 {
                tick().unwrap();
                std::thread::yield_now();
            }
        });

        while !ticker.is_finished() {
            dispatch();
        }
        ticker.join().unwrap();
        dispatch();

        let periodic = runs(0);
        assert!(periodic >= 1 && periodic <= 500, "Periodic runs out of bounds: {}", periodic);
        assert_eq!(runs(1), 1, "One-shot must run exactly once");
        assert!(!is_scheduled(one_shot));
        assert_eq!(uptime(), 500);
    }
}
