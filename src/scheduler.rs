//! # Scheduler
//!
//! The task registry together with its two drivers: the tick advancement
//! run from the periodic timer interrupt, and the dispatch pass run from
//! the main loop.
//!
//! ## Division of labour
//!
//! - [`Scheduler::tick`] only counts down and raises triggers. It never
//!   runs a handler, never clears a handler and never changes `reload`,
//!   which keeps the interrupt context O(`MAX_TASKS`) and bounded.
//! - [`Scheduler::dispatch`] runs every triggered handler once, in slot
//!   order, clearing the trigger *before* the call and retiring one-shot
//!   tasks right after it.
//!
//! A handler that does not return promptly delays every later slot in the
//! pass and every later tick's servicing. Scheduling is cooperative.
//!
//! ## Coalescing
//!
//! Triggers are a flag, not a queue. If dispatch falls behind, all ticks
//! that expired a task's countdown in the meantime collapse into a single
//! execution.

use log::{debug, warn};

use crate::config::{Ticks, MAX_TASKS};
use crate::error::{SchedulerError, SchedulerResult};
use crate::task::{SlotState, TaskFn, TaskHandle, TaskSlot};

// ---------------------------------------------------------------------------
// Scheduler struct
// ---------------------------------------------------------------------------

/// Fixed-capacity registry of timed callbacks.
///
/// Slot index is both the task's identity (inside its [`TaskHandle`]) and
/// its dispatch order: ties within one pass go to the lowest index.
#[derive(Debug)]
pub struct Scheduler {
    slots: [TaskSlot; MAX_TASKS],
    /// Ticks since creation, wrapping.
    uptime: u32,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub const fn new() -> Self {
        Self {
            slots: [TaskSlot::EMPTY; MAX_TASKS],
            uptime: 0,
        }
    }

    // -----------------------------------------------------------------------
    // Registration and lifecycle
    // -----------------------------------------------------------------------

    /// Register `task` to first run after `delay` ticks, then every `reload`
    /// ticks. A `reload` of zero runs the task once and frees its slot.
    ///
    /// A `delay` of zero fires on the very next tick.
    pub fn register(&mut self, delay: Ticks, reload: Ticks, task: fn()) -> SchedulerResult<TaskHandle> {
        self.register_task(delay, reload, TaskFn::Plain(task))
    }

    /// Same as [`register`](Self::register), for a handler taking an argument.
    pub fn register_with_arg(
        &mut self,
        delay: Ticks,
        reload: Ticks,
        task: fn(u32),
        arg: u32,
    ) -> SchedulerResult<TaskHandle> {
        self.register_task(delay, reload, TaskFn::WithArg(task, arg))
    }

    /// Install `task` in the first empty slot.
    ///
    /// # Errors
    /// [`SchedulerError::RegistryFull`] when all `MAX_TASKS` slots are taken;
    /// nothing is overwritten.
    pub fn register_task(&mut self, delay: Ticks, reload: Ticks, task: TaskFn) -> SchedulerResult<TaskHandle> {
        let Some(index) = self.slots.iter().position(|slot| !slot.is_occupied()) else {
            warn!("cannot register task: all {} slots in use", MAX_TASKS);
            return Err(SchedulerError::RegistryFull);
        };

        let generation = self.slots[index].install(delay, reload, task);
        debug!("task registered in slot {} (delay {}, reload {})", index, delay, reload);

        Ok(TaskHandle { index, generation })
    }

    /// Remove a task immediately, whatever its state.
    ///
    /// A task that has triggered but not yet been dispatched will not run.
    pub fn cancel(&mut self, handle: TaskHandle) -> SchedulerResult<()> {
        self.slot_mut(handle)?.release();
        debug!("task in slot {} cancelled", handle.index);
        Ok(())
    }

    /// Change the reload value of a live task.
    ///
    /// The current countdown and trigger state are left untouched; the new
    /// value applies from the next trigger. Setting `0` turns a periodic
    /// task into one that retires after its next run.
    pub fn reschedule(&mut self, handle: TaskHandle, reload: Ticks) -> SchedulerResult<()> {
        self.slot_mut(handle)?.reload = reload;
        Ok(())
    }

    fn slot_mut(&mut self, handle: TaskHandle) -> SchedulerResult<&mut TaskSlot> {
        match self.slots.get_mut(handle.index) {
            Some(slot) if slot.matches(handle) => Ok(slot),
            _ => {
                warn!("stale or unknown task handle for slot {}", handle.index);
                Err(SchedulerError::InvalidHandle)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Tick advancement (producer)
    // -----------------------------------------------------------------------

    /// Advance every occupied slot by one tick.
    ///
    /// Call once per tick period from the timer interrupt. Taking `&mut self`
    /// rules out a nested tick on the same registry.
    pub fn tick(&mut self) {
        self.uptime = self.uptime.wrapping_add(1);

        for slot in self.slots.iter_mut() {
            slot.advance();
        }
    }

    // -----------------------------------------------------------------------
    // Dispatch (consumer)
    // -----------------------------------------------------------------------

    /// Run every triggered task once, in slot order.
    ///
    /// Returns the number of handlers executed; `0` means the pass found
    /// nothing to do and the caller may idle until the next tick.
    pub fn dispatch(&mut self) -> usize {
        let mut ran = 0;

        for index in 0..MAX_TASKS {
            if let Some((handle, task)) = self.take_triggered(index) {
                task.run();
                ran += 1;
                self.complete(handle);
            }
        }

        ran
    }

    /// Claim the trigger of slot `index`, if it has one.
    ///
    /// The trigger is cleared before the handler is returned, so the slot
    /// reads `Armed` while its handler runs. Together with
    /// [`complete`](Self::complete) this lets a caller run the handler
    /// without holding the registry.
    pub fn take_triggered(&mut self, index: usize) -> Option<(TaskHandle, TaskFn)> {
        let slot = self.slots.get_mut(index)?;
        if slot.state != SlotState::Triggered {
            return None;
        }

        slot.state = SlotState::Armed;
        let task = slot.task?;
        Some((
            TaskHandle {
                index,
                generation: slot.generation,
            },
            task,
        ))
    }

    /// Finish a dispatched run: retire the task if it is one-shot.
    ///
    /// Nothing happens if the handler cancelled its own slot (or the slot
    /// was reused) in the meantime. Returns `true` when the slot was freed.
    pub fn complete(&mut self, handle: TaskHandle) -> bool {
        match self.slots.get_mut(handle.index) {
            Some(slot) if slot.matches(handle) && slot.reload == 0 => {
                slot.release();
                debug!("one-shot task in slot {} retired", handle.index);
                true
            }
            _ => false,
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// State of the task behind `handle`, or `None` if the handle is stale.
    pub fn state(&self, handle: TaskHandle) -> Option<SlotState> {
        self.live_slot(handle).map(|slot| slot.state)
    }

    /// Ticks left before the task next triggers.
    pub fn remaining(&self, handle: TaskHandle) -> Option<Ticks> {
        self.live_slot(handle).map(|slot| slot.delay)
    }

    pub fn is_scheduled(&self, handle: TaskHandle) -> bool {
        self.live_slot(handle).is_some()
    }

    fn live_slot(&self, handle: TaskHandle) -> Option<&TaskSlot> {
        self.slots.get(handle.index).filter(|slot| slot.matches(handle))
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_occupied()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() == MAX_TASKS
    }

    pub const fn capacity(&self) -> usize {
        MAX_TASKS
    }

    /// True if at least one task is waiting for a dispatch pass.
    pub fn has_pending(&self) -> bool {
        self.slots.iter().any(|slot| slot.state == SlotState::Triggered)
    }

    /// Ticks seen since creation (wraps after `u32::MAX`).
    pub fn uptime(&self) -> u32 {
        self.uptime
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
