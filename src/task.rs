//! # Task Slot
//!
//! Defines the unit of schedulable work. Each slot of the registry holds at
//! most one task: a countdown, a reload value, a trigger state and the
//! handler to invoke when the countdown expires.
//!
//! ## Slot state machine
//!
//! ```text
//!              register()                  tick() reaches 0
//!   ┌───────┐ ────────────► ┌───────┐ ─────────────────────► ┌───────────┐
//!   │ Empty │               │ Armed │                        │ Triggered │
//!   └───────┘ ◄──────────── └───────┘ ◄───────────────────── └───────────┘
//!       ▲        cancel()                dispatch(), reload > 0     │
//!       │                                                          │
//!       └──────────────────────────────────────────────────────────┘
//!              dispatch() with reload == 0, or cancel()
//! ```
//!
//! Every `install` bumps the slot's generation, so a [`TaskHandle`] issued
//! for an earlier occupant of the same index never matches again.

use crate::config::Ticks;

// ---------------------------------------------------------------------------
// Handler capability
// ---------------------------------------------------------------------------

/// The body the dispatcher runs when a slot triggers.
///
/// Handlers are plain function pointers: they own nothing and borrow
/// nothing from the registry, so a running handler is free to register,
/// cancel or reschedule tasks through the [`kernel`](crate::kernel) API.
#[derive(Debug, Clone, Copy)]
pub enum TaskFn {
    /// A handler taking no argument.
    Plain(fn()),
    /// A handler called with the argument stored at registration, so one
    /// body can serve several resources (e.g. one blink routine per LED).
    WithArg(fn(u32), u32),
}

impl TaskFn {
    #[inline]
    pub fn run(self) {
        match self {
            TaskFn::Plain(f) => f(),
            TaskFn::WithArg(f, arg) => f(arg),
        }
    }
}

// ---------------------------------------------------------------------------
// Slot state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlotState {
    /// Free for registration.
    Empty,
    /// Holds a task that is counting down.
    Armed,
    /// Countdown expired; the handler runs on the next dispatch pass.
    Triggered,
}

/// Opaque reference to a registered task.
///
/// Valid only while the slot at `index` still holds the occupant that was
/// installed with `generation`. The generation is a wrapping `u32`, so a
/// stale handle could only match again after 2^32 installs into the same
/// slot (about 50 days of one re-registration per 1 ms tick).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskHandle {
    pub(crate) index: usize,
    pub(crate) generation: u32,
}

impl TaskHandle {
    /// Slot index, which doubles as the dispatch order of the task.
    pub fn index(&self) -> usize {
        self.index
    }
}

// ---------------------------------------------------------------------------
// Task slot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct TaskSlot {
    pub state: SlotState,
    /// Ticks left until the next trigger.
    pub delay: Ticks,
    /// Countdown restored after each trigger. `0` marks a one-shot task.
    pub reload: Ticks,
    /// Bumped on every install.
    pub generation: u32,
    pub task: Option<TaskFn>,
}

impl TaskSlot {
    pub const EMPTY: Self = Self {
        state: SlotState::Empty,
        delay: 0,
        reload: 0,
        generation: 0,
        task: None,
    };

    #[inline]
    pub fn is_occupied(&self) -> bool {
        self.state != SlotState::Empty
    }

    /// Place a new task in this slot and return its generation.
    pub fn install(&mut self, delay: Ticks, reload: Ticks, task: TaskFn) -> u32 {
        self.generation = self.generation.wrapping_add(1);
        self.state = SlotState::Armed;
        self.delay = delay;
        self.reload = reload;
        self.task = Some(task);
        self.generation
    }

    /// Return the slot to `Empty`, dropping any pending trigger.
    pub fn release(&mut self) {
        self.state = SlotState::Empty;
        self.delay = 0;
        self.reload = 0;
        self.task = None;
    }

    /// Advance the countdown by one tick.
    ///
    /// Returns `true` when the slot triggers on this tick. A slot that is
    /// already triggered stays triggered: missed firings coalesce.
    pub fn advance(&mut self) -> bool {
        if !self.is_occupied() {
            return false;
        }

        if self.delay > 0 {
            self.delay -= 1;
        }

        if self.delay == 0 {
            self.delay = self.reload;
            self.state = SlotState::Triggered;
            return true;
        }

        false
    }

    /// Check whether `handle` still refers to the current occupant.
    #[inline]
    pub fn matches(&self, handle: TaskHandle) -> bool {
        self.is_occupied() && self.generation == handle.generation
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
