//! Delayed, cancelable tasks of the runtime processors.
//!
//! Each processor owns at most one pending task of every [`TaskKind`]. The
//! queue only stores deadlines: the registry fires due tasks from the same
//! cooperative worker that handles events, so a task never runs concurrently
//! with the pipeline.

use embassy_time::Instant;

use crate::channel::SCHEDULE_SIGNAL;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TaskKind {
    /// Turn the temp layer on
    Activate,
    /// Turn the temp layer off
    Deactivate,
    /// Write the persistent settings to the store
    Save,
}

impl TaskKind {
    const ALL: [TaskKind; 3] = [TaskKind::Activate, TaskKind::Deactivate, TaskKind::Save];

    const fn index(self) -> usize {
        match self {
            TaskKind::Activate => 0,
            TaskKind::Deactivate => 1,
            TaskKind::Save => 2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskKey {
    pub processor: u8,
    pub kind: TaskKind,
}

impl TaskKey {
    pub const fn new(processor: u8, kind: TaskKind) -> Self {
        Self { processor, kind }
    }
}

/// Scheduling operations used by a processor while it handles an event
pub trait Schedule {
    /// Schedule `key` at `at`, replacing its previous deadline
    fn schedule(&mut self, key: TaskKey, at: Instant);

    /// Cancel `key`, returns whether it was pending
    fn cancel(&mut self, key: TaskKey) -> bool;

    fn is_pending(&self, key: TaskKey) -> bool;
}

/// Deadlines of up to `N` processors
pub struct TaskQueue<const N: usize> {
    deadlines: [[Option<Instant>; 3]; N],
}

impl<const N: usize> Default for TaskQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> TaskQueue<N> {
    pub const fn new() -> Self {
        Self {
            deadlines: [[None; 3]; N],
        }
    }

    fn slot(&self, key: TaskKey) -> Option<&Option<Instant>> {
        self.deadlines.get(key.processor as usize).map(|s| &s[key.kind.index()])
    }

    fn slot_mut(&mut self, key: TaskKey) -> Option<&mut Option<Instant>> {
        self.deadlines
            .get_mut(key.processor as usize)
            .map(|s| &mut s[key.kind.index()])
    }

    pub fn deadline(&self, key: TaskKey) -> Option<Instant> {
        self.slot(key).copied().flatten()
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.iter().flatten().filter_map(|d| *d).min()
    }

    /// Remove and return the earliest task that is due at `now`
    pub fn pop_due(&mut self, now: Instant) -> Option<TaskKey> {
        let mut due: Option<(TaskKey, Instant)> = None;
        for (processor, slots) in self.deadlines.iter().enumerate() {
            for kind in TaskKind::ALL {
                let Some(at) = slots[kind.index()] else {
                    continue;
                };
                if at <= now && due.is_none_or(|(_, earliest)| at < earliest) {
                    due = Some((TaskKey::new(processor as u8, kind), at));
                }
            }
        }
        let (key, _) = due?;
        self.cancel(key);
        Some(key)
    }
}

impl<const N: usize> Schedule for TaskQueue<N> {
    fn schedule(&mut self, key: TaskKey, at: Instant) {
        match self.slot_mut(key) {
            Some(slot) => {
                trace!("Schedule {:?} at {}ms", key, at.as_millis());
                *slot = Some(at);
                SCHEDULE_SIGNAL.signal(());
            }
            None => warn!("Cannot schedule task of unknown processor {}", key.processor),
        }
    }

    fn cancel(&mut self, key: TaskKey) -> bool {
        self.slot_mut(key).and_then(|slot| slot.take()).is_some()
    }

    fn is_pending(&self, key: TaskKey) -> bool {
        self.deadline(key).is_some()
    }
}
