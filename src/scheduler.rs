//! One-shot deferred tasks for a single-threaded event loop.
//!
//! Nothing here sleeps or spawns: the host advances the scheduler with the time that
//! passed since the last frame and runs whatever became due.

use std::time::Duration;

/// Identifies a scheduled task so it can be cancelled before it fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

struct Entry<T> {
    handle: TaskHandle,
    remaining: Duration,
    task: T,
}

pub struct Scheduler<T> {
    entries: Vec<Entry<T>>,
    next_id: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
        }
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, delay: Duration, task: T) -> TaskHandle {
        let handle = TaskHandle(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            handle,
            remaining: delay,
            task,
        });
        handle
    }

    /// Returns the task if it had not fired yet.
    pub fn cancel(&mut self, handle: TaskHandle) -> Option<T> {
        let idx = self.entries.iter().position(|e| e.handle == handle)?;
        Some(self.entries.remove(idx).task)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Moves time forward and returns every task that became due, earliest first.
    /// Tasks with equal deadlines keep their scheduling order.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<T> {
        let mut due = Vec::new();
        let mut pending = Vec::with_capacity(self.entries.len());

        for mut entry in self.entries.drain(..) {
            if entry.remaining <= elapsed {
                due.push(entry);
            } else {
                entry.remaining -= elapsed;
                pending.push(entry);
            }
        }
        self.entries = pending;

        due.sort_by_key(|e| (e.remaining, e.handle.0));
        due.into_iter().map(|e| e.task).collect()
    }
}
