//! Cooperative virtual-time scheduler.
//!
//! Every periodic tick and every delayed callback is a [`Task`] in a
//! min-heap keyed by due time. Tasks due at the same millisecond run in
//! the order they were scheduled. Nothing runs concurrently: the caller
//! pops one task, runs it to completion, and only then pops the next.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use medsim_events::{AgentKey, TimerAction};

/// Work the scheduler hands back when it comes due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    /// Periodic tick of the agent at this index.
    Tick(usize),
    /// One-shot callback for an agent.
    Timer {
        /// Agent to call back.
        owner: AgentKey,
        /// Action handed to the agent.
        action: TimerAction,
    },
}

#[derive(Debug)]
struct Entry {
    due_ms: u64,
    seq: u64,
    task: Task,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.due_ms == other.due_ms && self.seq == other.seq
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.due_ms, self.seq).cmp(&(other.due_ms, other.seq))
    }
}

/// Min-heap of tasks on a virtual millisecond clock.
#[derive(Debug, Default)]
pub struct Scheduler {
    heap: BinaryHeap<Reverse<Entry>>,
    next_seq: u64,
    now_ms: u64,
}

impl Scheduler {
    /// An empty scheduler at virtual time 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time of the task most recently popped.
    pub const fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Schedule `task` at absolute virtual time `due_ms`.
    pub fn schedule_at(&mut self, due_ms: u64, task: Task) {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.saturating_add(1);
        self.heap.push(Reverse(Entry { due_ms, seq, task }));
    }

    /// Schedule `task` `delay_ms` after the current virtual time.
    pub fn schedule_in(&mut self, delay_ms: u64, task: Task) {
        self.schedule_at(self.now_ms.saturating_add(delay_ms), task);
    }

    /// Due time of the earliest task, if any.
    pub fn next_due(&self) -> Option<u64> {
        self.heap.peek().map(|Reverse(entry)| entry.due_ms)
    }

    /// Pop the earliest task if it is due at or before `until_ms`.
    ///
    /// Advances the clock to the task's due time.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<(u64, Task)> {
        if self.next_due()? > until_ms {
            return None;
        }
        let Reverse(entry) = self.heap.pop()?;
        self.now_ms = self.now_ms.max(entry.due_ms);
        Some((entry.due_ms, entry.task))
    }

    /// Move the clock forward to `ms` without running anything.
    pub fn advance_to(&mut self, ms: u64) {
        self.now_ms = self.now_ms.max(ms);
    }

    /// Number of scheduled tasks.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether nothing is scheduled.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use medsim_types::{AgentKind, OrderId};

    use super::*;

    #[test]
    fn tasks_pop_in_due_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_at(300, Task::Tick(2));
        scheduler.schedule_at(100, Task::Tick(0));
        scheduler.schedule_at(200, Task::Tick(1));
        let order: Vec<Task> = std::iter::from_fn(|| scheduler.pop_due(u64::MAX))
            .map(|(_, task)| task)
            .collect();
        assert_eq!(order, vec![Task::Tick(0), Task::Tick(1), Task::Tick(2)]);
    }

    #[test]
    fn ties_run_first_in_first_out() {
        let mut scheduler = Scheduler::new();
        for index in [4, 1, 3, 0, 2] {
            scheduler.schedule_at(500, Task::Tick(index));
        }
        let order: Vec<Task> = std::iter::from_fn(|| scheduler.pop_due(500))
            .map(|(_, task)| task)
            .collect();
        assert_eq!(
            order,
            vec![Task::Tick(4), Task::Tick(1), Task::Tick(3), Task::Tick(0), Task::Tick(2)]
        );
    }

    #[test]
    fn future_tasks_stay_queued() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_at(1_000, Task::Tick(0));
        assert!(scheduler.pop_due(999).is_none());
        assert_eq!(scheduler.next_due(), Some(1_000));
        assert_eq!(scheduler.pop_due(1_000), Some((1_000, Task::Tick(0))));
        assert_eq!(scheduler.now_ms(), 1_000);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn relative_delays_start_from_current_time() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_at(2_000, Task::Tick(0));
        let _ = scheduler.pop_due(2_000);
        let timer = Task::Timer {
            owner: AgentKey::new(AgentKind::Supplier, "S1"),
            action: TimerAction::DeliveryArrived {
                order_id: OrderId::new(),
            },
        };
        scheduler.schedule_in(15_000, timer.clone());
        assert_eq!(scheduler.pop_due(u64::MAX), Some((17_000, timer)));
    }
}
