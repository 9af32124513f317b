use ahash::AHashSet;
use std::collections::VecDeque;

use crate::error::SimError;
use crate::process::{Ms, ProcId};

/// What a scheduled occurrence does when its due time arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Arrival,
    Dispatch,
    BurstComplete,
    Preempt,
    Requeue,
    IoComplete,
    Terminate,
}

impl EventKind {
    /// Tie-break rank for events due at the same millisecond: CPU-side
    /// completions are processed first, then dispatches, then I/O
    /// completions, then arrivals, then everything else.
    pub fn rank(self) -> u8 {
        match self {
            EventKind::BurstComplete => 0,
            EventKind::Terminate => 1,
            EventKind::Preempt => 2,
            EventKind::Dispatch => 3,
            EventKind::IoComplete => 4,
            EventKind::Arrival => 5,
            EventKind::Requeue => 6,
        }
    }

    /// Kinds that end (or cut short) the burst currently on the CPU. At
    /// most one of these may be pending per process, or a burst would be
    /// double-counted.
    fn is_completion(self) -> bool {
        matches!(
            self,
            EventKind::BurstComplete | EventKind::Preempt | EventKind::Terminate
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub proc: ProcId,
    pub due: Ms,
    pub kind: EventKind,
}

impl Event {
    pub fn new(proc: ProcId, due: Ms, kind: EventKind) -> Event {
        Event { proc, due, kind }
    }

    fn key(&self) -> (Ms, u8, ProcId) {
        (self.due, self.kind.rank(), self.proc)
    }
}

/// A process is never waiting on more than a handful of pending events:
/// one completion, one I/O completion, one dispatch, one requeue.
pub const PENDING_PER_PROCESS: usize = 4;

/// Time-ordered schedule of future occurrences. Always sorted ascending by
/// `(due, kind rank, pid)` and bounded by a conservative estimate of how
/// many events can be pending at once.
pub struct EventQueue {
    events: VecDeque<Event>,
    capacity: usize,
    /// Processes with a pending completion-kind event.
    completing: AHashSet<ProcId>,
}

impl EventQueue {
    pub fn with_population(processes: usize) -> EventQueue {
        let capacity = processes * PENDING_PER_PROCESS;
        EventQueue {
            events: VecDeque::with_capacity(capacity),
            capacity,
            completing: AHashSet::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Insert maintaining the sort invariant. Inserting a completion kind
    /// first removes any stale completion pending for the same process, so
    /// a dispatch can never leave two burst-ending events in flight.
    pub fn insert(&mut self, event: Event) -> Result<(), SimError> {
        if event.kind.is_completion() {
            self.cancel_completion(event.proc);
        }
        if self.events.len() >= self.capacity {
            return Err(SimError::CapacityExceeded {
                queue: "event queue",
                capacity: self.capacity,
            });
        }
        let at = self.events.partition_point(|e| e.key() <= event.key());
        self.events.insert(at, event);
        if event.kind.is_completion() {
            self.completing.insert(event.proc);
        }
        Ok(())
    }

    /// Remove and return the earliest event.
    pub fn pop(&mut self) -> Option<Event> {
        let event = self.events.pop_front()?;
        if event.kind.is_completion() {
            self.completing.remove(&event.proc);
        }
        Some(event)
    }

    /// The most recently scheduled dispatch, scanning from the tail. Used
    /// to project when the CPU next becomes free without removing anything.
    pub fn latest_dispatch(&self) -> Option<Event> {
        self.events
            .iter()
            .rev()
            .find(|e| e.kind == EventKind::Dispatch)
            .copied()
    }

    /// Remove the pending completion event for `proc`, if any. Cancellation
    /// is queue removal, not a flag check, so a stale event can never fire.
    pub fn cancel_completion(&mut self, proc: ProcId) -> Option<Event> {
        if !self.completing.remove(&proc) {
            return None;
        }
        let at = self
            .events
            .iter()
            .position(|e| e.proc == proc && e.kind.is_completion())?;
        self.events.remove(at)
    }

    /// Remove the pending dispatch for `proc`, if any.
    pub fn cancel_dispatch(&mut self, proc: ProcId) -> Option<Event> {
        let at = self
            .events
            .iter()
            .position(|e| e.proc == proc && e.kind == EventKind::Dispatch)?;
        self.events.remove(at)
    }

    /// Remove every pending dispatch, earliest first. SJF re-projects the
    /// whole dispatch chain when an insertion reorders the ready queue.
    pub fn drain_dispatches(&mut self) -> Vec<Event> {
        let mut drained = Vec::new();
        let mut kept = VecDeque::with_capacity(self.events.len());
        for e in self.events.drain(..) {
            if e.kind == EventKind::Dispatch {
                drained.push(e);
            } else {
                kept.push_back(e);
            }
        }
        self.events = kept;
        drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pop_order_time_then_kind_then_pid() {
        let mut q = EventQueue::with_population(4);
        // insert out of order on purpose
        q.insert(Event::new(0, 10, EventKind::Arrival)).unwrap();
        q.insert(Event::new(1, 5, EventKind::IoComplete)).unwrap();
        q.insert(Event::new(2, 5, EventKind::BurstComplete)).unwrap();
        q.insert(Event::new(3, 5, EventKind::Dispatch)).unwrap();

        // equal due times resolve by kind rank: completion, dispatch, io
        assert_eq!(q.pop().unwrap().kind, EventKind::BurstComplete);
        assert_eq!(q.pop().unwrap().kind, EventKind::Dispatch);
        assert_eq!(q.pop().unwrap().kind, EventKind::IoComplete);
        assert_eq!(q.pop().unwrap().due, 10);
        assert!(q.pop().is_none());
    }

    #[test]
    fn test_residual_ties_break_on_pid() {
        let mut q = EventQueue::with_population(3);
        q.insert(Event::new(2, 7, EventKind::Arrival)).unwrap();
        q.insert(Event::new(0, 7, EventKind::Arrival)).unwrap();
        q.insert(Event::new(1, 7, EventKind::Arrival)).unwrap();
        assert_eq!(q.pop().unwrap().proc, 0);
        assert_eq!(q.pop().unwrap().proc, 1);
        assert_eq!(q.pop().unwrap().proc, 2);
    }

    #[test]
    fn test_capacity_is_fatal() {
        let mut q = EventQueue::with_population(1);
        for t in 0..PENDING_PER_PROCESS as Ms {
            q.insert(Event::new(0, t, EventKind::Arrival)).unwrap();
        }
        let err = q.insert(Event::new(0, 99, EventKind::Arrival));
        assert_eq!(
            err,
            Err(SimError::CapacityExceeded {
                queue: "event queue",
                capacity: PENDING_PER_PROCESS,
            })
        );
    }

    #[test]
    fn test_at_most_one_pending_completion_per_process() {
        let mut q = EventQueue::with_population(2);
        q.insert(Event::new(0, 20, EventKind::BurstComplete)).unwrap();
        // a re-dispatch overwrites the stale completion instead of stacking
        q.insert(Event::new(0, 12, EventKind::Preempt)).unwrap();
        assert_eq!(q.len(), 1);
        let only = q.pop().unwrap();
        assert_eq!((only.due, only.kind), (12, EventKind::Preempt));
    }

    #[test]
    fn test_cancel_completion_removes_from_queue() {
        let mut q = EventQueue::with_population(2);
        q.insert(Event::new(0, 20, EventKind::Terminate)).unwrap();
        q.insert(Event::new(1, 5, EventKind::Arrival)).unwrap();
        let cancelled = q.cancel_completion(0).unwrap();
        assert_eq!(cancelled.kind, EventKind::Terminate);
        assert!(q.cancel_completion(0).is_none());
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn test_latest_dispatch_scans_from_tail() {
        let mut q = EventQueue::with_population(3);
        q.insert(Event::new(0, 4, EventKind::Dispatch)).unwrap();
        q.insert(Event::new(1, 9, EventKind::Dispatch)).unwrap();
        q.insert(Event::new(2, 11, EventKind::IoComplete)).unwrap();
        let last = q.latest_dispatch().unwrap();
        assert_eq!((last.proc, last.due), (1, 9));
    }

    #[test]
    fn test_drain_dispatches_keeps_everything_else() {
        let mut q = EventQueue::with_population(3);
        q.insert(Event::new(0, 4, EventKind::Dispatch)).unwrap();
        q.insert(Event::new(1, 6, EventKind::IoComplete)).unwrap();
        q.insert(Event::new(2, 9, EventKind::Dispatch)).unwrap();
        let drained = q.drain_dispatches();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].due, 4);
        assert_eq!(drained[1].due, 9);
        assert_eq!(q.len(), 1);
        assert_eq!(q.pop().unwrap().kind, EventKind::IoComplete);
    }
}
