use std::collections::VecDeque;

use crate::error::SimError;
use crate::process::{proc_name, Ms, ProcId};

/// How the ready queue orders waiting processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyOrder {
    /// Insertion order. FCFS and RR.
    Fifo,
    /// Ascending by a caller-supplied estimate, ties broken by pid. SJF
    /// keys on tau, SRT on tau or checkpointed remaining time.
    ByEstimate,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    proc: ProcId,
    key: Ms,
}

/// The queue of processes waiting for the CPU. Bounded by the population
/// size since a process occupies at most one slot.
pub struct ReadyQueue {
    order: ReadyOrder,
    entries: VecDeque<Entry>,
    capacity: usize,
}

impl ReadyQueue {
    pub fn new(order: ReadyOrder, capacity: usize) -> ReadyQueue {
        ReadyQueue {
            order,
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add a process. `key` is ignored under Fifo ordering. Returns true
    /// when the process landed ahead of an existing entry, meaning the
    /// dispatch order the caller projected earlier is now stale.
    pub fn enqueue(&mut self, proc: ProcId, key: Ms) -> Result<bool, SimError> {
        if self.entries.len() >= self.capacity {
            return Err(SimError::CapacityExceeded {
                queue: "ready queue",
                capacity: self.capacity,
            });
        }
        let at = match self.order {
            ReadyOrder::Fifo => self.entries.len(),
            ReadyOrder::ByEstimate => self
                .entries
                .partition_point(|e| (e.key, e.proc) <= (key, proc)),
        };
        let mid = at < self.entries.len();
        self.entries.insert(at, Entry { proc, key });
        Ok(mid)
    }

    pub fn dequeue_front(&mut self) -> Option<ProcId> {
        self.entries.pop_front().map(|e| e.proc)
    }

    pub fn peek_front(&self) -> Option<ProcId> {
        self.entries.front().map(|e| e.proc)
    }

    /// Queue contents front to back, in dispatch order.
    pub fn iter(&self) -> impl Iterator<Item = ProcId> + '_ {
        self.entries.iter().map(|e| e.proc)
    }

    /// The journal suffix for the queue contents: `" empty"` or one
    /// space-prefixed name per entry, front first.
    pub fn display_ids(&self) -> String {
        if self.entries.is_empty() {
            return " empty".to_string();
        }
        let mut out = String::new();
        for e in &self.entries {
            out.push(' ');
            out.push_str(&proc_name(e.proc));
        }
        out
    }
}
