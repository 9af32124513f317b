use crate::process::Ms;
use crate::ready::ReadyQueue;

/// Ordered record of a run's state transitions. Every line carries the
/// simulated timestamp and the ready-queue contents at the moment the
/// transition happened, so two equal-seed runs can be compared line for
/// line.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Journal {
    lines: Vec<String>,
}

impl Journal {
    pub fn new() -> Journal {
        Journal::default()
    }

    /// Record a transition with the current ready-queue snapshot.
    pub fn record(&mut self, time: Ms, message: &str, ready: &ReadyQueue) {
        self.lines
            .push(format!("time {}ms: {} [Q{}]", time, message, ready.display_ids()));
    }

    /// Record the start/end markers, which always print an empty queue.
    pub fn record_empty(&mut self, time: Ms, message: &str) {
        self.lines
            .push(format!("time {}ms: {} [Q empty]", time, message));
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ready::ReadyOrder;

    #[test]
    fn test_lines_carry_time_and_queue_snapshot() {
        let mut ready = ReadyQueue::new(ReadyOrder::Fifo, 2);
        let mut journal = Journal::new();
        journal.record_empty(0, "Simulator started for FCFS");
        ready.enqueue(0, 0).unwrap();
        journal.record(0, "Process A0 arrived; added to ready queue", &ready);
        assert_eq!(
            journal.lines(),
            &[
                "time 0ms: Simulator started for FCFS [Q empty]",
                "time 0ms: Process A0 arrived; added to ready queue [Q A0]",
            ]
        );
    }
}
