use slab::Slab;

use crate::error::SimError;

/// Key of a process in the workload arena.
pub type ProcId = usize;

/// Simulated milliseconds.
pub type Ms = u64;

/// Largest population the `A0..Z9` naming scheme can express.
pub const MAX_PROCESSES: usize = 260;

/// Printable name for a process id: `A0` for 0, `A9` for 9, `B0` for 10.
/// Numeric id order and lexicographic name order agree by construction, so
/// id tie-breaks and name tie-breaks are the same thing.
pub fn proc_name(id: ProcId) -> String {
    let letter = (b'A' + (id / 10) as u8) as char;
    format!("{}{}", letter, id % 10)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessClass {
    CpuBound,
    IoBound,
}

/// Lifecycle state shared by all four policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcState {
    Arrived,
    Ready,
    Running,
    Preempted,
    Waiting,
    Terminated,
}

/// One process: the immutable workload template plus the per-run mutable
/// state that every policy resets before it starts.
#[derive(Debug, Clone)]
pub struct Process {
    // Template, never mutated after generation.
    pub class: ProcessClass,
    pub arrival: Ms,
    cpu_bursts: Vec<Ms>,
    io_bursts: Vec<Ms>,
    tau0: Ms,

    // Run state.
    pub state: ProcState,
    /// Counts down from the total burst count; reaches 0 exactly once, at
    /// which point the process is Terminated permanently.
    pub bursts_left: usize,
    /// Remaining time in the in-progress CPU burst. Zero when no burst is
    /// underway; only RR and SRT ever leave a burst partially executed.
    pub slice_remaining: Ms,
    /// Exponentially-averaged estimate of the next CPU burst length.
    pub tau: Ms,

    // Accounting.
    pub wait: Ms,
    pub turnaround: Ms,
    pub switches: u64,
    pub preemptions: u64,
    pub ready_since: Ms,
    pub burst_arrived_at: Ms,
    pub run_started: Ms,
}

impl Process {
    /// `io_bursts` must hold exactly one entry per CPU-burst pair, i.e.
    /// one fewer than `cpu_bursts`.
    pub fn new(
        class: ProcessClass,
        arrival: Ms,
        cpu_bursts: Vec<Ms>,
        io_bursts: Vec<Ms>,
        tau0: Ms,
    ) -> Process {
        debug_assert_eq!(io_bursts.len() + 1, cpu_bursts.len());
        let bursts_left = cpu_bursts.len();
        Process {
            class,
            arrival,
            cpu_bursts,
            io_bursts,
            tau0,
            state: ProcState::Arrived,
            bursts_left,
            slice_remaining: 0,
            tau: tau0,
            wait: 0,
            turnaround: 0,
            switches: 0,
            preemptions: 0,
            ready_since: 0,
            burst_arrived_at: 0,
            run_started: 0,
        }
    }

    /// Re-initialize the run state so policies never see each other's
    /// history. In particular tau restarts from its seed value, not from a
    /// previous run's final estimate.
    pub fn reset(&mut self) {
        self.state = ProcState::Arrived;
        self.bursts_left = self.cpu_bursts.len();
        self.slice_remaining = 0;
        self.tau = self.tau0;
        self.wait = 0;
        self.turnaround = 0;
        self.switches = 0;
        self.preemptions = 0;
        self.ready_since = 0;
        self.burst_arrived_at = 0;
        self.run_started = 0;
    }

    pub fn total_bursts(&self) -> usize {
        self.cpu_bursts.len()
    }

    /// Length of the CPU burst the process runs (or is running) next.
    pub fn current_burst(&self) -> Ms {
        self.cpu_bursts[self.total_bursts() - self.bursts_left]
    }

    /// The I/O burst paired with the CPU burst that just completed. Valid
    /// after `bursts_left` was decremented, while it is still at least 1.
    pub fn current_io(&self) -> Ms {
        self.io_bursts[self.total_bursts() - self.bursts_left - 1]
    }

    pub fn cpu_bursts(&self) -> &[Ms] {
        &self.cpu_bursts
    }

    pub fn io_bursts(&self) -> &[Ms] {
        &self.io_bursts
    }

    pub fn total_cpu_time(&self) -> Ms {
        self.cpu_bursts.iter().sum()
    }
}

/// The process population: generated once, reset before each policy run,
/// freed only after all runs complete.
pub struct Workload {
    procs: Slab<Process>,
}

impl Workload {
    pub fn new(procs: Vec<Process>) -> Result<Workload, SimError> {
        if procs.is_empty() || procs.len() > MAX_PROCESSES {
            return Err(SimError::InvalidConfiguration(format!(
                "population must be between 1 and {MAX_PROCESSES} processes, got {}",
                procs.len()
            )));
        }
        let mut slab = Slab::with_capacity(procs.len());
        for p in procs {
            slab.insert(p);
        }
        Ok(Workload { procs: slab })
    }

    pub fn len(&self) -> usize {
        self.procs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.procs.is_empty()
    }

    /// Reset every process's mutable state ahead of a policy run.
    pub fn reset(&mut self) {
        for (_, p) in self.procs.iter_mut() {
            p.reset();
        }
    }

    pub fn get(&self, id: ProcId) -> &Process {
        &self.procs[id]
    }

    pub fn get_mut(&mut self, id: ProcId) -> &mut Process {
        &mut self.procs[id]
    }

    /// Processes in id order (slab keys are dense and ascending here).
    pub fn iter(&self) -> impl Iterator<Item = (ProcId, &Process)> {
        self.procs.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proc_names() {
        assert_eq!(proc_name(0), "A0");
        assert_eq!(proc_name(9), "A9");
        assert_eq!(proc_name(10), "B0");
        assert_eq!(proc_name(259), "Z9");
    }

    #[test]
    fn test_reset_restores_run_state() {
        let mut p = Process::new(ProcessClass::CpuBound, 3, vec![5, 7], vec![4], 10);
        p.state = ProcState::Terminated;
        p.bursts_left = 0;
        p.slice_remaining = 2;
        p.tau = 99;
        p.wait = 42;
        p.switches = 3;
        p.preemptions = 1;

        p.reset();
        assert_eq!(p.state, ProcState::Arrived);
        assert_eq!(p.bursts_left, 2);
        assert_eq!(p.slice_remaining, 0);
        assert_eq!(p.tau, 10);
        assert_eq!(p.wait, 0);
        assert_eq!(p.switches, 0);
        assert_eq!(p.preemptions, 0);
        // the template is untouched
        assert_eq!(p.arrival, 3);
        assert_eq!(p.cpu_bursts(), &[5, 7]);
        assert_eq!(p.io_bursts(), &[4]);
    }

    #[test]
    fn test_burst_indexing_follows_countdown() {
        let mut p = Process::new(ProcessClass::IoBound, 0, vec![5, 7, 9], vec![4, 6], 10);
        assert_eq!(p.current_burst(), 5);
        p.bursts_left -= 1;
        // after the first burst completes, its paired I/O is the first one
        assert_eq!(p.current_io(), 4);
        assert_eq!(p.current_burst(), 7);
        p.bursts_left -= 1;
        assert_eq!(p.current_io(), 6);
        assert_eq!(p.current_burst(), 9);
    }

    #[test]
    fn test_workload_rejects_empty_and_oversized() {
        assert!(Workload::new(Vec::new()).is_err());
        let too_many = (0..=MAX_PROCESSES)
            .map(|_| Process::new(ProcessClass::IoBound, 0, vec![1], vec![], 1))
            .collect();
        assert!(Workload::new(too_many).is_err());
    }
}
