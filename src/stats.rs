use crate::process::{Ms, ProcId, ProcessClass, Workload};

/// Per-process accounting, copied out of the workload at the end of a run.
#[derive(Debug, Clone, Copy)]
pub struct ProcStats {
    pub proc: ProcId,
    pub class: ProcessClass,
    pub wait: Ms,
    pub turnaround: Ms,
    pub switches: u64,
    pub preemptions: u64,
}

/// Aggregates over a slice of the population (one class, or all of it).
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ClassSummary {
    pub processes: usize,
    pub avg_wait: f64,
    pub avg_turnaround: f64,
    pub switches: u64,
    pub preemptions: u64,
}

/// Everything measured about one policy run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub policy: &'static str,
    /// Simulated time from start to the final switch-out half.
    pub run_length: Ms,
    /// Total time a burst was executing on the CPU.
    pub cpu_busy: Ms,
    pub per_process: Vec<ProcStats>,
}

impl RunReport {
    pub fn from_workload(
        policy: &'static str,
        run_length: Ms,
        cpu_busy: Ms,
        workload: &Workload,
    ) -> RunReport {
        let per_process = workload
            .iter()
            .map(|(id, p)| ProcStats {
                proc: id,
                class: p.class,
                wait: p.wait,
                turnaround: p.turnaround,
                switches: p.switches,
                preemptions: p.preemptions,
            })
            .collect();
        RunReport {
            policy,
            run_length,
            cpu_busy,
            per_process,
        }
    }

    /// Fraction of the run the CPU spent executing bursts, in percent.
    pub fn cpu_utilization(&self) -> f64 {
        if self.run_length == 0 {
            return 0.0;
        }
        self.cpu_busy as f64 * 100.0 / self.run_length as f64
    }

    fn summarize(&self, pick: impl Fn(&ProcStats) -> bool) -> ClassSummary {
        let mut summary = ClassSummary::default();
        let mut bursts = 0u64;
        for s in self.per_process.iter().filter(|s| pick(s)) {
            summary.processes += 1;
            summary.avg_wait += s.wait as f64;
            summary.avg_turnaround += s.turnaround as f64;
            summary.switches += s.switches;
            summary.preemptions += s.preemptions;
            bursts += s.switches;
        }
        // averages are per completed burst, not per process
        if bursts > 0 {
            summary.avg_wait /= bursts as f64;
            summary.avg_turnaround /= bursts as f64;
        }
        summary
    }

    pub fn class_summary(&self, class: ProcessClass) -> ClassSummary {
        self.summarize(|s| s.class == class)
    }

    pub fn overall_summary(&self) -> ClassSummary {
        self.summarize(|_| true)
    }
}
