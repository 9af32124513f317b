mod fcfs;
mod rr;
mod sjf;
mod srt;
pub use fcfs::Fcfs;
pub use rr::RoundRobin;
pub use sjf::Sjf;
pub use srt::Srt;

use crate::error::SimError;
use crate::event::{Event, EventKind, EventQueue};
use crate::journal::Journal;
use crate::process::{Ms, Workload};
use crate::stats::RunReport;

/// One scheduling policy. `run` consumes an entire workload (resetting its
/// per-run state first) and drives the event loop until every process has
/// terminated.
pub trait Scheduler {
    fn name(&self) -> &'static str;
    fn run(&self, workload: &mut Workload) -> Result<RunOutcome, SimError>;
}

/// What a policy run produces: the full transition journal and the metrics.
pub struct RunOutcome {
    pub journal: Journal,
    pub report: RunReport,
}

/// Context-switch cost, always split into a switch-out half and a
/// switch-in half.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SwitchCost {
    full: Ms,
}

impl SwitchCost {
    pub(crate) fn new(t_cs: Ms) -> Result<SwitchCost, SimError> {
        if t_cs == 0 || t_cs % 2 != 0 {
            return Err(SimError::InvalidConfiguration(format!(
                "context switch time must be a positive even number of ms, got {t_cs}"
            )));
        }
        Ok(SwitchCost { full: t_cs })
    }

    pub(crate) fn full(&self) -> Ms {
        self.full
    }

    pub(crate) fn half(&self) -> Ms {
        self.full / 2
    }
}

pub(crate) fn check_alpha(alpha: f64) -> Result<f64, SimError> {
    if !(0.0..=1.0).contains(&alpha) {
        return Err(SimError::InvalidConfiguration(format!(
            "alpha must lie in [0, 1], got {alpha}"
        )));
    }
    Ok(alpha)
}

/// Exponential-average update of the burst estimate, rounded up. Applied
/// exactly once per completed CPU burst.
pub(crate) fn next_tau(alpha: f64, actual: Ms, tau: Ms) -> Ms {
    (alpha * actual as f64 + (1.0 - alpha) * tau as f64).ceil() as Ms
}

/// Schedule every process's arrival before the loop starts.
pub(crate) fn seed_arrivals(workload: &Workload, events: &mut EventQueue) -> Result<(), SimError> {
    for (id, p) in workload.iter() {
        events.insert(Event::new(id, p.arrival, EventKind::Arrival))?;
    }
    Ok(())
}

/// Journal phrasing for the remaining burst count.
pub(crate) fn bursts_to_go(left: usize) -> String {
    if left == 1 {
        "1 burst to go".to_string()
    } else {
        format!("{left} bursts to go")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{ProcState, Process, ProcessClass};
    use crate::workload::{generate, WorkloadParams};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_switch_cost_must_be_positive_and_even() {
        assert!(SwitchCost::new(0).is_err());
        assert!(SwitchCost::new(3).is_err());
        let cost = SwitchCost::new(4).unwrap();
        assert_eq!(cost.full(), 4);
        assert_eq!(cost.half(), 2);
    }

    #[test]
    fn test_next_tau_rounds_up() {
        // alpha 1/2: (6 + 10) / 2 = 8 exactly
        assert_eq!(next_tau(0.5, 6, 10), 8);
        // alpha 3/4: 0.75*7 + 0.25*10 = 7.75, rounds to 8
        assert_eq!(next_tau(0.75, 7, 10), 8);
        // alpha 0 keeps the old estimate
        assert_eq!(next_tau(0.0, 99, 10), 10);
    }

    #[test]
    fn test_bursts_to_go_phrasing() {
        assert_eq!(bursts_to_go(1), "1 burst to go");
        assert_eq!(bursts_to_go(2), "2 bursts to go");
    }

    fn generated_workload(seed: u64) -> Workload {
        let params = WorkloadParams::new(6, 2, 0.01, 300.0).unwrap();
        let mut rng = StdRng::seed_from_u64(seed);
        generate(params, &mut rng).unwrap()
    }

    fn all_policies() -> Vec<Box<dyn Scheduler>> {
        vec![
            Box::new(Fcfs::new(4).unwrap()),
            Box::new(Sjf::new(4, 0.5).unwrap()),
            Box::new(Srt::new(4, 0.5).unwrap()),
            Box::new(RoundRobin::new(4, 32).unwrap()),
        ]
    }

    #[test]
    fn test_every_policy_terminates_all_processes() {
        let mut workload = generated_workload(11);
        let total_cpu: Ms = workload.iter().map(|(_, p)| p.total_cpu_time()).sum();
        for policy in all_policies() {
            let outcome = policy.run(&mut workload).unwrap();
            for (_, p) in workload.iter() {
                assert_eq!(p.state, ProcState::Terminated, "{}", policy.name());
                assert_eq!(p.bursts_left, 0);
            }
            // every ms of every burst executed exactly once
            assert_eq!(outcome.report.cpu_busy, total_cpu, "{}", policy.name());
            assert!(outcome.report.run_length >= total_cpu);
        }
    }

    #[test]
    fn test_runs_are_deterministic_and_isolated() {
        let mut workload = generated_workload(23);
        for policy in all_policies() {
            let first = policy.run(&mut workload).unwrap();
            let second = policy.run(&mut workload).unwrap();
            assert_eq!(first.journal, second.journal, "{}", policy.name());
        }
    }

    #[test]
    fn test_single_long_run_smoke() {
        // bigger population exercises mid-queue insertions and preemptions
        let params = WorkloadParams::new(16, 6, 0.001, 3000.0).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let mut workload = generate(params, &mut rng).unwrap();
        for policy in all_policies() {
            let outcome = policy.run(&mut workload).unwrap();
            assert!(!outcome.journal.is_empty(), "{}", policy.name());
        }
    }

    #[test]
    fn test_handcrafted_workload_runs_everywhere() {
        let procs = vec![
            Process::new(ProcessClass::CpuBound, 0, vec![8, 12], vec![20], 10),
            Process::new(ProcessClass::IoBound, 5, vec![6], vec![], 10),
        ];
        let mut workload = Workload::new(procs).unwrap();
        for policy in all_policies() {
            let outcome = policy.run(&mut workload).unwrap();
            assert_eq!(outcome.report.cpu_busy, 26, "{}", policy.name());
        }
    }
}
