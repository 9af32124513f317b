use crate::error::SimError;
use crate::event::{Event, EventKind, EventQueue};
use crate::journal::Journal;
use crate::process::{proc_name, Ms, ProcId, ProcState, Workload};
use crate::ready::{ReadyOrder, ReadyQueue};
use crate::stats::RunReport;

use super::{
    bursts_to_go, check_alpha, next_tau, seed_arrivals, RunOutcome, Scheduler, SwitchCost,
};

/// Shortest-job-first over the tau estimate. Non-preemptive, but the ready
/// queue reorders on every insertion, so the projected dispatch chain can
/// go stale: when a newcomer lands ahead of an existing entry, every
/// pending dispatch is drained and re-issued in the new ready order,
/// anchored at the earliest previously committed dispatch time.
pub struct Sjf {
    switch: SwitchCost,
    alpha: f64,
}

impl Sjf {
    pub fn new(t_cs: Ms, alpha: f64) -> Result<Sjf, SimError> {
        Ok(Sjf {
            switch: SwitchCost::new(t_cs)?,
            alpha: check_alpha(alpha)?,
        })
    }

    /// Admit a process to the ready queue and (re)project dispatches.
    fn admit(
        &self,
        now: Ms,
        id: ProcId,
        verb: &str,
        workload: &mut Workload,
        ready: &mut ReadyQueue,
        events: &mut EventQueue,
        journal: &mut Journal,
        free_at: &mut Ms,
        idle: bool,
    ) -> Result<(), SimError> {
        let half = self.switch.half();
        let full = self.switch.full();
        let (tau, burst) = {
            let p = workload.get_mut(id);
            p.state = ProcState::Ready;
            p.ready_since = now;
            p.burst_arrived_at = now;
            (p.tau, p.current_burst())
        };
        let mid = ready.enqueue(id, tau)?;
        journal.record(
            now,
            &format!("Process {} {verb}; added to ready queue", proc_name(id)),
            ready,
        );
        if mid {
            // the projected order is stale; rebuild the whole chain
            let drained = events.drain_dispatches();
            let anchor = drained.iter().map(|e| e.due).min().unwrap_or_else(|| {
                if idle && now >= *free_at {
                    now + half
                } else {
                    *free_at + full
                }
            });
            let order: Vec<ProcId> = ready.iter().collect();
            let mut at = anchor;
            for pid in order {
                events.insert(Event::new(pid, at, EventKind::Dispatch))?;
                *free_at = at + workload.get(pid).current_burst();
                at = *free_at + full;
            }
        } else {
            let at = if idle && ready.len() == 1 && now >= *free_at {
                now + half
            } else if idle && ready.len() == 1 {
                *free_at = now;
                now + half
            } else {
                match events.latest_dispatch() {
                    Some(prev) => prev.due + workload.get(prev.proc).current_burst() + full,
                    None => *free_at + full,
                }
            };
            events.insert(Event::new(id, at, EventKind::Dispatch))?;
            *free_at = at + burst;
        }
        Ok(())
    }
}

impl Scheduler for Sjf {
    fn name(&self) -> &'static str {
        "SJF"
    }

    fn run(&self, workload: &mut Workload) -> Result<RunOutcome, SimError> {
        workload.reset();
        let n = workload.len();
        let half = self.switch.half();

        let mut events = EventQueue::with_population(n);
        let mut ready = ReadyQueue::new(ReadyOrder::ByEstimate, n);
        let mut journal = Journal::new();
        let mut free_at: Ms = 0;
        let mut idle = true;
        let mut busy: Ms = 0;
        let mut terminated = 0usize;
        let mut now: Ms = 0;

        journal.record_empty(0, "Simulator started for SJF");
        seed_arrivals(workload, &mut events)?;

        while terminated < n {
            let event = events.pop().ok_or(SimError::EmptyQueue {
                queue: "event queue",
            })?;
            now = event.due;
            let id = event.proc;
            match event.kind {
                EventKind::Arrival | EventKind::IoComplete => {
                    let verb = if event.kind == EventKind::Arrival {
                        "arrived"
                    } else {
                        "completed I/O"
                    };
                    self.admit(
                        now,
                        id,
                        verb,
                        workload,
                        &mut ready,
                        &mut events,
                        &mut journal,
                        &mut free_at,
                        idle,
                    )?;
                }
                EventKind::Dispatch => {
                    let front = ready.dequeue_front();
                    debug_assert_eq!(front, Some(id));
                    idle = false;
                    let (burst, last) = {
                        let p = workload.get_mut(id);
                        p.state = ProcState::Running;
                        p.wait += now - p.ready_since;
                        p.switches += 1;
                        p.run_started = now;
                        (p.current_burst(), p.bursts_left == 1)
                    };
                    journal.record(
                        now,
                        &format!(
                            "Process {} started using the CPU for {burst}ms burst",
                            proc_name(id)
                        ),
                        &ready,
                    );
                    let kind = if last {
                        EventKind::Terminate
                    } else {
                        EventKind::BurstComplete
                    };
                    events.insert(Event::new(id, now + burst, kind))?;
                    free_at = free_at.max(now + burst);
                }
                EventKind::BurstComplete => {
                    idle = true;
                    let (left, resume, old_tau, new_tau) = {
                        let p = workload.get_mut(id);
                        busy += now - p.run_started;
                        let old = p.tau;
                        p.tau = next_tau(self.alpha, p.current_burst(), old);
                        p.bursts_left -= 1;
                        p.state = ProcState::Waiting;
                        p.turnaround += now + half - p.burst_arrived_at;
                        (p.bursts_left, now + p.current_io() + half, old, p.tau)
                    };
                    journal.record(
                        now,
                        &format!(
                            "Process {} completed a CPU burst; {}",
                            proc_name(id),
                            bursts_to_go(left)
                        ),
                        &ready,
                    );
                    journal.record(
                        now,
                        &format!(
                            "Recalculated tau for process {}: old tau {old_tau}ms ==> new tau {new_tau}ms",
                            proc_name(id)
                        ),
                        &ready,
                    );
                    journal.record(
                        now,
                        &format!(
                            "Process {} switching out of CPU; blocking on I/O until time {resume}ms",
                            proc_name(id)
                        ),
                        &ready,
                    );
                    events.insert(Event::new(id, resume, EventKind::IoComplete))?;
                }
                EventKind::Terminate => {
                    idle = true;
                    {
                        let p = workload.get_mut(id);
                        busy += now - p.run_started;
                        p.bursts_left -= 1;
                        p.state = ProcState::Terminated;
                        p.turnaround += now + half - p.burst_arrived_at;
                    }
                    journal.record(now, &format!("Process {} terminated", proc_name(id)), &ready);
                    terminated += 1;
                }
                EventKind::Preempt | EventKind::Requeue => {
                    unreachable!("SJF never schedules preemption events")
                }
            }
        }

        let end = now + half;
        journal.record_empty(end, "Simulator ended for SJF");
        let report = RunReport::from_workload(self.name(), end, busy, workload);
        Ok(RunOutcome { journal, report })
    }
}
