use crate::error::SimError;
use crate::event::{Event, EventKind, EventQueue};
use crate::journal::Journal;
use crate::process::{proc_name, Ms, ProcId, ProcState, Workload};
use crate::ready::{ReadyOrder, ReadyQueue};
use crate::stats::RunReport;

use super::{
    bursts_to_go, check_alpha, next_tau, seed_arrivals, RunOutcome, Scheduler, SwitchCost,
};

/// Shortest-remaining-time: preemptive SJF. A process whose tau undercuts
/// the estimated remaining time of the running burst preempts it; the
/// victim goes back to the ready queue keyed by its actual remaining time.
///
/// Unlike the non-preemptive policies, dispatches are not projected ahead:
/// a preemption would invalidate any chain. At most one dispatch is in
/// flight at a time, and if the ready queue reorders while it is pending,
/// the dispatch is retargeted to the new front without moving its due time.
pub struct Srt {
    switch: SwitchCost,
    alpha: f64,
}

impl Srt {
    pub fn new(t_cs: Ms, alpha: f64) -> Result<Srt, SimError> {
        Ok(Srt {
            switch: SwitchCost::new(t_cs)?,
            alpha: check_alpha(alpha)?,
        })
    }
}

struct SrtRun<'a> {
    workload: &'a mut Workload,
    events: EventQueue,
    ready: ReadyQueue,
    journal: Journal,
    running: Option<ProcId>,
    inflight: Option<ProcId>,
    /// When the CPU (including any switch half underway) comes free.
    free_at: Ms,
    busy: Ms,
    terminated: usize,
    half: Ms,
    alpha: f64,
}

impl SrtRun<'_> {
    /// Estimated time left in the running burst: tau minus everything the
    /// burst has executed so far, floored at zero.
    fn est_remaining(&self, id: ProcId, now: Ms) -> Ms {
        let p = self.workload.get(id);
        let executed = (p.current_burst() - p.slice_remaining) + (now - p.run_started);
        p.tau.saturating_sub(executed)
    }

    /// Keep exactly one dispatch in flight whenever the CPU is free and
    /// someone is ready. `reordered` signals that the queue front may have
    /// changed under a pending dispatch.
    fn ensure_dispatch(&mut self, now: Ms, reordered: bool) -> Result<(), SimError> {
        if self.running.is_some() {
            return Ok(());
        }
        let head = match self.ready.peek_front() {
            Some(h) => h,
            None => return Ok(()),
        };
        match self.inflight {
            None => {
                let at = now.max(self.free_at) + self.half;
                self.events.insert(Event::new(head, at, EventKind::Dispatch))?;
                self.inflight = Some(head);
            }
            Some(d) if reordered && d != head => {
                if let Some(prev) = self.events.cancel_dispatch(d) {
                    self.events
                        .insert(Event::new(head, prev.due, EventKind::Dispatch))?;
                    self.inflight = Some(head);
                }
            }
            Some(_) => {}
        }
        Ok(())
    }

    /// Kick the running process off the CPU mid-burst.
    fn preempt(&mut self, now: Ms, victim: ProcId) -> Result<(), SimError> {
        self.events.cancel_completion(victim);
        let run_started = self.workload.get(victim).run_started;
        self.busy += now - run_started;
        {
            let p = self.workload.get_mut(victim);
            p.slice_remaining -= now - run_started;
            p.state = ProcState::Preempted;
            p.preemptions += 1;
        }
        self.running = None;
        self.free_at = now + self.half;
        self.events
            .insert(Event::new(victim, now + self.half, EventKind::Requeue))?;
        self.ensure_dispatch(now, false)
    }

    fn admit(&mut self, now: Ms, id: ProcId, verb: &str) -> Result<(), SimError> {
        let tau = {
            let p = self.workload.get_mut(id);
            p.state = ProcState::Ready;
            p.ready_since = now;
            p.burst_arrived_at = now;
            p.tau
        };
        let reordered = self.ready.enqueue(id, tau)?;
        if let Some(r) = self.running {
            if tau < self.est_remaining(r, now) {
                self.journal.record(
                    now,
                    &format!("Process {} {verb}; preempting {}", proc_name(id), proc_name(r)),
                    &self.ready,
                );
                return self.preempt(now, r);
            }
        }
        self.journal.record(
            now,
            &format!("Process {} {verb}; added to ready queue", proc_name(id)),
            &self.ready,
        );
        self.ensure_dispatch(now, reordered)
    }

    /// Shared tail of BurstComplete and Terminate: the CPU is switching
    /// out until `now + half`, then the next ready process (if any) gets
    /// its switch-in half.
    fn release_cpu(&mut self, now: Ms) -> Result<(), SimError> {
        self.running = None;
        self.free_at = now + self.half;
        self.ensure_dispatch(now, false)
    }
}

impl Scheduler for Srt {
    fn name(&self) -> &'static str {
        "SRT"
    }

    fn run(&self, workload: &mut Workload) -> Result<RunOutcome, SimError> {
        workload.reset();
        let n = workload.len();
        let mut run = SrtRun {
            workload,
            events: EventQueue::with_population(n),
            ready: ReadyQueue::new(ReadyOrder::ByEstimate, n),
            journal: Journal::new(),
            running: None,
            inflight: None,
            free_at: 0,
            busy: 0,
            terminated: 0,
            half: self.switch.half(),
            alpha: self.alpha,
        };
        let mut now: Ms = 0;

        run.journal.record_empty(0, "Simulator started for SRT");
        seed_arrivals(run.workload, &mut run.events)?;

        while run.terminated < n {
            let event = run.events.pop().ok_or(SimError::EmptyQueue {
                queue: "event queue",
            })?;
            now = event.due;
            let id = event.proc;
            match event.kind {
                EventKind::Arrival => run.admit(now, id, "arrived")?,
                EventKind::IoComplete => run.admit(now, id, "completed I/O")?,
                EventKind::Requeue => {
                    let key = {
                        let p = run.workload.get_mut(id);
                        p.state = ProcState::Ready;
                        p.ready_since = now;
                        p.slice_remaining
                    };
                    let reordered = run.ready.enqueue(id, key)?;
                    run.ensure_dispatch(now, reordered)?;
                }
                EventKind::Dispatch => {
                    run.inflight = None;
                    let front = run.ready.dequeue_front();
                    debug_assert_eq!(front, Some(id));
                    run.running = Some(id);
                    let (remaining, fresh, full_burst, last) = {
                        let p = run.workload.get_mut(id);
                        p.state = ProcState::Running;
                        p.wait += now - p.ready_since;
                        p.switches += 1;
                        p.run_started = now;
                        let fresh = p.slice_remaining == 0;
                        if fresh {
                            p.slice_remaining = p.current_burst();
                        }
                        (p.slice_remaining, fresh, p.current_burst(), p.bursts_left == 1)
                    };
                    if fresh {
                        run.journal.record(
                            now,
                            &format!(
                                "Process {} started using the CPU for {full_burst}ms burst",
                                proc_name(id)
                            ),
                            &run.ready,
                        );
                    } else {
                        run.journal.record(
                            now,
                            &format!(
                                "Process {} started using the CPU for remaining {remaining}ms of {full_burst}ms burst",
                                proc_name(id)
                            ),
                            &run.ready,
                        );
                    }
                    let kind = if last {
                        EventKind::Terminate
                    } else {
                        EventKind::BurstComplete
                    };
                    run.events.insert(Event::new(id, now + remaining, kind))?;
                    run.free_at = now + remaining;
                }
                EventKind::BurstComplete => {
                    let (left, resume, old_tau, new_tau) = {
                        let run_started = run.workload.get(id).run_started;
                        run.busy += now - run_started;
                        let p = run.workload.get_mut(id);
                        let old = p.tau;
                        p.tau = next_tau(run.alpha, p.current_burst(), old);
                        p.slice_remaining = 0;
                        p.bursts_left -= 1;
                        p.state = ProcState::Waiting;
                        p.turnaround += now + run.half - p.burst_arrived_at;
                        (p.bursts_left, now + p.current_io() + run.half, old, p.tau)
                    };
                    run.journal.record(
                        now,
                        &format!(
                            "Process {} completed a CPU burst; {}",
                            proc_name(id),
                            bursts_to_go(left)
                        ),
                        &run.ready,
                    );
                    run.journal.record(
                        now,
                        &format!(
                            "Recalculated tau for process {}: old tau {old_tau}ms ==> new tau {new_tau}ms",
                            proc_name(id)
                        ),
                        &run.ready,
                    );
                    run.journal.record(
                        now,
                        &format!(
                            "Process {} switching out of CPU; blocking on I/O until time {resume}ms",
                            proc_name(id)
                        ),
                        &run.ready,
                    );
                    run.events.insert(Event::new(id, resume, EventKind::IoComplete))?;
                    run.release_cpu(now)?;
                }
                EventKind::Terminate => {
                    {
                        let run_started = run.workload.get(id).run_started;
                        run.busy += now - run_started;
                        let p = run.workload.get_mut(id);
                        p.slice_remaining = 0;
                        p.bursts_left -= 1;
                        p.state = ProcState::Terminated;
                        p.turnaround += now + run.half - p.burst_arrived_at;
                    }
                    run.journal
                        .record(now, &format!("Process {} terminated", proc_name(id)), &run.ready);
                    run.terminated += 1;
                    run.release_cpu(now)?;
                }
                EventKind::Preempt => {
                    unreachable!("SRT models preemption as completion cancellation")
                }
            }
        }

        let end = now + self.switch.half();
        run.journal.record_empty(end, "Simulator ended for SRT");
        let report = RunReport::from_workload(self.name(), end, run.busy, run.workload);
        Ok(RunOutcome {
            journal: run.journal,
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{Process, ProcessClass};

    fn run(procs: Vec<Process>) -> RunOutcome {
        let mut workload = Workload::new(procs).unwrap();
        Srt::new(4, 0.5).unwrap().run(&mut workload).unwrap()
    }

    #[test]
    fn test_shorter_newcomer_preempts_running_burst() {
        let outcome = run(vec![
            Process::new(ProcessClass::CpuBound, 0, vec![100], vec![], 100),
            Process::new(ProcessClass::IoBound, 10, vec![10], vec![], 10),
        ]);
        assert_eq!(
            outcome.journal.lines(),
            &[
                "time 0ms: Simulator started for SRT [Q empty]",
                "time 0ms: Process A0 arrived; added to ready queue [Q A0]",
                "time 2ms: Process A0 started using the CPU for 100ms burst [Q empty]",
                "time 10ms: Process A1 arrived; preempting A0 [Q A1]",
                "time 14ms: Process A1 started using the CPU for 10ms burst [Q A0]",
                "time 24ms: Process A1 terminated [Q A0]",
                "time 28ms: Process A0 started using the CPU for remaining 92ms of 100ms burst [Q empty]",
                "time 120ms: Process A0 terminated [Q empty]",
                "time 122ms: Simulator ended for SRT [Q empty]",
            ]
        );
        assert_eq!(outcome.report.cpu_busy, 110);
        assert_eq!(outcome.report.run_length, 122);
        assert_eq!(outcome.report.per_process[0].preemptions, 1);
        assert_eq!(outcome.report.per_process[1].preemptions, 0);
    }

    #[test]
    fn test_longer_newcomer_waits_its_turn() {
        // by t=10 the runner's estimate is exhausted, so nothing undercuts it
        let outcome = run(vec![
            Process::new(ProcessClass::CpuBound, 0, vec![20], vec![], 5),
            Process::new(ProcessClass::IoBound, 10, vec![4], vec![], 50),
        ]);
        let lines = outcome.journal.lines();
        assert!(lines.contains(
            &"time 10ms: Process A1 arrived; added to ready queue [Q A1]".to_string()
        ));
        assert!(lines.contains(&"time 22ms: Process A0 terminated [Q A1]".to_string()));
        assert!(lines.contains(
            &"time 26ms: Process A1 started using the CPU for 4ms burst [Q empty]".to_string()
        ));
        assert_eq!(outcome.report.per_process[0].preemptions, 0);
    }

    #[test]
    fn test_pending_dispatch_retargets_to_new_front() {
        // A0's dispatch is in flight when A1 arrives with a smaller tau;
        // the dispatch slot keeps its time but A1 takes it
        let outcome = run(vec![
            Process::new(ProcessClass::CpuBound, 0, vec![20], vec![], 20),
            Process::new(ProcessClass::IoBound, 1, vec![5], vec![], 5),
        ]);
        let lines = outcome.journal.lines();
        assert!(lines.contains(
            &"time 2ms: Process A1 started using the CPU for 5ms burst [Q A0]".to_string()
        ));
        assert!(lines.contains(
            &"time 11ms: Process A0 started using the CPU for 20ms burst [Q empty]".to_string()
        ));
        // nobody was mid-burst, so no preemptions were charged
        assert_eq!(outcome.report.per_process[0].preemptions, 0);
    }
}
