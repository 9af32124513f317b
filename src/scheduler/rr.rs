use crate::error::SimError;
use crate::event::{Event, EventKind, EventQueue};
use crate::journal::Journal;
use crate::process::{proc_name, Ms, ProcId, ProcState, Workload};
use crate::ready::{ReadyOrder, ReadyQueue};
use crate::stats::RunReport;

use super::{bursts_to_go, seed_arrivals, RunOutcome, Scheduler, SwitchCost};

/// Round-robin: FCFS with a time quantum. A burst longer than the quantum
/// is cut by a Preempt event; the victim goes to the back of the queue with
/// its remaining time checkpointed. An expiry with nobody else ready keeps
/// the process on the CPU with a fresh quantum and no switch cost.
pub struct RoundRobin {
    switch: SwitchCost,
    quantum: Ms,
}

impl RoundRobin {
    pub fn new(t_cs: Ms, t_slice: Ms) -> Result<RoundRobin, SimError> {
        if t_slice == 0 {
            return Err(SimError::InvalidConfiguration(
                "time slice must be at least 1ms".to_string(),
            ));
        }
        Ok(RoundRobin {
            switch: SwitchCost::new(t_cs)?,
            quantum: t_slice,
        })
    }

    /// CPU time the next dispatch of `id` will occupy: the remainder of an
    /// interrupted burst or the full next burst, capped by the quantum.
    fn bound(&self, workload: &Workload, id: ProcId) -> Ms {
        let p = workload.get(id);
        let pending = if p.slice_remaining > 0 {
            p.slice_remaining
        } else {
            p.current_burst()
        };
        pending.min(self.quantum)
    }
}

impl Scheduler for RoundRobin {
    fn name(&self) -> &'static str {
        "RR"
    }

    fn run(&self, workload: &mut Workload) -> Result<RunOutcome, SimError> {
        workload.reset();
        let n = workload.len();
        let half = self.switch.half();
        let full = self.switch.full();

        let mut events = EventQueue::with_population(n);
        let mut ready = ReadyQueue::new(ReadyOrder::Fifo, n);
        let mut journal = Journal::new();
        let mut free_at: Ms = 0;
        let mut idle = true;
        let mut busy: Ms = 0;
        let mut terminated = 0usize;
        let mut now: Ms = 0;

        journal.record_empty(0, "Simulator started for RR");
        seed_arrivals(workload, &mut events)?;

        while terminated < n {
            let event = events.pop().ok_or(SimError::EmptyQueue {
                queue: "event queue",
            })?;
            now = event.due;
            let id = event.proc;
            match event.kind {
                EventKind::Arrival | EventKind::IoComplete => {
                    {
                        let p = workload.get_mut(id);
                        p.state = ProcState::Ready;
                        p.ready_since = now;
                        p.burst_arrived_at = now;
                    }
                    ready.enqueue(id, 0)?;
                    let verb = if event.kind == EventKind::Arrival {
                        "arrived"
                    } else {
                        "completed I/O"
                    };
                    journal.record(
                        now,
                        &format!("Process {} {verb}; added to ready queue", proc_name(id)),
                        &ready,
                    );
                    let at = if idle && ready.len() == 1 && now >= free_at {
                        now + half
                    } else if idle && ready.len() == 1 {
                        free_at = now;
                        now + half
                    } else {
                        match events.latest_dispatch() {
                            Some(prev) => prev.due + self.bound(workload, prev.proc) + full,
                            None => free_at + full,
                        }
                    };
                    events.insert(Event::new(id, at, EventKind::Dispatch))?;
                    free_at = at + self.bound(workload, id);
                }
                EventKind::Dispatch => {
                    let front = ready.dequeue_front();
                    debug_assert_eq!(front, Some(id));
                    idle = false;
                    let (remaining, fresh, full_burst, last) = {
                        let p = workload.get_mut(id);
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
                        journal.record(
                            now,
                            &format!(
                                "Process {} started using the CPU for {full_burst}ms burst",
                                proc_name(id)
                            ),
                            &ready,
                        );
                    } else {
                        journal.record(
                            now,
                            &format!(
                                "Process {} started using the CPU for remaining {remaining}ms of {full_burst}ms burst",
                                proc_name(id)
                            ),
                            &ready,
                        );
                    }
                    if remaining <= self.quantum {
                        let kind = if last {
                            EventKind::Terminate
                        } else {
                            EventKind::BurstComplete
                        };
                        events.insert(Event::new(id, now + remaining, kind))?;
                    } else {
                        events.insert(Event::new(id, now + self.quantum, EventKind::Preempt))?;
                    }
                    free_at = free_at.max(now + remaining.min(self.quantum));
                }
                EventKind::Preempt => {
                    let (remaining, last) = {
                        let p = workload.get_mut(id);
                        busy += now - p.run_started;
                        p.slice_remaining -= self.quantum;
                        (p.slice_remaining, p.bursts_left == 1)
                    };
                    if ready.is_empty() {
                        // nobody to switch to: keep running, fresh quantum
                        journal.record(
                            now,
                            "Time slice expired; no preemption because ready queue is empty",
                            &ready,
                        );
                        workload.get_mut(id).run_started = now;
                        if remaining <= self.quantum {
                            let kind = if last {
                                EventKind::Terminate
                            } else {
                                EventKind::BurstComplete
                            };
                            events.insert(Event::new(id, now + remaining, kind))?;
                        } else {
                            events.insert(Event::new(id, now + self.quantum, EventKind::Preempt))?;
                        }
                        free_at = free_at.max(now + remaining.min(self.quantum));
                    } else {
                        journal.record(
                            now,
                            &format!(
                                "Time slice expired; process {} preempted with {remaining}ms remaining",
                                proc_name(id)
                            ),
                            &ready,
                        );
                        {
                            let p = workload.get_mut(id);
                            p.state = ProcState::Preempted;
                            p.preemptions += 1;
                        }
                        idle = true;
                        events.insert(Event::new(id, now + half, EventKind::Requeue))?;
                    }
                }
                EventKind::Requeue => {
                    {
                        let p = workload.get_mut(id);
                        p.state = ProcState::Ready;
                        p.ready_since = now;
                    }
                    ready.enqueue(id, 0)?;
                    let base = match events.latest_dispatch() {
                        Some(prev) => prev.due + self.bound(workload, prev.proc),
                        None => free_at,
                    };
                    let at = base + full;
                    events.insert(Event::new(id, at, EventKind::Dispatch))?;
                    free_at = at + self.bound(workload, id);
                }
                EventKind::BurstComplete => {
                    idle = true;
                    let (left, resume) = {
                        let p = workload.get_mut(id);
                        busy += now - p.run_started;
                        p.slice_remaining = 0;
                        p.bursts_left -= 1;
                        p.state = ProcState::Waiting;
                        p.turnaround += now + half - p.burst_arrived_at;
                        (p.bursts_left, now + p.current_io() + half)
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
                        p.slice_remaining = 0;
                        p.bursts_left -= 1;
                        p.state = ProcState::Terminated;
                        p.turnaround += now + half - p.burst_arrived_at;
                    }
                    journal.record(now, &format!("Process {} terminated", proc_name(id)), &ready);
                    terminated += 1;
                }
            }
        }

        let end = now + half;
        journal.record_empty(end, "Simulator ended for RR");
        let report = RunReport::from_workload(self.name(), end, busy, workload);
        Ok(RunOutcome { journal, report })
    }
}
