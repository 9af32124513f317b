use crate::error::SimError;
use crate::event::{Event, EventKind, EventQueue};
use crate::journal::Journal;
use crate::process::{proc_name, Ms, ProcState, Workload};
use crate::ready::{ReadyOrder, ReadyQueue};
use crate::stats::RunReport;

use super::{bursts_to_go, seed_arrivals, RunOutcome, Scheduler, SwitchCost};

/// First-come-first-served. Non-preemptive: once a burst starts it runs to
/// completion, and the ready queue is served strictly in insertion order.
///
/// Dispatches are projected eagerly: whenever a process becomes ready, the
/// time its burst will start is already determined by the processes ahead
/// of it, so the dispatch event is scheduled immediately and a watermark
/// (`free_at`) tracks when the CPU next comes free.
pub struct Fcfs {
    switch: SwitchCost,
}

impl Fcfs {
    pub fn new(t_cs: Ms) -> Result<Fcfs, SimError> {
        Ok(Fcfs {
            switch: SwitchCost::new(t_cs)?,
        })
    }
}

impl Scheduler for Fcfs {
    fn name(&self) -> &'static str {
        "FCFS"
    }

    fn run(&self, workload: &mut Workload) -> Result<RunOutcome, SimError> {
        workload.reset();
        let n = workload.len();
        let half = self.switch.half();
        let full = self.switch.full();

        let mut events = EventQueue::with_population(n);
        let mut ready = ReadyQueue::new(ReadyOrder::Fifo, n);
        let mut journal = Journal::new();
        // Watermark: earliest time the CPU (and its projected dispatch
        // chain) has no more committed work.
        let mut free_at: Ms = 0;
        let mut idle = true;
        let mut busy: Ms = 0;
        let mut terminated = 0usize;
        let mut now: Ms = 0;

        journal.record_empty(0, "Simulator started for FCFS");
        seed_arrivals(workload, &mut events)?;

        while terminated < n {
            let event = events.pop().ok_or(SimError::EmptyQueue {
                queue: "event queue",
            })?;
            now = event.due;
            let id = event.proc;
            match event.kind {
                EventKind::Arrival | EventKind::IoComplete => {
                    let burst = {
                        let p = workload.get_mut(id);
                        p.state = ProcState::Ready;
                        p.ready_since = now;
                        p.burst_arrived_at = now;
                        p.current_burst()
                    };
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
                        // CPU idle but still inside a projected switch
                        free_at = now;
                        now + half
                    } else {
                        match events.latest_dispatch() {
                            Some(prev) => prev.due + workload.get(prev.proc).current_burst() + full,
                            None => free_at + full,
                        }
                    };
                    events.insert(Event::new(id, at, EventKind::Dispatch))?;
                    free_at = at + burst;
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
                    let (left, resume) = {
                        let p = workload.get_mut(id);
                        busy += now - p.run_started;
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
                        p.bursts_left -= 1;
                        p.state = ProcState::Terminated;
                        p.turnaround += now + half - p.burst_arrived_at;
                    }
                    journal.record(now, &format!("Process {} terminated", proc_name(id)), &ready);
                    terminated += 1;
                }
                EventKind::Preempt | EventKind::Requeue => {
                    unreachable!("FCFS never schedules preemption events")
                }
            }
        }

        let end = now + half;
        journal.record_empty(end, "Simulator ended for FCFS");
        let report = RunReport::from_workload(self.name(), end, busy, workload);
        Ok(RunOutcome { journal, report })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{Process, ProcessClass};

    fn run(procs: Vec<Process>) -> RunOutcome {
        let mut workload = Workload::new(procs).unwrap();
        Fcfs::new(4).unwrap().run(&mut workload).unwrap()
    }

    #[test]
    fn test_single_burst_journal() {
        let outcome = run(vec![Process::new(
            ProcessClass::IoBound,
            0,
            vec![5],
            vec![],
            5,
        )]);
        assert_eq!(
            outcome.journal.lines(),
            &[
                "time 0ms: Simulator started for FCFS [Q empty]",
                "time 0ms: Process A0 arrived; added to ready queue [Q A0]",
                "time 2ms: Process A0 started using the CPU for 5ms burst [Q empty]",
                "time 7ms: Process A0 terminated [Q empty]",
                "time 9ms: Simulator ended for FCFS [Q empty]",
            ]
        );
        assert_eq!(outcome.report.run_length, 9);
        assert_eq!(outcome.report.cpu_busy, 5);
    }

    #[test]
    fn test_io_round_trip() {
        let outcome = run(vec![Process::new(
            ProcessClass::IoBound,
            0,
            vec![4, 2],
            vec![6],
            5,
        )]);
        assert_eq!(
            outcome.journal.lines(),
            &[
                "time 0ms: Simulator started for FCFS [Q empty]",
                "time 0ms: Process A0 arrived; added to ready queue [Q A0]",
                "time 2ms: Process A0 started using the CPU for 4ms burst [Q empty]",
                "time 6ms: Process A0 completed a CPU burst; 1 burst to go [Q empty]",
                "time 6ms: Process A0 switching out of CPU; blocking on I/O until time 14ms [Q empty]",
                "time 14ms: Process A0 completed I/O; added to ready queue [Q A0]",
                "time 16ms: Process A0 started using the CPU for 2ms burst [Q empty]",
                "time 18ms: Process A0 terminated [Q empty]",
                "time 20ms: Simulator ended for FCFS [Q empty]",
            ]
        );
        assert_eq!(outcome.report.cpu_busy, 6);
        let stats = outcome.report.per_process[0];
        assert_eq!(stats.wait, 4);
        assert_eq!(stats.switches, 2);
        // each burst's turnaround spans ready to switch-out
        assert_eq!(stats.turnaround, 14);
    }

    #[test]
    fn test_later_arrival_waits_for_the_running_burst() {
        let outcome = run(vec![
            Process::new(ProcessClass::IoBound, 0, vec![5], vec![], 5),
            Process::new(ProcessClass::IoBound, 1, vec![3], vec![], 5),
        ]);
        assert_eq!(
            outcome.journal.lines(),
            &[
                "time 0ms: Simulator started for FCFS [Q empty]",
                "time 0ms: Process A0 arrived; added to ready queue [Q A0]",
                "time 1ms: Process A1 arrived; added to ready queue [Q A0 A1]",
                "time 2ms: Process A0 started using the CPU for 5ms burst [Q A1]",
                "time 7ms: Process A0 terminated [Q A1]",
                "time 11ms: Process A1 started using the CPU for 3ms burst [Q empty]",
                "time 14ms: Process A1 terminated [Q empty]",
                "time 16ms: Simulator ended for FCFS [Q empty]",
            ]
        );
        assert_eq!(outcome.report.cpu_busy, 8);
    }
}
