#![doc = include_str!("../README.md")]

mod error;
mod event;
mod journal;
mod process;
mod ready;
mod stats;

pub mod scheduler;
pub mod workload;

pub use error::SimError;
pub use event::{Event, EventKind, EventQueue};
pub use journal::Journal;
pub use process::{proc_name, Ms, ProcId, ProcState, Process, ProcessClass, Workload, MAX_PROCESSES};
pub use ready::{ReadyOrder, ReadyQueue};
pub use scheduler::{Fcfs, RoundRobin, RunOutcome, Scheduler, Sjf, Srt};
pub use stats::{ClassSummary, ProcStats, RunReport};
