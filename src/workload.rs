//! Seeded workload generation.
//!
//! Every process is drawn from a bounded exponential distribution: arrival
//! times, burst counts and burst lengths all come from one shared stream of
//! draws, so a `(seed, lambda, bound)` triple pins down the entire
//! population and every policy sees the same workload.

use rand::rngs::StdRng;
use rand::Rng;

use crate::error::SimError;
use crate::process::{Ms, Process, ProcessClass, Workload, MAX_PROCESSES};

/// Validated generation parameters.
#[derive(Debug, Clone, Copy)]
pub struct WorkloadParams {
    pub processes: usize,
    pub cpu_bound: usize,
    pub lambda: f64,
    pub bound: f64,
}

impl WorkloadParams {
    pub fn new(
        processes: usize,
        cpu_bound: usize,
        lambda: f64,
        bound: f64,
    ) -> Result<WorkloadParams, SimError> {
        if processes == 0 || processes > MAX_PROCESSES {
            return Err(SimError::InvalidConfiguration(format!(
                "process count must be between 1 and {MAX_PROCESSES}, got {processes}"
            )));
        }
        if cpu_bound > processes {
            return Err(SimError::InvalidConfiguration(format!(
                "CPU-bound count {cpu_bound} exceeds process count {processes}"
            )));
        }
        if !(lambda > 0.0) {
            return Err(SimError::InvalidConfiguration(format!(
                "lambda must be positive, got {lambda}"
            )));
        }
        if !(bound > 0.0) {
            return Err(SimError::InvalidConfiguration(format!(
                "exponential bound must be positive, got {bound}"
            )));
        }
        Ok(WorkloadParams {
            processes,
            cpu_bound,
            lambda,
            bound,
        })
    }

    /// Seed value for tau: the mean of the exponential, rounded up.
    pub fn initial_tau(&self) -> Ms {
        (1.0 / self.lambda).ceil() as Ms
    }
}

/// One draw from the exponential distribution with rate `lambda`, redrawn
/// until it falls within `bound`.
fn next_exp(rng: &mut StdRng, lambda: f64, bound: f64) -> f64 {
    loop {
        let u: f64 = rng.gen::<f64>().max(f64::EPSILON);
        let x = -u.ln() / lambda;
        if x <= bound {
            return x;
        }
    }
}

/// Generate the population. The first `cpu_bound` processes are CPU-bound:
/// their CPU bursts are quadrupled; I/O-bound processes instead have their
/// I/O bursts multiplied by eight.
pub fn generate(params: WorkloadParams, rng: &mut StdRng) -> Result<Workload, SimError> {
    let tau0 = params.initial_tau();
    let mut procs = Vec::with_capacity(params.processes);
    for i in 0..params.processes {
        let class = if i < params.cpu_bound {
            ProcessClass::CpuBound
        } else {
            ProcessClass::IoBound
        };
        let arrival = next_exp(rng, params.lambda, params.bound).floor() as Ms;
        let bursts = ((rng.gen::<f64>() * 32.0).ceil() as usize).max(1);

        let mut cpu_bursts = Vec::with_capacity(bursts);
        let mut io_bursts = Vec::with_capacity(bursts - 1);
        for b in 0..bursts {
            let mut cpu = next_exp(rng, params.lambda, params.bound).ceil() as Ms;
            if class == ProcessClass::CpuBound {
                cpu *= 4;
            }
            cpu_bursts.push(cpu);
            if b + 1 < bursts {
                let mut io = next_exp(rng, params.lambda, params.bound).ceil() as Ms;
                if class == ProcessClass::IoBound {
                    io *= 8;
                }
                io_bursts.push(io);
            }
        }
        procs.push(Process::new(class, arrival, cpu_bursts, io_bursts, tau0));
    }
    Workload::new(procs)
}
