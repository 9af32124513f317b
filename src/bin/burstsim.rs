use std::error::Error;
use std::process::exit;

use clap::{value_parser, Arg, Command};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tabled::{Table, Tabled};

use burstsim::workload::{generate, WorkloadParams};
use burstsim::{
    proc_name, Fcfs, ProcessClass, RoundRobin, RunReport, Scheduler, Sjf, Srt, Workload,
};

fn cli() -> Command {
    Command::new("burstsim")
        .about("Simulate FCFS, SJF, SRT and RR scheduling over one generated workload")
        .arg(
            Arg::new("n")
                .required(true)
                .value_parser(value_parser!(usize))
                .help("number of processes"),
        )
        .arg(
            Arg::new("ncpu")
                .required(true)
                .value_parser(value_parser!(usize))
                .help("how many of them are CPU-bound"),
        )
        .arg(
            Arg::new("seed")
                .required(true)
                .value_parser(value_parser!(u64))
                .help("seed for the workload generator"),
        )
        .arg(
            Arg::new("lambda")
                .required(true)
                .value_parser(value_parser!(f64))
                .help("rate of the exponential distribution"),
        )
        .arg(
            Arg::new("bound")
                .required(true)
                .value_parser(value_parser!(u64))
                .help("upper bound on exponential draws, in ms"),
        )
        .arg(
            Arg::new("tcs")
                .required(true)
                .value_parser(value_parser!(u64))
                .help("context switch time in ms (positive, even)"),
        )
        .arg(
            Arg::new("alpha")
                .required(true)
                .value_parser(value_parser!(f64))
                .help("weight of the exponential tau average"),
        )
        .arg(
            Arg::new("tslice")
                .required(true)
                .value_parser(value_parser!(u64))
                .help("RR time slice in ms"),
        )
}

fn print_workload(params: &WorkloadParams, seed: u64, bound: u64, workload: &Workload) {
    println!(
        "<<< -- process set (n={}) with {} CPU-bound process(es)",
        params.processes, params.cpu_bound
    );
    println!(
        "<<< -- seed={}; lambda={:.6}; bound={}",
        seed, params.lambda, bound
    );
    for (id, p) in workload.iter() {
        let label = match p.class {
            ProcessClass::CpuBound => "CPU-bound",
            ProcessClass::IoBound => "I/O-bound",
        };
        println!(
            "{label} process {}: arrival time {}ms; {} CPU burst(s):",
            proc_name(id),
            p.arrival,
            p.total_bursts()
        );
        for (i, &cpu) in p.cpu_bursts().iter().enumerate() {
            match p.io_bursts().get(i) {
                Some(&io) => println!("==> CPU burst {cpu}ms ==> I/O burst {io}ms"),
                None => println!("==> CPU burst {cpu}ms"),
            }
        }
    }
}

#[derive(Tabled)]
struct ReportRow {
    #[tabled(rename = "policy")]
    policy: &'static str,
    #[tabled(rename = "group")]
    group: &'static str,
    #[tabled(rename = "procs")]
    processes: usize,
    #[tabled(rename = "avg wait (ms)")]
    avg_wait: String,
    #[tabled(rename = "avg turnaround (ms)")]
    avg_turnaround: String,
    #[tabled(rename = "switches")]
    switches: u64,
    #[tabled(rename = "preemptions")]
    preemptions: u64,
    #[tabled(rename = "cpu util (%)")]
    utilization: String,
}

fn report_rows(report: &RunReport) -> Vec<ReportRow> {
    let groups = [
        ("CPU-bound", report.class_summary(ProcessClass::CpuBound), false),
        ("I/O-bound", report.class_summary(ProcessClass::IoBound), false),
        ("overall", report.overall_summary(), true),
    ];
    groups
        .into_iter()
        .map(|(name, summary, with_util)| ReportRow {
            policy: report.policy,
            group: name,
            processes: summary.processes,
            avg_wait: format!("{:.3}", summary.avg_wait),
            avg_turnaround: format!("{:.3}", summary.avg_turnaround),
            switches: summary.switches,
            preemptions: summary.preemptions,
            utilization: if with_util {
                format!("{:.3}", report.cpu_utilization())
            } else {
                String::new()
            },
        })
        .collect()
}

fn run() -> Result<(), Box<dyn Error>> {
    let matches = cli().get_matches();
    let n = *matches.get_one::<usize>("n").unwrap();
    let ncpu = *matches.get_one::<usize>("ncpu").unwrap();
    let seed = *matches.get_one::<u64>("seed").unwrap();
    let lambda = *matches.get_one::<f64>("lambda").unwrap();
    let bound = *matches.get_one::<u64>("bound").unwrap();
    let tcs = *matches.get_one::<u64>("tcs").unwrap();
    let alpha = *matches.get_one::<f64>("alpha").unwrap();
    let tslice = *matches.get_one::<u64>("tslice").unwrap();

    let params = WorkloadParams::new(n, ncpu, lambda, bound as f64)?;
    let mut rng = StdRng::seed_from_u64(seed);
    let mut workload = generate(params, &mut rng)?;
    print_workload(&params, seed, bound, &workload);

    let policies: Vec<Box<dyn Scheduler>> = vec![
        Box::new(Fcfs::new(tcs)?),
        Box::new(Sjf::new(tcs, alpha)?),
        Box::new(Srt::new(tcs, alpha)?),
        Box::new(RoundRobin::new(tcs, tslice)?),
    ];

    println!();
    println!("<<< PROJECT SIMULATIONS");
    println!("<<< -- t_cs={tcs}ms; alpha={alpha:.2}; t_slice={tslice}ms");

    let mut rows = Vec::new();
    for policy in &policies {
        let outcome = policy.run(&mut workload)?;
        for line in outcome.journal.lines() {
            println!("{line}");
        }
        println!();
        rows.extend(report_rows(&outcome.report));
    }
    println!("{}", Table::new(rows));
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("ERROR: {e}");
        exit(1);
    }
}
