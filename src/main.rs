use std::{fs, path::PathBuf, process::ExitCode};

use average::Estimate;
use clap::Parser;
use rand::prelude::*;
use serde::Deserialize;
use tracing::error;
use tracing_subscriber::EnvFilter;

use mlq_sim::{ProcessDef, Settings, Sim, Snapshot, core::Ticks};

/// Step a multi-level queue scheduling run to completion and print its Gantt chart.
#[derive(Parser, Debug)]
#[command(name = "mlq_sim", version)]
struct Cli {
    /// JSON workload: {"processes": [...], "settings": {...}}
    #[arg(long, env = "MLQ_WORKLOAD")]
    workload: Option<PathBuf>,

    /// Seed for the generated workload (ignored with --workload)
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Ticks over which generated processes may arrive
    #[arg(long, default_value_t = 30)]
    horizon: Ticks,

    /// Per-tick arrival probability for generated processes
    #[arg(long, default_value_t = 0.3)]
    p_arrival: f64,

    /// Quantum for levels 1, 2 and 3
    #[arg(long, num_args = 3, value_names = ["Q1", "Q2", "Q3"])]
    quantum: Option<Vec<i64>>,

    #[arg(long)]
    aging_interval: Option<i64>,

    #[arg(long)]
    starvation_interval: Option<i64>,

    /// Print every scheduling event as it happens
    #[arg(long)]
    events: bool,

    /// Print the final snapshot as JSON instead of a summary
    #[arg(long)]
    json: bool,
}

#[derive(Deserialize)]
struct Workload {
    processes: Vec<ProcessDef>,
    #[serde(default)]
    settings: Settings,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            error!("{msg}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let (processes, mut settings) = match &cli.workload {
        Some(path) => {
            let text = fs::read_to_string(path)
                .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
            let workload: Workload = serde_json::from_str(&text)
                .map_err(|e| format!("failed to parse {}: {e}", path.display()))?;
            (workload.processes, workload.settings)
        }
        None => (
            bernoulli_processes(cli.horizon, cli.p_arrival, 0.4, 2, 8, cli.seed),
            Settings::default(),
        ),
    };

    if let Some(quantum) = &cli.quantum {
        for (slot, q) in settings.quantum.iter_mut().zip(quantum) {
            *slot = *q;
        }
    }
    if let Some(aging) = cli.aging_interval {
        settings.aging_interval = aging;
    }
    if let Some(starvation) = cli.starvation_interval {
        settings.starvation_interval = starvation;
    }

    let mut sim = Sim::with_processes(&processes, settings).map_err(|e| e.to_string())?;

    while !sim.is_complete() {
        let now = sim.now() + 1;
        let events = sim.tick().map_err(|e| e.to_string())?;
        if cli.events {
            for event in events {
                let name = event
                    .process()
                    .and_then(|id| sim.core().map(|core| core.ctx.process(id).name.as_str()))
                    .unwrap_or("-");
                println!("t={now} {name:>8} {event:?}");
            }
        }
    }

    let snapshot = sim.snapshot().map_err(|e| e.to_string())?;
    if cli.json {
        let json = serde_json::to_string_pretty(&snapshot).map_err(|e| e.to_string())?;
        println!("{json}");
    } else {
        print_summary(&snapshot);
    }
    Ok(())
}

fn print_summary(snapshot: &Snapshot) {
    println!("Gantt chart ({} ticks):", snapshot.current_time);
    for (identity, start, end) in snapshot.gantt() {
        println!("  [{start:>4}, {end:>4})  {identity}");
    }

    let metrics: Vec<_> = snapshot.processes.iter().filter_map(|p| p.metrics).collect();
    let turnaround = avg(metrics.iter().map(|m| m.turnaround as f64));
    let waiting = avg(metrics.iter().map(|m| m.total_wait as f64));
    let response = avg(metrics.iter().map(|m| m.response as f64));

    println!("Processes: {}", snapshot.processes.len());
    println!("Average turnaround time: {turnaround:.2} ticks");
    println!("Average waiting time: {waiting:.2} ticks");
    println!("Average response time: {response:.2} ticks");
}

fn bernoulli_processes(
    ticks: Ticks,
    p_arrival: f64,
    p_short: f64,
    short_ticks: i64,
    long_ticks: i64,
    seed: u64,
) -> Vec<ProcessDef> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut processes = Vec::new();

    for t in 0..ticks {
        if rng.random::<f64>() < p_arrival {
            let burst = if rng.random::<f64>() < p_short {
                short_ticks
            } else {
                long_ticks
            };

            processes.push(ProcessDef::new(
                format!("P{}", processes.len() + 1),
                t as i64,
                burst,
                rng.random_range(1..=3),
            ));
        }
    }

    if processes.is_empty() {
        processes.push(ProcessDef::new("P1", 0, long_ticks, 3));
    }
    processes
}

fn avg(iter: impl Iterator<Item = f64>) -> f64 {
    iter.collect::<average::Mean>().estimate()
}
