//! Crate Flight Planner - Command Line Interface
//!
//! Plans flights carrying crates between cities for a fleet of
//! capacity-limited planes.

use clap::{Parser, Subcommand};
use crate_flight_planner::benchmark::{self, BenchmarkConfig};
use crate_flight_planner::instance::Instance;
use crate_flight_planner::plan::{load_plan_json, plan};

use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "crate-flight-planner")]
#[command(author = "M2 AI2D Student")]
#[command(version = "1.0")]
#[command(about = "Plans crate-carrying flights between cities")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan flights for an instance
    Plan {
        #[arg(short, long)]
        instance: PathBuf,

        /// Random seed for the plane planner's extend phase
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Write the resulting plan to this file as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate a plan against an instance
    Validate {
        #[arg(short, long)]
        instance: PathBuf,

        #[arg(short, long)]
        plan: PathBuf,
    },

    /// Analyze an instance's demand
    Analyze {
        #[arg(short, long)]
        instance: PathBuf,
    },

    /// Run the planner across several seeds and compare flight counts
    CompareSeeds {
        #[arg(short, long)]
        instance: PathBuf,

        #[arg(short, long, default_value = "10")]
        seeds: u64,
    },

    /// Run the planner over a directory of instance files
    Benchmark {
        #[arg(short, long)]
        dir: PathBuf,

        #[arg(short, long, default_value = "results.csv")]
        output: PathBuf,

        #[arg(long, default_value = "5")]
        seeds: u64,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Plan { instance, seed, output, verbose } => {
            plan_instance(&instance, seed, output, verbose);
        }
        Commands::Validate { instance, plan } => {
            validate_plan(&instance, &plan);
        }
        Commands::Analyze { instance } => {
            analyze_instance(&instance);
        }
        Commands::CompareSeeds { instance, seeds } => {
            compare_seeds(&instance, seeds);
        }
        Commands::Benchmark { dir, output, seeds } => {
            run_benchmark(&dir, &output, seeds);
        }
    }
}

fn load_instance_or_exit(path: &PathBuf) -> Instance {
    match Instance::from_file(path) {
        Ok(inst) => inst,
        Err(e) => {
            eprintln!("Error loading instance: {}", e);
            std::process::exit(1);
        }
    }
}

fn plan_instance(path: &PathBuf, seed: u64, output: Option<PathBuf>, verbose: bool) {
    println!("Loading instance from {:?}...", path);
    let instance = load_instance_or_exit(path);

    if verbose {
        println!(
            "Cities: {}, capacity: {}, planes: {}",
            instance.n_cities,
            instance.capacity,
            instance.plane_start.len()
        );
        println!("Lower bound on flights: {}", instance.min_flights());
    }

    println!("Planning with seed {}...", seed);
    let start = Instant::now();
    let result = plan(&instance, seed);
    let elapsed = start.elapsed();

    println!("\n========== Results ==========");
    println!("Edges (cargo flights): {}", result.non_repositioning_count());
    println!("Total flights (incl. repositioning): {}", result.flights.len());
    println!("Lower bound: {}", instance.min_flights());
    println!("Time: {:.4}s", elapsed.as_secs_f64());

    if verbose {
        for (idx, flight) in result.flights.iter().enumerate() {
            println!(
                "  [{}] plane {}: {} -> {} cargo {:?}",
                idx, flight.plane, flight.from, flight.to, flight.cargo
            );
        }
    }

    if let Some(out_path) = output {
        let json = serde_json::to_string_pretty(&result).unwrap();
        std::fs::write(&out_path, json).expect("Failed to write output");
        println!("\nPlan saved to {:?}", out_path);
    }
}

fn validate_plan(instance_path: &PathBuf, plan_path: &PathBuf) {
    let instance = load_instance_or_exit(instance_path);
    let plan = match load_plan_json(plan_path) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error loading plan: {}", e);
            std::process::exit(1);
        }
    };

    match plan.validate(&instance) {
        Ok(()) => {
            println!("Plan is valid.");
        }
        Err(e) => {
            eprintln!("Plan is invalid: {}", e);
            std::process::exit(1);
        }
    }
}

fn analyze_instance(path: &PathBuf) {
    let instance = load_instance_or_exit(path);

    println!("========== Instance Analysis ==========\n");
    println!("Cities: {}", instance.n_cities);
    println!("Capacity: {}", instance.capacity);
    println!("Planes: {}", instance.plane_start.len());

    let total_demand: u64 = instance.crates.iter().flatten().sum();
    println!("Total crates demanded: {}", total_demand);
    println!("Lower bound on flights: {}", instance.min_flights());

    let mut busiest_origin = (0, 0u64);
    let mut busiest_destination = (0, 0u64);
    for i in 0..instance.n_cities {
        let out: u64 = instance.crates[i].iter().sum();
        if out > busiest_origin.1 {
            busiest_origin = (i, out);
        }
        let inbound: u64 = (0..instance.n_cities).map(|k| instance.crates[k][i]).sum();
        if inbound > busiest_destination.1 {
            busiest_destination = (i, inbound);
        }
    }
    println!(
        "Busiest origin: city {} ({} crates)",
        busiest_origin.0, busiest_origin.1
    );
    println!(
        "Busiest destination: city {} ({} crates)",
        busiest_destination.0, busiest_destination.1
    );
}

fn compare_seeds(path: &PathBuf, seeds: u64) {
    let instance = load_instance_or_exit(path);
    println!("Comparing {} seeds on {:?}...\n", seeds, path);

    let config = BenchmarkConfig {
        seeds_per_instance: seeds,
        parallel: true,
    };
    let results = benchmark::run_instance(&instance, "instance", &config);

    let counts: Vec<usize> = results.iter().map(|r| r.flight_count).collect();
    let best = counts.iter().min().copied().unwrap_or(0);
    let worst = counts.iter().max().copied().unwrap_or(0);
    let avg = counts.iter().sum::<usize>() as f64 / counts.len().max(1) as f64;

    println!("Best flight count: {}", best);
    println!("Worst flight count: {}", worst);
    println!("Average flight count: {:.2}", avg);
    println!("Lower bound: {}", instance.min_flights());
}

fn run_benchmark(dir: &PathBuf, output: &PathBuf, seeds: u64) {
    println!("Loading instances from {:?}...", dir);

    let config = BenchmarkConfig {
        seeds_per_instance: seeds,
        parallel: true,
    };
    let results = benchmark::run_directory(dir, &config);

    if results.is_empty() {
        eprintln!("No instances found!");
        return;
    }

    println!("\n{}", benchmark::summarize(&results));

    benchmark::export_csv(&results, output).expect("Failed to export results");
    println!("Results exported to {:?}", output);
}
