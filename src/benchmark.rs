//! Benchmarking tools for the flight planner.
//!
//! Runs the planner over a directory of instance files, across one or more
//! seeds, and reports how close each plan's flight count comes to the
//! instance's trivial lower bound.

use crate::instance::Instance;
use crate::plan::plan;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// Result of planning a single instance with a single seed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanningResult {
    pub instance: String,
    pub n_cities: usize,
    pub capacity: u64,
    pub seed: u64,
    pub edge_count: usize,
    pub flight_count: usize,
    pub min_flights: u64,
    pub ratio_to_lower_bound: f64,
    pub elapsed_secs: f64,
}

#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Number of seeds to run per instance.
    pub seeds_per_instance: u64,
    /// Run instances in parallel across a thread pool.
    pub parallel: bool,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        BenchmarkConfig {
            seeds_per_instance: 5,
            parallel: true,
        }
    }
}

/// Plans `instance` with `seed` and reports flight-count statistics.
pub fn run_one(instance: &Instance, name: &str, seed: u64) -> PlanningResult {
    let start = std::time::Instant::now();
    let result = plan(instance, seed);
    let elapsed_secs = start.elapsed().as_secs_f64();

    let min_flights = instance.min_flights();
    let edge_count = result.non_repositioning_count();
    let ratio_to_lower_bound = if min_flights == 0 {
        1.0
    } else {
        edge_count as f64 / min_flights as f64
    };

    PlanningResult {
        instance: name.to_string(),
        n_cities: instance.n_cities,
        capacity: instance.capacity,
        seed,
        edge_count,
        flight_count: result.flights.len(),
        min_flights,
        ratio_to_lower_bound,
        elapsed_secs,
    }
}

/// Plans `instance` with every seed in `0..config.seeds_per_instance`.
pub fn run_instance(instance: &Instance, name: &str, config: &BenchmarkConfig) -> Vec<PlanningResult> {
    let seeds: Vec<u64> = (0..config.seeds_per_instance).collect();
    if config.parallel {
        seeds
            .into_par_iter()
            .map(|seed| run_one(instance, name, seed))
            .collect()
    } else {
        seeds.into_iter().map(|seed| run_one(instance, name, seed)).collect()
    }
}

/// Loads every `*.txt` instance file from `dir` and plans each with every
/// configured seed.
pub fn run_directory<P: AsRef<Path>>(dir: P, config: &BenchmarkConfig) -> Vec<PlanningResult> {
    let mut results = Vec::new();
    let Ok(entries) = std::fs::read_dir(dir) else {
        log::error!("benchmark: could not read instance directory");
        return results;
    };

    let mut paths: Vec<_> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().map(|e| e == "txt").unwrap_or(false))
        .collect();
    paths.sort();

    for path in paths {
        match Instance::from_file(&path) {
            Ok(instance) => {
                let name = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_default();
                log::info!("benchmark: planning {}", name);
                results.extend(run_instance(&instance, &name, config));
            }
            Err(e) => {
                log::error!("benchmark: skipping {:?}: {}", path, e);
            }
        }
    }

    results
}

/// Writes planning results to a CSV file, one row per (instance, seed).
pub fn export_csv<P: AsRef<Path>>(results: &[PlanningResult], path: P) -> std::io::Result<()> {
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    for result in results {
        writer.serialize(result)?;
    }
    writer.flush()
}

/// Builds a short human-readable summary: best/worst/average ratio to the
/// lower bound, per instance.
pub fn summarize(results: &[PlanningResult]) -> String {
    use std::collections::HashMap;
    let mut by_instance: HashMap<&str, Vec<&PlanningResult>> = HashMap::new();
    for r in results {
        by_instance.entry(r.instance.as_str()).or_default().push(r);
    }

    let mut names: Vec<&&str> = by_instance.keys().collect();
    names.sort();

    let mut report = String::new();
    report.push_str(&format!(
        "{:<20} {:>8} {:>8} {:>8} {:>8}\n",
        "instance", "best", "avg", "worst", "runs"
    ));
    for name in names {
        let rows = &by_instance[*name];
        let ratios: Vec<f64> = rows.iter().map(|r| r.ratio_to_lower_bound).collect();
        let best = ratios.iter().cloned().fold(f64::INFINITY, f64::min);
        let worst = ratios.iter().cloned().fold(0.0, f64::max);
        let avg = ratios.iter().sum::<f64>() / ratios.len() as f64;
        report.push_str(&format!(
            "{:<20} {:>8.2} {:>8.2} {:>8.2} {:>8}\n",
            name,
            best,
            avg,
            worst,
            rows.len()
        ));
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_instance() -> Instance {
        Instance {
            capacity: 30,
            n_cities: 2,
            crates: vec![vec![0, 15], vec![0, 0]],
            plane_start: vec![0],
        }
    }

    #[test]
    fn run_one_reports_ratio_to_lower_bound() {
        let inst = small_instance();
        let result = run_one(&inst, "toy", 0);
        assert_eq!(result.min_flights, 1);
        assert_eq!(result.flight_count, 1);
        assert!((result.ratio_to_lower_bound - 1.0).abs() < 1e-9);
    }

    #[test]
    fn run_instance_covers_every_seed() {
        let inst = small_instance();
        let config = BenchmarkConfig {
            seeds_per_instance: 3,
            parallel: false,
        };
        let results = run_instance(&inst, "toy", &config);
        assert_eq!(results.len(), 3);
        let mut seeds: Vec<u64> = results.iter().map(|r| r.seed).collect();
        seeds.sort();
        assert_eq!(seeds, vec![0, 1, 2]);
    }

    #[test]
    fn default_config_runs_five_seeds() {
        assert_eq!(BenchmarkConfig::default().seeds_per_instance, 5);
    }
}
