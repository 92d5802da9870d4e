//! Benchmarking of the path optimizer on generated waypoint sets.
//!
//! Instances are scattered uniformly in a box around a center point with a
//! seeded generator, so every run is reproducible. Each instance is solved
//! once per improvement policy and compared to the unoptimized input order.

use crate::matrix::DistanceMatrix;
use crate::optimizer::{ImprovementPolicy, StopReason, TwoOptOptimizer};
use crate::waypoint::Waypoint;

use indicatif::{ProgressBar, ProgressStyle};
use ordered_float::OrderedFloat;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use std::time::Instant;

/// Result of one optimizer run on one generated instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub policy: ImprovementPolicy,
    pub size: usize,
    pub run: usize,
    pub seed: u64,
    /// Length of the generated order
    pub identity_km: f64,
    pub optimized_km: f64,
    pub improvement_pct: f64,
    pub iterations: usize,
    pub improvements: usize,
    pub stop: StopReason,
    /// Seconds
    pub time: f64,
}

/// Aggregated figures for one policy and instance size
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkStatistics {
    pub policy: ImprovementPolicy,
    pub size: usize,
    pub runs: usize,
    pub avg_improvement_pct: f64,
    pub std_improvement_pct: f64,
    pub avg_iterations: f64,
    /// Runs stopped by the iteration cap
    pub capped_runs: usize,
    pub avg_time: f64,
    pub max_time: f64,
}

/// Benchmark configuration
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Waypoint counts to test
    pub sizes: Vec<usize>,
    /// Instances per size
    pub num_runs: usize,
    /// Base seed; run `r` of size `n` uses a seed derived from both
    pub seed: u64,
    /// Center of the generated instances (lat, lng)
    pub center: (f64, f64),
    /// Half-width of the box, degrees
    pub spread: f64,
    pub max_iterations: usize,
    /// Run in parallel
    pub parallel: bool,
    /// Show a progress bar
    pub progress: bool,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        BenchmarkConfig {
            sizes: vec![5, 10, 20, 40],
            num_runs: 5,
            seed: 42,
            center: (37.5665, 126.9780),
            spread: 0.1,
            max_iterations: crate::optimizer::DEFAULT_MAX_ITERATIONS,
            parallel: true,
            progress: true,
        }
    }
}

/// Generate `n` waypoints uniformly in the box `center ± spread`
pub fn random_waypoints(n: usize, seed: u64, center: (f64, f64), spread: f64) -> Vec<Waypoint> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|k| {
            let lat = (center.0 + rng.gen_range(-spread..=spread)).clamp(-90.0, 90.0);
            let lng = (center.1 + rng.gen_range(-spread..=spread)).clamp(-180.0, 180.0);
            Waypoint::new(format!("p{}", k), format!("Point {}", k), lat, lng)
        })
        .collect()
}

/// Benchmarking engine
pub struct Benchmark {
    config: BenchmarkConfig,
    results: Vec<BenchmarkResult>,
}

impl Benchmark {
    pub fn new(config: BenchmarkConfig) -> Self {
        Benchmark { config, results: Vec::new() }
    }

    fn instance_seed(&self, size: usize, run: usize) -> u64 {
        self.config
            .seed
            .wrapping_mul(1_000_003)
            .wrapping_add((size as u64) << 20)
            .wrapping_add(run as u64)
    }

    /// Run every (size, run, policy) combination
    pub fn run(&mut self) {
        let policies = [ImprovementPolicy::FirstImprovement, ImprovementPolicy::BestImprovement];

        let mut jobs = Vec::new();
        for &size in &self.config.sizes {
            for run in 0..self.config.num_runs {
                for &policy in &policies {
                    jobs.push((size, run, self.instance_seed(size, run), policy));
                }
            }
        }

        log::info!(
            "benchmarking {} jobs over sizes {:?}",
            jobs.len(),
            self.config.sizes
        );

        let progress = if self.config.progress {
            let pb = ProgressBar::new(jobs.len() as u64);
            pb.set_style(
                ProgressStyle::with_template("{bar:40} {pos}/{len} [{elapsed_precise}] {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            pb
        } else {
            ProgressBar::hidden()
        };

        let config = &self.config;
        let run_job = |&(size, run, seed, policy): &(usize, usize, u64, ImprovementPolicy)| {
            let result = run_single(config, size, run, seed, policy);
            progress.inc(1);
            result
        };

        let results: Vec<BenchmarkResult> = if config.parallel {
            jobs.par_iter().map(run_job).collect()
        } else {
            jobs.iter().map(run_job).collect()
        };

        progress.finish_and_clear();
        self.results.extend(results);
    }

    /// Compute statistics per policy and size
    pub fn compute_statistics(&self) -> Vec<BenchmarkStatistics> {
        let mut groups: BTreeMap<(usize, u8), Vec<&BenchmarkResult>> = BTreeMap::new();
        for result in &self.results {
            let key = match result.policy {
                ImprovementPolicy::FirstImprovement => 0,
                ImprovementPolicy::BestImprovement => 1,
            };
            groups.entry((result.size, key)).or_default().push(result);
        }

        groups
            .into_values()
            .map(|results| {
                let improvements: Vec<f64> = results.iter().map(|r| r.improvement_pct).collect();
                let iterations: Vec<f64> = results.iter().map(|r| r.iterations as f64).collect();
                let times: Vec<f64> = results.iter().map(|r| r.time).collect();

                let std_improvement_pct = if improvements.len() > 1 {
                    improvements.iter().std_dev()
                } else {
                    0.0
                };
                let max_time = times.iter().cloned().fold(0.0, f64::max);

                BenchmarkStatistics {
                    policy: results[0].policy,
                    size: results[0].size,
                    runs: results.len(),
                    avg_improvement_pct: improvements.iter().mean(),
                    std_improvement_pct,
                    avg_iterations: iterations.iter().mean(),
                    capped_runs: results.iter().filter(|r| r.stop == StopReason::IterationLimit).count(),
                    avg_time: times.iter().mean(),
                    max_time,
                }
            })
            .collect()
    }

    /// Export results to CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> crate::Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for result in &self.results {
            writer.serialize(result)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Export statistics to CSV
    pub fn export_statistics_csv<P: AsRef<Path>>(&self, path: P) -> crate::Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for stat in self.compute_statistics() {
            writer.serialize(stat)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Generate summary report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("      2-Opt Route Benchmark Report\n");
        report.push_str("========================================\n");
        report.push_str(&format!(
            "Generated: {}\n\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        ));

        report.push_str("-".repeat(84).as_str());
        report.push('\n');
        report.push_str(&format!(
            "{:<20} {:>6} {:>6} {:>12} {:>10} {:>10} {:>8} {:>8}\n",
            "Policy", "Size", "Runs", "Avg Impr%", "Std%", "Avg Scans", "Capped", "Avg s"
        ));
        report.push_str("-".repeat(84).as_str());
        report.push('\n');

        for stat in self.compute_statistics() {
            report.push_str(&format!(
                "{:<20} {:>6} {:>6} {:>12.2} {:>10.2} {:>10.1} {:>8} {:>8.4}\n",
                format!("{:?}", stat.policy),
                stat.size,
                stat.runs,
                stat.avg_improvement_pct,
                stat.std_improvement_pct,
                stat.avg_iterations,
                stat.capped_runs,
                stat.avg_time
            ));
        }

        report.push_str("-".repeat(84).as_str());
        report.push('\n');

        let best = self.results.iter().max_by_key(|r| OrderedFloat(r.improvement_pct));
        let worst = self.results.iter().min_by_key(|r| OrderedFloat(r.improvement_pct));
        if let (Some(best), Some(worst)) = (best, worst) {
            report.push_str(&format!(
                "\nLargest improvement: {:.2}% ({:?}, n={}, run {})\n",
                best.improvement_pct, best.policy, best.size, best.run
            ));
            report.push_str(&format!(
                "Smallest improvement: {:.2}% ({:?}, n={}, run {})\n",
                worst.improvement_pct, worst.policy, worst.size, worst.run
            ));
        }

        report
    }

    /// Get all results
    pub fn results(&self) -> &[BenchmarkResult] {
        &self.results
    }
}

fn run_single(
    config: &BenchmarkConfig,
    size: usize,
    run: usize,
    seed: u64,
    policy: ImprovementPolicy,
) -> BenchmarkResult {
    let waypoints = random_waypoints(size, seed, config.center, config.spread);
    let matrix = DistanceMatrix::build(&waypoints);
    let optimizer = TwoOptOptimizer { policy, max_iterations: config.max_iterations };

    let start = Instant::now();
    let result = optimizer.optimize_identity(&matrix);
    let time = start.elapsed().as_secs_f64();

    BenchmarkResult {
        policy,
        size,
        run,
        seed,
        identity_km: result.initial_length,
        optimized_km: result.length,
        improvement_pct: result.improvement_percent(),
        iterations: result.iterations,
        improvements: result.improvements,
        stop: result.stop,
        time,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> BenchmarkConfig {
        BenchmarkConfig {
            sizes: vec![4, 8],
            num_runs: 3,
            progress: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_benchmark_config() {
        let config = BenchmarkConfig::default();
        assert_eq!(config.num_runs, 5);
        assert_eq!(config.max_iterations, 100);
    }

    #[test]
    fn test_random_waypoints_reproducible() {
        let a = random_waypoints(10, 7, (37.5, 127.0), 0.1);
        let b = random_waypoints(10, 7, (37.5, 127.0), 0.1);
        assert_eq!(a, b);
        assert!(a.iter().all(|w| w.has_valid_coordinates()));
        assert!(a.iter().all(|w| (w.lat - 37.5).abs() <= 0.1 + 1e-12));
    }

    #[test]
    fn test_run_and_statistics() {
        let mut benchmark = Benchmark::new(small_config());
        benchmark.run();

        assert_eq!(benchmark.results().len(), 2 * 3 * 2);
        assert!(benchmark.results().iter().all(|r| r.optimized_km <= r.identity_km));

        let stats = benchmark.compute_statistics();
        assert_eq!(stats.len(), 4);
        assert!(stats.iter().all(|s| s.runs == 3));
        assert!(stats.iter().all(|s| s.avg_improvement_pct >= 0.0));

        let report = benchmark.generate_report();
        assert!(report.contains("FirstImprovement"));
        assert!(report.contains("BestImprovement"));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut parallel = Benchmark::new(small_config());
        parallel.run();

        let mut sequential = Benchmark::new(BenchmarkConfig { parallel: false, ..small_config() });
        sequential.run();

        for (a, b) in parallel.results().iter().zip(sequential.results()) {
            assert_eq!(a.seed, b.seed);
            assert_eq!(a.optimized_km, b.optimized_km);
            assert_eq!(a.iterations, b.iterations);
        }
    }

    #[test]
    fn test_csv_export() {
        let mut benchmark = Benchmark::new(BenchmarkConfig { sizes: vec![5], num_runs: 1, progress: false, ..Default::default() });
        benchmark.run();

        let dir = std::env::temp_dir().join(format!("waypoint-router-bench-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        benchmark.export_to_csv(dir.join("results.csv")).unwrap();
        benchmark.export_statistics_csv(dir.join("statistics.csv")).unwrap();

        let results = std::fs::read_to_string(dir.join("results.csv")).unwrap();
        assert!(results.starts_with("policy,size,run,seed"));
        assert_eq!(results.lines().count(), 3);
    }
}
