//! Waypoint Router - Command Line Interface
//!
//! Orders waypoint files into short routes and benchmarks the optimizer.

use clap::{Parser, Subcommand, ValueEnum};
use waypoint_router::benchmark::{Benchmark, BenchmarkConfig};
use waypoint_router::config::{InvalidCoordinatePolicy, PlannerConfig};
use waypoint_router::matrix::DistanceMatrix;
use waypoint_router::optimizer::ImprovementPolicy;
use waypoint_router::services::{CatalogSearch, MapRenderer, PlaceSearch, SearchKind};
use waypoint_router::visualization::SvgRenderer;
use waypoint_router::waypoint::{load_waypoints, WaypointStatistics};
use waypoint_router::{RoutePlanner, RouteRequest};

use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "waypoint-router")]
#[command(version = "1.0")]
#[command(about = "Orders geographic waypoints into short routes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute a route over a waypoint file
    Solve {
        /// Waypoint file (.json or .csv)
        #[arg(short, long)]
        input: PathBuf,

        /// Id of the pinned start waypoint
        #[arg(long, requires = "end")]
        start: Option<String>,

        /// Id of the pinned end waypoint
        #[arg(long, requires = "start")]
        end: Option<String>,

        /// JSON planner configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Cap on 2-opt scans
        #[arg(long)]
        max_iterations: Option<usize>,

        /// Move acceptance policy
        #[arg(long, value_enum)]
        policy: Option<Policy>,

        /// Drop waypoints with invalid coordinates instead of failing
        #[arg(long)]
        filter_invalid: bool,

        /// Write the plan as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write an SVG drawing of the route
        #[arg(long)]
        svg: Option<PathBuf>,

        /// Also convert the drawing to PNG
        #[arg(long, requires = "svg")]
        png: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print or export the distance matrix of a waypoint file
    Matrix {
        #[arg(short, long)]
        input: PathBuf,

        /// Output CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Search a waypoint catalog
    Search {
        /// Catalog file (.json or .csv)
        #[arg(short, long)]
        catalog: PathBuf,

        #[arg(short, long)]
        query: String,

        /// Match addresses only
        #[arg(long)]
        address: bool,
    },

    /// Benchmark the optimizer on generated waypoint sets
    Benchmark {
        /// Waypoint counts, comma separated
        #[arg(long, value_delimiter = ',', default_value = "5,10,20,40")]
        sizes: Vec<usize>,

        /// Instances per size
        #[arg(short, long, default_value = "5")]
        runs: usize,

        /// Random seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum Policy {
    /// Apply the first improving move and rescan
    First,
    /// Apply the best move of each scan
    Best,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Solve {
            input,
            start,
            end,
            config,
            max_iterations,
            policy,
            filter_invalid,
            output,
            svg,
            png,
            verbose,
        } => {
            let config = load_config(config.as_deref(), max_iterations, policy, filter_invalid);
            solve(&input, start.zip(end), config, output, svg, png, verbose);
        }

        Commands::Matrix { input, output } => {
            print_matrix(&input, output);
        }

        Commands::Search { catalog, query, address } => {
            search(&catalog, &query, address);
        }

        Commands::Benchmark { sizes, runs, seed, output } => {
            run_benchmark(sizes, runs, seed, &output);
        }
    }
}

fn fail(context: &str, error: impl std::fmt::Display) -> ! {
    eprintln!("{}: {}", context, error);
    std::process::exit(1);
}

fn load_config(
    path: Option<&Path>,
    max_iterations: Option<usize>,
    policy: Option<Policy>,
    filter_invalid: bool,
) -> PlannerConfig {
    let mut config = match path {
        Some(path) => PlannerConfig::from_file(path).unwrap_or_else(|e| fail("Error loading config", e)),
        None => PlannerConfig::default(),
    };

    if let Some(max_iterations) = max_iterations {
        config.max_iterations = max_iterations;
    }
    if let Some(policy) = policy {
        config.policy = match policy {
            Policy::First => ImprovementPolicy::FirstImprovement,
            Policy::Best => ImprovementPolicy::BestImprovement,
        };
    }
    if filter_invalid {
        config.invalid_coordinates = InvalidCoordinatePolicy::Filter;
    }
    config
}

fn solve(
    input: &Path,
    endpoints: Option<(String, String)>,
    config: PlannerConfig,
    output: Option<PathBuf>,
    svg: Option<PathBuf>,
    png: bool,
    verbose: bool,
) {
    println!("Loading waypoints from {:?}...", input);
    let waypoints = load_waypoints(input).unwrap_or_else(|e| fail("Error loading waypoints", e));

    if verbose {
        println!("{}", WaypointStatistics::compute(&waypoints));
        println!("Config: {:?}", config);
    }

    let request = match endpoints {
        Some((start, end)) => RouteRequest::fixed(waypoints, start, end),
        None => RouteRequest::free(waypoints),
    };

    let planner = RoutePlanner::new(config);
    let plan = planner.plan(&request).unwrap_or_else(|e| fail("Error computing route", e));

    println!("\n========== Route ==========");
    println!("{}", plan);

    if verbose {
        println!("\nOrder: {:?}", plan.optimization.order);
        if let Some(leg) = plan.summary().longest_leg() {
            println!("Longest leg: {} -> {} ({:.3} km)", leg.from, leg.to, leg.distance_km);
        }
    }

    if let Some(out_path) = output {
        let json = serde_json::to_string_pretty(&plan).unwrap_or_else(|e| fail("Error serializing plan", e));
        std::fs::write(&out_path, json).unwrap_or_else(|e| fail("Error writing plan", e));
        println!("\nPlan saved to {:?}", out_path);
    }

    if let Some(svg_path) = svg {
        let mut renderer = SvgRenderer::to_file(&svg_path).with_png(png);
        match renderer.render(&plan) {
            Ok(()) => println!("Drawing saved to {:?}", svg_path),
            Err(e) => eprintln!("Drawing failed: {}", e),
        }
    }
}

fn print_matrix(input: &Path, output: Option<PathBuf>) {
    let waypoints = load_waypoints(input).unwrap_or_else(|e| fail("Error loading waypoints", e));
    if let Some(w) = waypoints.iter().find(|w| !w.has_valid_coordinates()) {
        fail("Error building matrix", format!("waypoint {} has invalid coordinates", w.id));
    }

    let matrix = DistanceMatrix::build(&waypoints);

    match output {
        Some(path) => {
            matrix
                .export_csv(&waypoints, &path)
                .unwrap_or_else(|e| fail("Error exporting matrix", e));
            println!("Matrix ({}x{}) exported to {:?}", matrix.size(), matrix.size(), path);
        }
        None => {
            print!("{:>12}", "");
            for w in &waypoints {
                print!(" {:>10}", w.id);
            }
            println!();
            for (i, w) in waypoints.iter().enumerate() {
                print!("{:>12}", w.id);
                for j in 0..matrix.size() {
                    print!(" {:>10.3}", matrix.get(i, j));
                }
                println!();
            }
        }
    }
}

fn search(catalog: &Path, query: &str, address: bool) {
    let kind = if address { SearchKind::Address } else { SearchKind::Keyword };
    let search = CatalogSearch::from_file(catalog)
        .unwrap_or_else(|e| fail("Error loading catalog", e))
        .with_kind(kind);

    let results = search.search(query).unwrap_or_else(|e| fail("Search failed", e));
    println!("{} result(s) for '{}' ({})", results.len(), query, search.name());
    for w in &results {
        match w.display_address() {
            Some(addr) => println!("  [{}] {} - {} ({:.6}, {:.6})", w.id, w.name, addr, w.lat, w.lng),
            None => println!("  [{}] {} ({:.6}, {:.6})", w.id, w.name, w.lat, w.lng),
        }
    }
}

fn run_benchmark(sizes: Vec<usize>, runs: usize, seed: u64, output: &Path) {
    std::fs::create_dir_all(output).unwrap_or_else(|e| fail("Error creating output directory", e));

    let config = BenchmarkConfig {
        sizes,
        num_runs: runs,
        seed,
        ..Default::default()
    };

    println!("Benchmarking sizes {:?} with {} run(s) each...", config.sizes, config.num_runs);
    let mut benchmark = Benchmark::new(config);
    benchmark.run();

    let results_path = output.join("results.csv");
    benchmark
        .export_to_csv(&results_path)
        .unwrap_or_else(|e| fail("Error exporting results", e));
    println!("\nResults exported to {:?}", results_path);

    let stats_path = output.join("statistics.csv");
    benchmark
        .export_statistics_csv(&stats_path)
        .unwrap_or_else(|e| fail("Error exporting statistics", e));
    println!("Statistics exported to {:?}", stats_path);

    let report = benchmark.generate_report();
    println!("\n{}", report);

    let report_path = output.join("report.txt");
    std::fs::write(&report_path, &report).unwrap_or_else(|e| fail("Error writing report", e));
    println!("Report saved to {:?}", report_path);
}
