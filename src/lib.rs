//! Waypoint Router Library
//!
//! Orders a set of geographic waypoints into a short visiting sequence.
//!
//! # Features
//!
//! - Great-circle (haversine) distances and a symmetric distance matrix
//! - 2-opt path improvement with first- or best-improvement moves
//! - Free routes and routes with pinned start and end points
//! - A single-flight planner with cooperative cancellation
//! - JSON/CSV waypoint loading, SVG rendering and benchmarking tools
//!
//! # Example
//!
//! ```no_run
//! use waypoint_router::{RouteAssembler, RouteRequest};
//! use waypoint_router::waypoint::load_waypoints;
//!
//! // Load waypoints
//! let waypoints = load_waypoints("stops.json").unwrap();
//!
//! // Pin the first and last stop, optimize the rest
//! let request = RouteRequest::fixed(waypoints, "city-hall", "station");
//! let plan = RouteAssembler::default().assemble(&request).unwrap();
//!
//! println!("Route length: {:.2} km", plan.total_km());
//! ```

pub mod error;
pub mod geo;
pub mod waypoint;
pub mod matrix;
pub mod optimizer;
pub mod route;
pub mod config;
pub mod assembler;
pub mod itinerary;
pub mod services;
pub mod benchmark;
pub mod visualization;

pub use assembler::{RouteAssembler, RouteMode, RoutePlan, RoutePlanner, RouteRequest};
pub use config::PlannerConfig;
pub use error::{Result, RouteError};
pub use matrix::DistanceMatrix;
pub use optimizer::{ImprovementPolicy, TwoOptOptimizer};
pub use route::Route;
pub use waypoint::Waypoint;
