//! Route assembly: validation, the two optimization modes and the planner
//! state guard.
//!
//! - Free mode optimizes the whole waypoint set as an open path starting at
//!   the first waypoint.
//! - Fixed-endpoint mode pins a start and an end waypoint, optimizes only the
//!   interior waypoints and splices them in between.
//!
//! All checks run in [`RouteAssembler::validate`] before any matrix is built,
//! so invalid coordinates never reach the distance computation.

use crate::config::{InvalidCoordinatePolicy, PlannerConfig};
use crate::error::{EndpointRole, Result, RouteError};
use crate::matrix::DistanceMatrix;
use crate::optimizer::{Cancellation, NeverCancel, Optimization};
use crate::route::{Route, RouteSummary};
use crate::waypoint::Waypoint;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Instant;

/// Minimum number of waypoints for any route
pub const MIN_WAYPOINTS: usize = 2;

/// Ids of the pinned start and end waypoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    pub start: String,
    pub end: String,
}

impl Endpoints {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Endpoints { start: start.into(), end: end.into() }
    }
}

/// Input of one optimization call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRequest {
    pub waypoints: Vec<Waypoint>,
    /// `None` selects free mode
    pub endpoints: Option<Endpoints>,
}

impl RouteRequest {
    pub fn free(waypoints: Vec<Waypoint>) -> Self {
        RouteRequest { waypoints, endpoints: None }
    }

    pub fn fixed(waypoints: Vec<Waypoint>, start: impl Into<String>, end: impl Into<String>) -> Self {
        RouteRequest { waypoints, endpoints: Some(Endpoints::new(start, end)) }
    }

    pub fn mode(&self) -> RouteMode {
        if self.endpoints.is_some() {
            RouteMode::FixedEndpoints
        } else {
            RouteMode::Free
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RouteMode {
    Free,
    FixedEndpoints,
}

/// Immutable result handed to the rendering side.
///
/// The summary is computed from the route when the plan is created and the
/// two are only exposed read-only, so they cannot drift apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePlan {
    pub mode: RouteMode,
    route: Route,
    summary: RouteSummary,
    /// Optimizer statistics; in fixed-endpoint mode they cover the interior only
    pub optimization: Optimization,
    /// Ids dropped by the `Filter` coordinate policy
    pub filtered: Vec<String>,
    /// Wall time in seconds
    pub computation_time: f64,
}

impl RoutePlan {
    fn new(mode: RouteMode, route: Route, optimization: Optimization, filtered: Vec<String>) -> Self {
        let summary = route.summary();
        RoutePlan {
            mode,
            route,
            summary,
            optimization,
            filtered,
            computation_time: 0.0,
        }
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn summary(&self) -> &RouteSummary {
        &self.summary
    }

    pub fn total_km(&self) -> f64 {
        self.summary.total_km
    }

    pub fn leg_distances(&self) -> Vec<f64> {
        self.summary.leg_distances()
    }
}

impl std::fmt::Display for RoutePlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Route ({:?}, {} waypoints)", self.mode, self.route.len())?;
        writeln!(f, "{}", self.route)?;
        writeln!(
            f,
            "  Optimizer: {} scans, {} moves, stop: {:?}",
            self.optimization.iterations, self.optimization.improvements, self.optimization.stop
        )?;
        if !self.filtered.is_empty() {
            writeln!(f, "  Filtered: {:?}", self.filtered)?;
        }
        write!(f, "  Time: {:.4}s", self.computation_time)
    }
}

/// Waypoints that passed validation
struct Validated {
    waypoints: Vec<Waypoint>,
    filtered: Vec<String>,
}

/// Builds routes from requests
#[derive(Debug, Clone, Default)]
pub struct RouteAssembler {
    config: PlannerConfig,
}

impl RouteAssembler {
    pub fn new(config: PlannerConfig) -> Self {
        RouteAssembler { config }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn assemble(&self, request: &RouteRequest) -> Result<RoutePlan> {
        self.assemble_with_cancel(request, &NeverCancel)
    }

    pub fn assemble_with_cancel(&self, request: &RouteRequest, cancel: &dyn Cancellation) -> Result<RoutePlan> {
        let start = Instant::now();
        let validated = self.validate(request)?;

        let mut plan = match &request.endpoints {
            None => self.assemble_free(validated, cancel),
            Some(endpoints) => self.assemble_fixed(validated, endpoints, cancel),
        };
        plan.computation_time = start.elapsed().as_secs_f64();

        log::info!(
            "{:?} route over {} waypoints: {:.3} km ({} legs)",
            plan.mode,
            plan.route.len(),
            plan.summary.total_km,
            plan.summary.legs.len()
        );
        Ok(plan)
    }

    /// Run every check on a request without computing anything
    fn validate(&self, request: &RouteRequest) -> Result<Validated> {
        let mut seen = HashSet::new();
        for w in &request.waypoints {
            if !seen.insert(w.id.as_str()) {
                return Err(RouteError::DuplicateWaypoint(w.id.clone()));
            }
        }

        let mut waypoints = Vec::with_capacity(request.waypoints.len());
        let mut filtered = Vec::new();
        for w in &request.waypoints {
            match (w.validate(), self.config.invalid_coordinates) {
                (Ok(()), _) => waypoints.push(w.clone()),
                (Err(e), InvalidCoordinatePolicy::Reject) => return Err(e),
                (Err(e), InvalidCoordinatePolicy::Filter) => {
                    log::warn!("dropping waypoint: {}", e);
                    filtered.push(w.id.clone());
                }
            }
        }

        if waypoints.len() < MIN_WAYPOINTS {
            return Err(RouteError::InvalidWaypointCount {
                required: MIN_WAYPOINTS,
                found: waypoints.len(),
            });
        }

        if let Some(limit) = self.config.max_waypoints {
            if waypoints.len() > limit {
                return Err(RouteError::TooManyWaypoints { limit, found: waypoints.len() });
            }
        }
        if waypoints.len() > self.config.warn_waypoints {
            log::warn!(
                "{} waypoints requested; 2-opt cost grows cubically per scan, expect a slow response",
                waypoints.len()
            );
        }

        if let Some(endpoints) = &request.endpoints {
            for (role, id) in [(EndpointRole::Start, &endpoints.start), (EndpointRole::End, &endpoints.end)] {
                if id.is_empty() {
                    return Err(RouteError::MissingEndpoint(role));
                }
                if !waypoints.iter().any(|w| &w.id == id) {
                    // An endpoint removed by the filter is reported as what it is.
                    if let Some(w) = request.waypoints.iter().find(|w| &w.id == id) {
                        return Err(RouteError::InvalidCoordinate {
                            id: w.id.clone(),
                            lat: w.lat,
                            lng: w.lng,
                        });
                    }
                    return Err(RouteError::UnknownEndpoint { role, id: id.clone() });
                }
            }
            if endpoints.start == endpoints.end {
                return Err(RouteError::IdenticalEndpoints(endpoints.start.clone()));
            }
        }

        Ok(Validated { waypoints, filtered })
    }

    fn assemble_free(&self, validated: Validated, cancel: &dyn Cancellation) -> RoutePlan {
        let Validated { waypoints, filtered } = validated;

        let matrix = DistanceMatrix::build(&waypoints);
        let optimization = self
            .config
            .optimizer()
            .optimize_with_cancel(&matrix, (0..waypoints.len()).collect(), cancel);

        let route = Route::new(optimization.order.iter().map(|&i| waypoints[i].clone()).collect());
        RoutePlan::new(RouteMode::Free, route, optimization, filtered)
    }

    fn assemble_fixed(&self, validated: Validated, endpoints: &Endpoints, cancel: &dyn Cancellation) -> RoutePlan {
        let Validated { waypoints, filtered } = validated;

        let mut start = None;
        let mut end = None;
        let mut interior = Vec::with_capacity(waypoints.len().saturating_sub(2));
        for w in waypoints {
            if w.id == endpoints.start {
                start = Some(w);
            } else if w.id == endpoints.end {
                end = Some(w);
            } else {
                interior.push(w);
            }
        }

        let matrix = DistanceMatrix::build(&interior);
        let optimization = self
            .config
            .optimizer()
            .optimize_with_cancel(&matrix, (0..interior.len()).collect(), cancel);

        let mut ordered = Vec::with_capacity(interior.len() + 2);
        ordered.extend(start);
        ordered.extend(optimization.order.iter().map(|&i| interior[i].clone()));
        ordered.extend(end);

        RoutePlan::new(RouteMode::FixedEndpoints, Route::new(ordered), optimization, filtered)
    }
}

/// Whether a planner is currently running a request
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlannerState {
    Idle,
    Computing,
}

/// Entry point for "compute route now" requests.
///
/// At most one request runs at a time; a request arriving while another is
/// in flight fails with [`RouteError::Busy`] instead of being interleaved.
/// Idle, computing and cancel-requested live in one atomic, so a cancel can
/// only land on the request that is running when it arrives.
#[derive(Debug, Default)]
pub struct RoutePlanner {
    assembler: RouteAssembler,
    state: AtomicU8,
}

const IDLE: u8 = 0;
const COMPUTING: u8 = 1;
const CANCELLING: u8 = 2;

impl RoutePlanner {
    pub fn new(config: PlannerConfig) -> Self {
        RoutePlanner {
            assembler: RouteAssembler::new(config),
            state: AtomicU8::new(IDLE),
        }
    }

    pub fn state(&self) -> PlannerState {
        if self.state.load(Ordering::Acquire) == IDLE {
            PlannerState::Idle
        } else {
            PlannerState::Computing
        }
    }

    pub fn config(&self) -> &PlannerConfig {
        self.assembler.config()
    }

    /// Validate and optimize a request
    pub fn plan(&self, request: &RouteRequest) -> Result<RoutePlan> {
        let guard = self.begin()?;
        self.assembler.assemble_with_cancel(request, &guard)
    }

    /// Ask the running request to stop after its current scan.
    /// Does nothing while idle.
    pub fn cancel(&self) {
        if self
            .state
            .compare_exchange(COMPUTING, CANCELLING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            log::info!("cancellation requested");
        }
    }

    fn begin(&self) -> Result<ComputeGuard<'_>> {
        self.state
            .compare_exchange(IDLE, COMPUTING, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| {
                log::warn!("route request rejected: planner busy");
                RouteError::Busy
            })?;
        Ok(ComputeGuard(&self.state))
    }
}

/// Returns the planner to `Idle` when dropped
struct ComputeGuard<'a>(&'a AtomicU8);

impl Cancellation for ComputeGuard<'_> {
    fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire) == CANCELLING
    }
}

impl Drop for ComputeGuard<'_> {
    fn drop(&mut self) {
        self.0.store(IDLE, Ordering::Release);
    }
}
