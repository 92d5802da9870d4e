//! Planner configuration.
//!
//! Every field has a default, so a JSON config file only needs the keys it
//! changes. Command-line flags are applied on top of the file.

use crate::error::Result;
use crate::optimizer::{ImprovementPolicy, TwoOptOptimizer, DEFAULT_MAX_ITERATIONS};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// What to do with waypoints whose coordinates are not usable
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InvalidCoordinatePolicy {
    /// Fail the request with `InvalidCoordinate`
    #[default]
    Reject,
    /// Drop the waypoint, log a warning and continue
    Filter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Cap on 2-opt scans
    pub max_iterations: usize,
    pub policy: ImprovementPolicy,
    /// Requests above this many waypoints are rejected; `None` disables
    pub max_waypoints: Option<usize>,
    /// Requests above this many waypoints are logged as slow
    pub warn_waypoints: usize,
    pub invalid_coordinates: InvalidCoordinatePolicy,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        PlannerConfig {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            policy: ImprovementPolicy::FirstImprovement,
            max_waypoints: Some(500),
            warn_waypoints: 50,
            invalid_coordinates: InvalidCoordinatePolicy::Reject,
        }
    }
}

impl PlannerConfig {
    /// Read a JSON config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn optimizer(&self) -> TwoOptOptimizer {
        TwoOptOptimizer {
            policy: self.policy,
            max_iterations: self.max_iterations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PlannerConfig::default();
        assert_eq!(config.max_iterations, 100);
        assert_eq!(config.policy, ImprovementPolicy::FirstImprovement);
        assert_eq!(config.invalid_coordinates, InvalidCoordinatePolicy::Reject);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: PlannerConfig =
            serde_json::from_str(r#"{"policy": "best-improvement", "max_waypoints": null}"#).unwrap();
        assert_eq!(config.policy, ImprovementPolicy::BestImprovement);
        assert_eq!(config.max_waypoints, None);
        assert_eq!(config.max_iterations, 100);
        assert_eq!(config.warn_waypoints, 50);
    }

    #[test]
    fn test_optimizer_from_config() {
        let config = PlannerConfig { max_iterations: 7, ..Default::default() };
        let opt = config.optimizer();
        assert_eq!(opt.max_iterations, 7);
        assert_eq!(opt.name(), "2-Opt-FI");
    }
}
