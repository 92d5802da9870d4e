//! Ordered routes and the distance figures derived from them.
//!
//! A [`Route`] is an open path: there is no edge from the last waypoint back
//! to the first. Leg distances and the total are always recomputed from the
//! waypoint sequence, never stored next to it independently.

use crate::geo;
use crate::waypoint::Waypoint;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Ordered, non-repeating sequence of waypoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    waypoints: Vec<Waypoint>,
}

impl Route {
    pub fn new(waypoints: Vec<Waypoint>) -> Self {
        Route { waypoints }
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn first(&self) -> Option<&Waypoint> {
        self.waypoints.first()
    }

    pub fn last(&self) -> Option<&Waypoint> {
        self.waypoints.last()
    }

    /// Ids in visiting order
    pub fn ids(&self) -> Vec<&str> {
        self.waypoints.iter().map(|w| w.id.as_str()).collect()
    }

    /// Position of a waypoint in the route
    pub fn position(&self, id: &str) -> Option<usize> {
        self.waypoints.iter().position(|w| w.id == id)
    }

    /// Check every id is present exactly once
    pub fn has_unique_ids(&self) -> bool {
        let unique: HashSet<&str> = self.waypoints.iter().map(|w| w.id.as_str()).collect();
        unique.len() == self.waypoints.len()
    }

    /// Consecutive leg distances in kilometers, `len() - 1` entries
    pub fn leg_distances(&self) -> Vec<f64> {
        self.waypoints
            .windows(2)
            .map(|pair| geo::distance(&pair[0], &pair[1]))
            .collect()
    }

    /// Sum of the leg distances
    pub fn total_distance(&self) -> f64 {
        self.leg_distances().iter().fold(0.0, |acc, d| acc + d)
    }

    /// Snapshot of the per-leg and total distances
    pub fn summary(&self) -> RouteSummary {
        let legs: Vec<Leg> = self
            .waypoints
            .windows(2)
            .map(|pair| Leg {
                from: pair[0].id.clone(),
                to: pair[1].id.clone(),
                distance_km: geo::distance(&pair[0], &pair[1]),
            })
            .collect();
        let total_km = legs.iter().fold(0.0, |acc, leg| acc + leg.distance_km);

        RouteSummary { legs, total_km }
    }

    pub fn into_waypoints(self) -> Vec<Waypoint> {
        self.waypoints
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let legs = self.leg_distances();
        for (index, waypoint) in self.waypoints.iter().enumerate() {
            match legs.get(index) {
                Some(d) => writeln!(f, "{:>3}. {} ({:.1}km)", index + 1, waypoint.name, d)?,
                None => writeln!(f, "{:>3}. {}", index + 1, waypoint.name)?,
            }
        }
        write!(f, "Total distance: {:.1} km", self.total_distance())
    }
}

/// One edge of a route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leg {
    pub from: String,
    pub to: String,
    pub distance_km: f64,
}

/// Per-leg and total distances of a route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSummary {
    pub legs: Vec<Leg>,
    pub total_km: f64,
}

impl RouteSummary {
    pub fn leg_distances(&self) -> Vec<f64> {
        self.legs.iter().map(|l| l.distance_km).collect()
    }

    pub fn longest_leg(&self) -> Option<&Leg> {
        self.legs
            .iter()
            .max_by_key(|l| ordered_float::OrderedFloat(l.distance_km))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc() -> Vec<Waypoint> {
        vec![
            Waypoint::new("A", "City Hall", 37.5665, 126.9780),
            Waypoint::new("B", "Seoul Station", 37.5600, 126.9700),
            Waypoint::new("C", "Gwanghwamun", 37.5700, 126.9850),
        ]
    }

    #[test]
    fn test_empty_and_single_routes() {
        let empty = Route::new(Vec::new());
        assert!(empty.leg_distances().is_empty());
        assert_eq!(empty.total_distance(), 0.0);
        assert!(empty.summary().legs.is_empty());

        let single = Route::new(vec![abc().remove(0)]);
        assert_eq!(single.total_distance(), 0.0);
    }

    #[test]
    fn test_summary_matches_route() {
        let waypoints = abc();
        let route = Route::new(waypoints.clone());
        let summary = route.summary();

        assert_eq!(summary.legs.len(), 2);
        assert_eq!(summary.legs[0].from, "A");
        assert_eq!(summary.legs[1].to, "C");
        assert_eq!(summary.leg_distances(), route.leg_distances());
        assert_eq!(
            summary.total_km,
            waypoints[0].distance_to(&waypoints[1]) + waypoints[1].distance_to(&waypoints[2])
        );
        assert_eq!(summary.total_km, route.total_distance());
    }

    #[test]
    fn test_route_has_no_closing_edge() {
        let route = Route::new(abc());
        let closed = route.total_distance() + route.last().unwrap().distance_to(route.first().unwrap());
        assert!(route.total_distance() < closed);
    }

    #[test]
    fn test_positions_and_uniqueness() {
        let route = Route::new(abc());
        assert_eq!(route.ids(), vec!["A", "B", "C"]);
        assert_eq!(route.position("C"), Some(2));
        assert_eq!(route.position("Z"), None);
        assert!(route.has_unique_ids());

        let mut dup = abc();
        dup.push(dup[0].clone());
        assert!(!Route::new(dup).has_unique_ids());
    }

    #[test]
    fn test_longest_leg() {
        let summary = Route::new(abc()).summary();
        let longest = summary.longest_leg().unwrap();
        assert_eq!(longest.from, "B");
    }

    #[test]
    fn test_display_lists_legs() {
        let text = Route::new(abc()).to_string();
        assert!(text.contains("1. City Hall"));
        assert!(text.contains("Total distance"));
    }
}
