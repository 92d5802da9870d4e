//! The editable waypoint list behind a planning session.
//!
//! Selecting waypoints fills the start slot first and the end slot second;
//! later selections become interior stops. Any edit invalidates the last
//! computed plan.

use crate::assembler::{RoutePlan, RouteRequest};
use crate::error::{EndpointRole, Result, RouteError};
use crate::waypoint::Waypoint;

#[derive(Debug, Clone, Default)]
pub struct Itinerary {
    waypoints: Vec<Waypoint>,
    start: Option<String>,
    end: Option<String>,
    plan: Option<RoutePlan>,
}

impl Itinerary {
    pub fn new() -> Self {
        Self::default()
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

    pub fn start(&self) -> Option<&str> {
        self.start.as_deref()
    }

    pub fn end(&self) -> Option<&str> {
        self.end.as_deref()
    }

    /// Last plan stored with [`set_plan`](Self::set_plan), if still current
    pub fn plan(&self) -> Option<&RoutePlan> {
        self.plan.as_ref()
    }

    pub fn set_plan(&mut self, plan: RoutePlan) {
        self.plan = Some(plan);
    }

    /// Add a waypoint, filling the start then the end slot when empty
    pub fn select(&mut self, waypoint: Waypoint) -> Result<()> {
        if self.contains(&waypoint.id) {
            return Err(RouteError::DuplicateWaypoint(waypoint.id));
        }

        if self.start.is_none() {
            self.start = Some(waypoint.id.clone());
        } else if self.end.is_none() {
            self.end = Some(waypoint.id.clone());
        }
        self.waypoints.push(waypoint);
        self.plan = None;
        Ok(())
    }

    /// Remove a waypoint; clears the start or end slot that referenced it
    pub fn remove(&mut self, id: &str) -> Option<Waypoint> {
        let index = self.waypoints.iter().position(|w| w.id == id)?;

        if self.start.as_deref() == Some(id) {
            self.start = None;
        }
        if self.end.as_deref() == Some(id) {
            self.end = None;
        }
        self.plan = None;
        Some(self.waypoints.remove(index))
    }

    pub fn set_start(&mut self, id: &str) -> Result<()> {
        self.set_endpoint(EndpointRole::Start, id)
    }

    pub fn set_end(&mut self, id: &str) -> Result<()> {
        self.set_endpoint(EndpointRole::End, id)
    }

    /// Moving a waypoint into one slot vacates the other if it held it
    fn set_endpoint(&mut self, role: EndpointRole, id: &str) -> Result<()> {
        if !self.contains(id) {
            return Err(RouteError::UnknownEndpoint { role, id: id.to_string() });
        }
        let (slot, other) = match role {
            EndpointRole::Start => (&mut self.start, &mut self.end),
            EndpointRole::End => (&mut self.end, &mut self.start),
        };
        if other.as_deref() == Some(id) {
            *other = None;
        }
        *slot = Some(id.to_string());
        self.plan = None;
        Ok(())
    }

    pub fn clear_endpoints(&mut self) {
        self.start = None;
        self.end = None;
        self.plan = None;
    }

    /// Drop all waypoints, endpoints and the plan
    pub fn reset(&mut self) {
        self.waypoints.clear();
        self.clear_endpoints();
    }

    /// Build a request: fixed-endpoint mode when both slots are set, free
    /// mode when neither is
    pub fn request(&self) -> Result<RouteRequest> {
        match (&self.start, &self.end) {
            (Some(start), Some(end)) => Ok(RouteRequest::fixed(self.waypoints.clone(), start.clone(), end.clone())),
            (None, None) => Ok(RouteRequest::free(self.waypoints.clone())),
            (None, Some(_)) => Err(RouteError::MissingEndpoint(EndpointRole::Start)),
            (Some(_), None) => Err(RouteError::MissingEndpoint(EndpointRole::End)),
        }
    }

    fn contains(&self, id: &str) -> bool {
        self.waypoints.iter().any(|w| w.id == id)
    }
}
