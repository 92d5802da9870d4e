//! Error type shared by the whole crate.
//!
//! Every check happens before any distance computation starts, so the
//! optimization itself never fails once a request has been accepted.

use thiserror::Error as ThisError;

/// Which pinned endpoint an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointRole {
    Start,
    End,
}

impl std::fmt::Display for EndpointRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EndpointRole::Start => write!(f, "start"),
            EndpointRole::End => write!(f, "end"),
        }
    }
}

#[derive(Debug, ThisError)]
pub enum RouteError {
    #[error("at least {required} waypoints are required, found {found}")]
    InvalidWaypointCount { required: usize, found: usize },
    #[error("no {0} waypoint was designated")]
    MissingEndpoint(EndpointRole),
    #[error("{role} waypoint '{id}' is not part of the waypoint set")]
    UnknownEndpoint { role: EndpointRole, id: String },
    #[error("start and end must be distinct waypoints, both are '{0}'")]
    IdenticalEndpoints(String),
    #[error("waypoint '{id}' has invalid coordinates (lat={lat}, lng={lng})")]
    InvalidCoordinate { id: String, lat: f64, lng: f64 },
    #[error("waypoint id '{0}' appears more than once")]
    DuplicateWaypoint(String),
    #[error("{found} waypoints exceed the configured limit of {limit}")]
    TooManyWaypoints { limit: usize, found: usize },
    #[error("a route computation is already in progress")]
    Busy,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, RouteError>;

impl RouteError {
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// True for errors caused by the request content rather than by I/O or
    /// by the planner being occupied.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            RouteError::InvalidWaypointCount { .. }
                | RouteError::MissingEndpoint(_)
                | RouteError::UnknownEndpoint { .. }
                | RouteError::IdenticalEndpoints(_)
                | RouteError::InvalidCoordinate { .. }
                | RouteError::DuplicateWaypoint(_)
                | RouteError::TooManyWaypoints { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = RouteError::UnknownEndpoint { role: EndpointRole::End, id: "42".to_string() };
        assert_eq!(err.to_string(), "end waypoint '42' is not part of the waypoint set");

        let err = RouteError::InvalidWaypointCount { required: 2, found: 1 };
        assert!(err.to_string().contains("at least 2"));
    }

    #[test]
    fn test_validation_classification() {
        assert!(RouteError::DuplicateWaypoint("a".into()).is_validation());
        assert!(!RouteError::Busy.is_validation());
        assert!(!RouteError::parse("bad row").is_validation());
    }
}
