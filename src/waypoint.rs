//! Waypoints and the files they are loaded from.
//!
//! A waypoint is a named point picked from a place-search result. Besides the
//! coordinates it carries four metadata fields (address, road address, phone,
//! category) that the engine never interprets but hands back unchanged.
//!
//! Two input formats are supported:
//! - JSON: an array of objects with the fields of [`Waypoint`]. Ids may be
//!   strings or numbers.
//! - CSV: a header `id,name,lat,lng,address,roadAddress,phone,category`;
//!   the four metadata columns are optional and may be empty.

use crate::error::{Result, RouteError};
use crate::geo;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// A named geographic point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Opaque identifier, unique within one optimization request
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    /// Display name
    pub name: String,
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lng: f64,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, rename = "roadAddress")]
    pub road_address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl Waypoint {
    pub fn new(id: impl Into<String>, name: impl Into<String>, lat: f64, lng: f64) -> Self {
        Waypoint {
            id: id.into(),
            name: name.into(),
            lat,
            lng,
            address: None,
            road_address: None,
            phone: None,
            category: None,
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_road_address(mut self, road_address: impl Into<String>) -> Self {
        self.road_address = Some(road_address.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Check the coordinates are finite and inside the geographic range
    pub fn has_valid_coordinates(&self) -> bool {
        geo::is_valid_coordinate(self.lat, self.lng)
    }

    /// Reject the waypoint if its coordinates cannot be fed to the distance
    /// computation
    pub fn validate(&self) -> Result<()> {
        if self.has_valid_coordinates() {
            Ok(())
        } else {
            Err(RouteError::InvalidCoordinate {
                id: self.id.clone(),
                lat: self.lat,
                lng: self.lng,
            })
        }
    }

    /// Road address when known, otherwise the plain address
    pub fn display_address(&self) -> Option<&str> {
        self.road_address
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.address.as_deref())
    }

    /// Great-circle distance to another waypoint in kilometers
    #[inline]
    pub fn distance_to(&self, other: &Waypoint) -> f64 {
        geo::distance(self, other)
    }
}

impl std::fmt::Display for Waypoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}] ({:.6}, {:.6})", self.name, self.id, self.lat, self.lng)
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Integer(i64),
        Number(f64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Integer(i) => i.to_string(),
        RawId::Number(n) => n.to_string(),
    })
}

/// CSV row; kept separate so ids are always read verbatim as text
#[derive(Debug, Deserialize)]
struct CsvRow {
    id: String,
    name: String,
    lat: f64,
    lng: f64,
    #[serde(default)]
    address: Option<String>,
    #[serde(default, rename = "roadAddress")]
    road_address: Option<String>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    category: Option<String>,
}

impl From<CsvRow> for Waypoint {
    fn from(row: CsvRow) -> Self {
        Waypoint {
            id: row.id,
            name: row.name,
            lat: row.lat,
            lng: row.lng,
            address: row.address,
            road_address: row.road_address,
            phone: row.phone,
            category: row.category,
        }
    }
}

/// Load waypoints from a `.json` or `.csv` file.
///
/// Coordinates are not validated here; that is the assembler's job so the
/// configured invalid-coordinate policy applies.
pub fn load_waypoints<P: AsRef<Path>>(path: P) -> Result<Vec<Waypoint>> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("json") => {
            let reader = BufReader::new(File::open(path)?);
            Ok(serde_json::from_reader(reader)?)
        }
        Some("csv") => {
            let mut reader = csv::ReaderBuilder::new()
                .trim(csv::Trim::All)
                .from_path(path)?;
            let mut waypoints = Vec::new();
            for row in reader.deserialize::<CsvRow>() {
                waypoints.push(row?.into());
            }
            Ok(waypoints)
        }
        _ => Err(RouteError::parse(format!(
            "unsupported waypoint file {:?}: expected .json or .csv",
            path
        ))),
    }
}

/// Summary figures over a waypoint set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaypointStatistics {
    pub count: usize,
    pub invalid: usize,
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
    pub centroid: (f64, f64),
    pub avg_distance: f64,
    pub max_distance: f64,
}

impl WaypointStatistics {
    /// Compute statistics over the waypoints with valid coordinates
    pub fn compute(waypoints: &[Waypoint]) -> Self {
        let valid: Vec<&Waypoint> = waypoints.iter().filter(|w| w.has_valid_coordinates()).collect();

        let mut min_lat = f64::INFINITY;
        let mut max_lat = f64::NEG_INFINITY;
        let mut min_lng = f64::INFINITY;
        let mut max_lng = f64::NEG_INFINITY;
        let mut sum_lat = 0.0;
        let mut sum_lng = 0.0;

        for w in &valid {
            min_lat = min_lat.min(w.lat);
            max_lat = max_lat.max(w.lat);
            min_lng = min_lng.min(w.lng);
            max_lng = max_lng.max(w.lng);
            sum_lat += w.lat;
            sum_lng += w.lng;
        }

        let mut distances = Vec::new();
        for i in 0..valid.len() {
            for j in i + 1..valid.len() {
                distances.push(valid[i].distance_to(valid[j]));
            }
        }

        let avg_distance = if distances.is_empty() {
            0.0
        } else {
            distances.iter().sum::<f64>() / distances.len() as f64
        };
        let max_distance = distances.iter().cloned().fold(0.0, f64::max);

        let centroid = if valid.is_empty() {
            (0.0, 0.0)
        } else {
            (sum_lat / valid.len() as f64, sum_lng / valid.len() as f64)
        };

        WaypointStatistics {
            count: waypoints.len(),
            invalid: waypoints.len() - valid.len(),
            min_lat,
            max_lat,
            min_lng,
            max_lng,
            centroid,
            avg_distance,
            max_distance,
        }
    }
}

impl std::fmt::Display for WaypointStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Waypoints: {} ({} with invalid coordinates)", self.count, self.invalid)?;
        if self.count > self.invalid {
            writeln!(f, "  Latitude: {:.5} .. {:.5}", self.min_lat, self.max_lat)?;
            writeln!(f, "  Longitude: {:.5} .. {:.5}", self.min_lng, self.max_lng)?;
            writeln!(f, "  Centroid: ({:.5}, {:.5})", self.centroid.0, self.centroid.1)?;
        }
        writeln!(f, "  Avg distance: {:.3} km", self.avg_distance)?;
        writeln!(f, "  Max distance: {:.3} km", self.max_distance)
    }
}
