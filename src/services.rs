//! Collaborators outside the optimization core.
//!
//! The engine never talks to a map SDK or a geocoder directly. The
//! surrounding application passes implementations of these traits in.

use crate::assembler::RoutePlan;
use crate::error::Result;
use crate::waypoint::{load_waypoints, Waypoint};
use std::path::Path;

/// Source of candidate waypoints for a free-text query
pub trait PlaceSearch {
    fn search(&self, query: &str) -> Result<Vec<Waypoint>>;
    fn name(&self) -> &str;
}

/// Sink for computed routes
pub trait MapRenderer {
    /// Draw a plan, replacing whatever was drawn before
    fn render(&mut self, plan: &RoutePlan) -> Result<()>;
    /// Remove the drawn route
    fn clear(&mut self);
}

/// How a query is matched against the catalog
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SearchKind {
    /// Name, address, road address and category
    Keyword,
    /// Address and road address only
    Address,
}

/// Place search over an in-memory catalog
#[derive(Debug, Clone)]
pub struct CatalogSearch {
    catalog: Vec<Waypoint>,
    kind: SearchKind,
    limit: usize,
}

impl CatalogSearch {
    pub fn new(catalog: Vec<Waypoint>) -> Self {
        CatalogSearch { catalog, kind: SearchKind::Keyword, limit: 15 }
    }

    /// Load the catalog from a `.json` or `.csv` waypoint file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let catalog = load_waypoints(path)?;
        log::info!("loaded {} catalog entries", catalog.len());
        Ok(Self::new(catalog))
    }

    pub fn with_kind(mut self, kind: SearchKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }

    fn matches(&self, waypoint: &Waypoint, needle: &str) -> bool {
        let contains = |field: Option<&str>| {
            field.map(|s| s.to_lowercase().contains(needle)).unwrap_or(false)
        };

        let address_match = contains(waypoint.address.as_deref()) || contains(waypoint.road_address.as_deref());
        match self.kind {
            SearchKind::Address => address_match,
            SearchKind::Keyword => {
                address_match || contains(Some(waypoint.name.as_str())) || contains(waypoint.category.as_deref())
            }
        }
    }
}

impl PlaceSearch for CatalogSearch {
    fn search(&self, query: &str) -> Result<Vec<Waypoint>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let results: Vec<Waypoint> = self
            .catalog
            .iter()
            .filter(|w| self.matches(w, &needle))
            .take(self.limit)
            .cloned()
            .collect();

        log::debug!("{:?} search '{}': {} results", self.kind, query, results.len());
        Ok(results)
    }

    fn name(&self) -> &str {
        match self.kind {
            SearchKind::Keyword => "catalog-keyword",
            SearchKind::Address => "catalog-address",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<Waypoint> {
        vec![
            Waypoint::new("1", "Seoul City Hall", 37.5665, 126.9780)
                .with_road_address("110 Sejong-daero, Jung-gu")
                .with_category("Public office"),
            Waypoint::new("2", "Deoksugung Palace", 37.5658, 126.9751)
                .with_address("5-1 Jeong-dong, Jung-gu")
                .with_category("Tourism > Palace"),
            Waypoint::new("3", "Gyeongbokgung Palace", 37.5796, 126.9770)
                .with_road_address("161 Sajik-ro, Jongno-gu")
                .with_category("Tourism > Palace"),
        ]
    }

    #[test]
    fn test_keyword_search() {
        let search = CatalogSearch::new(catalog());
        let ids: Vec<String> = search.search("palace").unwrap().into_iter().map(|w| w.id).collect();
        assert_eq!(ids, vec!["2", "3"]);

        let ids: Vec<String> = search.search("  JUNG-GU ").unwrap().into_iter().map(|w| w.id).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn test_address_search_ignores_names() {
        let search = CatalogSearch::new(catalog()).with_kind(SearchKind::Address);
        assert!(search.search("palace").unwrap().is_empty());
        assert_eq!(search.search("sajik").unwrap().len(), 1);
        assert_eq!(search.name(), "catalog-address");
    }

    #[test]
    fn test_empty_query_and_limit() {
        let search = CatalogSearch::new(catalog()).with_limit(1);
        assert!(search.search("   ").unwrap().is_empty());
        assert_eq!(search.search("gu").unwrap().len(), 1);
    }
}
