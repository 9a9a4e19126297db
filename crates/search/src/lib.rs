//! Neighborhood search: an in-memory name index plus the backend lookups
//! behind selecting a result.

use std::collections::BTreeSet;

use backend::{DataService, ServiceError, TableQuery};
use foundation::bounds::GeoBounds;
use layers::feature::{geometry_bounds, parse_geometry};
use layers::registry::{NEIGHBORHOODS_LAYER, NEIGHBORHOOD_NAME_FIELD};
use serde_json::Value;
use tracing::debug;

/// Most results a query returns.
pub const MAX_RESULTS: usize = 7;
/// Shorter queries return nothing.
pub const MIN_QUERY_CHARS: usize = 2;

/// Sorted, deduplicated list of names with case-insensitive substring lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchIndex {
    names: Vec<String>,
    lowered: Vec<String>,
}

impl SearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the index from raw names. Empty names are dropped.
    pub fn build<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let unique: BTreeSet<String> = names
            .into_iter()
            .map(Into::into)
            .filter(|n: &String| !n.trim().is_empty())
            .collect();
        let names: Vec<String> = unique.into_iter().collect();
        let lowered = names.iter().map(|n| n.to_lowercase()).collect();
        Self { names, lowered }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names containing `query` (trimmed, case-insensitive), in index order,
    /// at most [`MAX_RESULTS`].
    pub fn query(&self, query: &str) -> Vec<&str> {
        let needle = query.trim().to_lowercase();
        if needle.chars().count() < MIN_QUERY_CHARS {
            return Vec::new();
        }
        self.names
            .iter()
            .zip(&self.lowered)
            .filter(|(_, lower)| lower.contains(&needle))
            .map(|(name, _)| name.as_str())
            .take(MAX_RESULTS)
            .collect()
    }
}

/// Reads every neighborhood name from the backend.
pub async fn preload_index(service: &dyn DataService) -> Result<SearchIndex, ServiceError> {
    let rows = service
        .select(
            NEIGHBORHOODS_LAYER,
            &TableQuery::columns(NEIGHBORHOOD_NAME_FIELD),
        )
        .await?;
    let names = rows
        .iter()
        .filter_map(|row| row.get(NEIGHBORHOOD_NAME_FIELD))
        .filter_map(Value::as_str)
        .map(str::to_string);
    let index = SearchIndex::build(names);
    debug!(names = index.len(), "neighborhood index loaded");
    Ok(index)
}

/// Bounds of the named neighborhood, `None` when it is unknown or its
/// geometry is unusable.
pub async fn locate_neighborhood(
    service: &dyn DataService,
    name: &str,
) -> Result<Option<GeoBounds>, ServiceError> {
    let query = TableQuery::columns(format!("geom,{NEIGHBORHOOD_NAME_FIELD}"))
        .eq(NEIGHBORHOOD_NAME_FIELD, name)
        .limit(1);
    let rows = service.select(NEIGHBORHOODS_LAYER, &query).await?;
    let bounds = rows
        .first()
        .and_then(|row| row.get("geom"))
        .and_then(|raw| parse_geometry(raw).ok())
        .and_then(|g| geometry_bounds(&g));
    Ok(bounds)
}
