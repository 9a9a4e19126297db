use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use crate::error::ServiceError;

/// Type alias for a boxed future that can be sent between threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Row selection against a table resource (`select`, equality filters, `limit`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableQuery {
    pub select: String,
    pub filters: Vec<(String, String)>,
    pub limit: Option<u32>,
}

impl Default for TableQuery {
    fn default() -> Self {
        Self {
            select: "*".to_string(),
            filters: Vec::new(),
            limit: None,
        }
    }
}

impl TableQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn columns(columns: impl Into<String>) -> Self {
        Self {
            select: columns.into(),
            ..Self::default()
        }
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((column.into(), value.into()));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Query pairs in the `column=eq.value` form the REST gateway expects.
    /// Values are left unencoded; the HTTP client encodes them.
    pub fn pairs(&self) -> Vec<(String, String)> {
        let mut out = vec![("select".to_string(), self.select.clone())];
        for (column, value) in &self.filters {
            out.push((column.clone(), format!("eq.{value}")));
        }
        if let Some(limit) = self.limit {
            out.push(("limit".to_string(), limit.to_string()));
        }
        out
    }

    /// Column names requested, or `None` for `*`.
    pub fn selected_columns(&self) -> Option<Vec<&str>> {
        if self.select.trim() == "*" {
            return None;
        }
        Some(
            self.select
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .collect(),
        )
    }
}

/// Remote data backend: direct table reads and named procedures.
///
/// Implementations must be `Send + Sync`; methods return boxed futures for
/// dyn-compatibility.
pub trait DataService: Send + Sync {
    /// Reads rows from `table`. Each row is a JSON object.
    fn select(&self, table: &str, query: &TableQuery)
        -> BoxFuture<'_, Result<Vec<Value>, ServiceError>>;

    /// Invokes the procedure `name` with a JSON object of named parameters.
    fn call(&self, name: &str, params: Value) -> BoxFuture<'_, Result<Value, ServiceError>>;
}
