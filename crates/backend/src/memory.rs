use std::collections::HashMap;

use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::error::ServiceError;
use crate::service::{BoxFuture, DataService, TableQuery};

/// A request as seen by [`MemoryDataService`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedRequest {
    Select { table: String, query: TableQuery },
    Call { name: String, params: Value },
}

#[derive(Debug, Clone)]
enum Reply {
    Ok(Value),
    Status(u16),
}

/// In-memory data service for tests and offline runs.
///
/// Tables are plain row lists; procedures return canned replies. Every
/// request is recorded so callers can assert what went over the "wire".
#[derive(Debug, Default)]
pub struct MemoryDataService {
    tables: RwLock<HashMap<String, Reply>>,
    procedures: RwLock<HashMap<String, Reply>>,
    requests: RwLock<Vec<RecordedRequest>>,
}

impl MemoryDataService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: impl Into<String>, rows: Vec<Value>) -> Self {
        self.tables
            .get_mut()
            .insert(table.into(), Reply::Ok(Value::Array(rows)));
        self
    }

    pub fn with_failing_table(mut self, table: impl Into<String>, status: u16) -> Self {
        self.tables
            .get_mut()
            .insert(table.into(), Reply::Status(status));
        self
    }

    pub fn with_procedure(mut self, name: impl Into<String>, reply: Value) -> Self {
        self.procedures
            .get_mut()
            .insert(name.into(), Reply::Ok(reply));
        self
    }

    pub fn with_failing_procedure(mut self, name: impl Into<String>, status: u16) -> Self {
        self.procedures
            .get_mut()
            .insert(name.into(), Reply::Status(status));
        self
    }

    pub async fn set_procedure(&self, name: impl Into<String>, reply: Value) {
        self.procedures
            .write()
            .await
            .insert(name.into(), Reply::Ok(reply));
    }

    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.read().await.clone()
    }

    pub async fn call_count(&self, name: &str) -> usize {
        self.requests
            .read()
            .await
            .iter()
            .filter(|r| matches!(r, RecordedRequest::Call { name: n, .. } if n == name))
            .count()
    }
}

fn cell_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn apply_query(rows: &[Value], query: &TableQuery) -> Vec<Value> {
    let columns = query.selected_columns();
    let matching = rows.iter().filter(|row| {
        query
            .filters
            .iter()
            .all(|(col, want)| row.get(col).is_some_and(|v| cell_text(v) == *want))
    });
    let projected = matching.map(|row| match (&columns, row.as_object()) {
        (Some(cols), Some(obj)) => {
            let mut out = Map::new();
            for col in cols {
                if let Some(v) = obj.get(*col) {
                    out.insert((*col).to_string(), v.clone());
                }
            }
            Value::Object(out)
        }
        _ => row.clone(),
    });
    match query.limit {
        Some(limit) => projected.take(limit as usize).collect(),
        None => projected.collect(),
    }
}

impl DataService for MemoryDataService {
    fn select(
        &self,
        table: &str,
        query: &TableQuery,
    ) -> BoxFuture<'_, Result<Vec<Value>, ServiceError>> {
        let table = table.to_string();
        let query = query.clone();
        Box::pin(async move {
            self.requests.write().await.push(RecordedRequest::Select {
                table: table.clone(),
                query: query.clone(),
            });
            match self.tables.read().await.get(&table) {
                Some(Reply::Ok(Value::Array(rows))) => Ok(apply_query(rows, &query)),
                Some(Reply::Ok(_)) => Err(ServiceError::Decode("expected a row array".into())),
                Some(Reply::Status(code)) => Err(ServiceError::Status(*code)),
                None => Err(ServiceError::Status(404)),
            }
        })
    }

    fn call(&self, name: &str, params: Value) -> BoxFuture<'_, Result<Value, ServiceError>> {
        let name = name.to_string();
        Box::pin(async move {
            self.requests.write().await.push(RecordedRequest::Call {
                name: name.clone(),
                params,
            });
            match self.procedures.read().await.get(&name) {
                Some(Reply::Ok(v)) => Ok(v.clone()),
                Some(Reply::Status(code)) => Err(ServiceError::Status(*code)),
                None => Err(ServiceError::Status(404)),
            }
        })
    }
}
