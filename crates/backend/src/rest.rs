use serde_json::Value;
use tracing::debug;

use crate::error::ServiceError;
use crate::service::{BoxFuture, DataService, TableQuery};

/// REST gateway client: tables under `/rest/v1/{table}`, procedures under
/// `/rest/v1/rpc/{name}`. Every request carries the API key both as the
/// `apikey` header and as a bearer token.
#[derive(Debug, Clone)]
pub struct RestDataService {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl RestDataService {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url.trim_end_matches('/'))
    }

    pub fn rpc_url(&self, name: &str) -> String {
        format!("{}/rest/v1/rpc/{name}", self.base_url.trim_end_matches('/'))
    }

    fn authorized(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, ServiceError> {
    if !resp.status().is_success() {
        return Err(ServiceError::Status(resp.status().as_u16()));
    }
    let body = resp
        .bytes()
        .await
        .map_err(|e| ServiceError::with_source("failed to read response", e))?;
    serde_json::from_slice(&body).map_err(|e| ServiceError::Decode(e.to_string()))
}

impl DataService for RestDataService {
    fn select(
        &self,
        table: &str,
        query: &TableQuery,
    ) -> BoxFuture<'_, Result<Vec<Value>, ServiceError>> {
        let url = self.table_url(table);
        let pairs = query.pairs();
        Box::pin(async move {
            debug!("GET {url} {pairs:?}");
            let resp = self
                .authorized(self.client.get(&url))
                .query(&pairs)
                .send()
                .await
                .map_err(|e| ServiceError::with_source("HTTP request failed", e))?;
            read_json(resp).await
        })
    }

    fn call(&self, name: &str, params: Value) -> BoxFuture<'_, Result<Value, ServiceError>> {
        let url = self.rpc_url(name);
        Box::pin(async move {
            debug!("POST {url}");
            let resp = self
                .authorized(self.client.post(&url))
                .json(&params)
                .send()
                .await
                .map_err(|e| ServiceError::with_source("HTTP request failed", e))?;
            read_json(resp).await
        })
    }
}
