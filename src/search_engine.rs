use std::future::Future;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::config::CONFIG;
use crate::data_models::{Product, SearchResult};
use crate::errors::EngineError;
use crate::query_builder::Query;

/// Full-text engine the repository prefers for searches.
pub trait SearchEngineClient: Send + Sync + 'static {
    fn execute(
        &self,
        query: &Query,
    ) -> impl Future<Output = Result<SearchResult, EngineError>> + Send;

    /// Indexes one document. Failures are reported as `false`, never raised.
    fn index(&self, product: &Product) -> impl Future<Output = bool> + Send;

    fn ping(&self) -> impl Future<Output = bool> + Send;
}

#[derive(Deserialize)]
struct EsSearchResponse {
    took: u64,
    hits: EsHits,
}

#[derive(Deserialize)]
struct EsHits {
    total: EsTotal,
    hits: Vec<EsHit>,
}

#[derive(Deserialize)]
struct EsTotal {
    value: u64,
}

#[derive(Deserialize)]
struct EsHit {
    #[serde(rename = "_source")]
    source: Product,
}

/// Elasticsearch over its REST API.
#[derive(Clone)]
pub struct ElasticsearchClient {
    client: Client,
    host: String,
    index: String,
    credentials: Option<(String, Option<String>)>,
}

impl ElasticsearchClient {
    pub fn new(host: &str, index: &str, timeout: Duration) -> Result<Self, EngineError> {
        if host.trim().is_empty() {
            return Err(EngineError::Unavailable(
                "elasticsearch host cannot be empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EngineError::Unavailable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            host: host.trim_end_matches('/').to_string(),
            index: index.to_string(),
            credentials: None,
        })
    }

    pub fn with_basic_auth(mut self, username: String, password: Option<String>) -> Self {
        self.credentials = Some((username, password));
        self
    }

    /// Client for the configured cluster and products index.
    pub fn from_config() -> Result<Self, EngineError> {
        let client = Self::new(
            &CONFIG.elasticsearch_host,
            &CONFIG.elasticsearch_index,
            CONFIG.elasticsearch_timeout,
        )?;
        Ok(match &CONFIG.elasticsearch_username {
            Some(username) => {
                client.with_basic_auth(username.clone(), CONFIG.elasticsearch_password.clone())
            }
            None => client,
        })
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.credentials {
            Some((username, password)) => request.basic_auth(username, password.as_ref()),
            None => request,
        }
    }
}

impl SearchEngineClient for ElasticsearchClient {
    async fn execute(&self, query: &Query) -> Result<SearchResult, EngineError> {
        let url = format!("{}/{}/_search", self.host, self.index);
        let body = query.body();
        log::debug!("ES query: {body}");

        let response = self
            .authorize(self.client.post(&url).json(&body))
            .send()
            .await
            .map_err(|e| EngineError::Unavailable(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| EngineError::Unavailable(format!("failed to read response body: {e}")))?;

        classify_status(status, &text)?;
        parse_search_response(&text)
    }

    async fn index(&self, product: &Product) -> bool {
        let url = format!("{}/{}/_doc/{}", self.host, self.index, product.id);
        log::info!("Indexing product: {}", product.id);

        match self
            .authorize(self.client.put(&url).json(product))
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                log::error!(
                    "Failed to index product {}: status={}",
                    product.id,
                    response.status()
                );
                false
            }
            Err(e) => {
                log::error!("Failed to index product {}: {:#}", product.id, e);
                false
            }
        }
    }

    async fn ping(&self) -> bool {
        match self.authorize(self.client.head(&self.host)).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                log::error!("ES ping failed: {:#}", e);
                false
            }
        }
    }
}

/// Client errors mean the engine refused the query; anything else that is
/// not a success is treated as an outage.
fn classify_status(status: StatusCode, body: &str) -> Result<(), EngineError> {
    if status.is_success() {
        Ok(())
    } else if status.is_client_error() {
        Err(EngineError::Query(format!("status={status}, body={body}")))
    } else {
        Err(EngineError::Unavailable(format!(
            "status={status}, body={body}"
        )))
    }
}

fn parse_search_response(body: &str) -> Result<SearchResult, EngineError> {
    let response: EsSearchResponse = serde_json::from_str(body)
        .map_err(|e| EngineError::Unavailable(format!("unreadable search response: {e}")))?;

    Ok(SearchResult {
        hits: response.hits.hits.into_iter().map(|hit| hit.source).collect(),
        total: response.hits.total.value,
        took_ms: response.took,
    })
}
