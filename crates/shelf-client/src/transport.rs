use std::marker::PhantomData;
use std::sync::Arc;

use futures::future::BoxFuture;
use http::StatusCode;
use serde::de::DeserializeOwned;
use shelf_query::{ListRequest, ListResult};
use tracing::{debug, error};

use crate::config::ClientConfig;
use crate::envelope::{decode_list, decode_options};
use crate::error::FetchError;
use crate::fetcher::{ListFetcher, ReferenceSource};
use crate::models::DropdownOption;

/// Blocking JSON-over-HTTP client shared by the fetchers. Calls are moved to
/// the blocking pool by the async adapters below.
#[derive(Clone)]
pub struct HttpClient {
    agent: ureq::Agent,
    config: Arc<ClientConfig>,
}

impl HttpClient {
    pub fn new(config: ClientConfig) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(config.timeout()))
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            agent,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// `GET url?query`, returning the status and raw body. Only transport
    /// failures are errors here; status handling belongs to the decoders.
    pub fn get(
        &self,
        url: &str,
        query: &[(String, String)],
        authorized: bool,
    ) -> Result<(StatusCode, String), FetchError> {
        let mut request = self.agent.get(url).header("Accept", "application/json");
        for (key, value) in query {
            request = request.query(key, value);
        }
        if authorized {
            if let Some(token) = &self.config.token {
                request = request.header("Authorization", format!("Bearer {token}"));
            }
        }

        let mut response = request.call()?;
        let status = response.status();
        let body = response.body_mut().read_to_string()?;
        debug!(url, status = status.as_u16(), bytes = body.len(), "response received");
        Ok((status, body))
    }

    async fn get_blocking(
        &self,
        url: String,
        query: Vec<(String, String)>,
        authorized: bool,
    ) -> Result<(StatusCode, String), FetchError> {
        let client = self.clone();
        tokio::task::spawn_blocking(move || client.get(&url, &query, authorized))
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?
    }
}

// ── List endpoints ──────────────────────────────────────────────

pub struct HttpListFetcher<T> {
    client: HttpClient,
    url: String,
    search_param: String,
    _item: PhantomData<fn() -> T>,
}

impl<T> HttpListFetcher<T> {
    pub fn new(client: HttpClient, endpoint: &str, search_param: impl Into<String>) -> Self {
        let url = client.config().api_url(endpoint);
        Self {
            client,
            url,
            search_param: search_param.into(),
            _item: PhantomData,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl<T> ListFetcher for HttpListFetcher<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    type Item = T;

    fn fetch(&self, request: ListRequest) -> BoxFuture<'static, Result<ListResult<T>, FetchError>> {
        let client = self.client.clone();
        let url = self.url.clone();
        let query = request.query_pairs(&self.search_param);
        Box::pin(async move {
            let (status, body) = client.get_blocking(url.clone(), query, true).await?;
            decode_list(status, &body, &request).inspect_err(|e| {
                if let FetchError::Decode(reason) = e {
                    error!(url, %reason, "malformed list response");
                }
            })
        })
    }
}

// ── Reference endpoints ─────────────────────────────────────────

/// Public dropdown data; no bearer token is sent.
pub struct HttpReferenceSource {
    client: HttpClient,
    url: String,
}

impl HttpReferenceSource {
    pub const BOOK_CATEGORIES: &'static str = "/book-categories";

    pub fn new(client: HttpClient, endpoint: &str) -> Self {
        let url = client.config().reference_url(endpoint);
        Self { client, url }
    }

    pub fn book_categories(client: HttpClient) -> Self {
        Self::new(client, Self::BOOK_CATEGORIES)
    }
}

impl ReferenceSource for HttpReferenceSource {
    fn fetch_options(&self) -> BoxFuture<'static, Result<Vec<DropdownOption>, FetchError>> {
        let client = self.client.clone();
        let url = self.url.clone();
        Box::pin(async move {
            let (status, body) = client.get_blocking(url.clone(), Vec::new(), false).await?;
            decode_options(status, &body).inspect_err(|e| {
                if let FetchError::Decode(reason) = e {
                    error!(url, %reason, "malformed reference response");
                }
            })
        })
    }
}
