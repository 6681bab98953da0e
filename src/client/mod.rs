//! Blocking client for the Beanstalk REST API.
//!
//! Every call performs exactly one GET, authenticates with basic auth, and
//! unwraps the JSON envelope. Paged listings come back as a lazy
//! [`PagedResult`] that issues its own GETs as it is traversed.

mod endpoint;
mod envelope;
mod sink;

use std::fmt::Display;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::blocking::Client as HttpClient;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use tracing::warn;

use crate::error::{ApiError, Result};
use crate::paging::{PageSize, PageSource, PagedResult};

pub use endpoint::{Credentials, Endpoint, Params, RequestTarget};
pub use envelope::{EMPTY_XML_PLACEHOLDER, Unwrapped};
pub use sink::{MemorySink, RequestSink, TracingSink};

/// A record as returned by the API, with its envelope removed.
pub type Record = Value;

#[derive(Clone)]
pub struct Client {
    http: HttpClient,
    endpoint: Endpoint,
    sink: Arc<dyn RequestSink>,
    per_page: PageSize,
}

impl Client {
    pub fn new(endpoint: Endpoint, timeout: Option<Duration>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("beanstalk-cli"));
        let mut builder = HttpClient::builder().default_headers(headers);
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let http = builder.build().map_err(|e| ApiError::Transport {
            url: endpoint.base().to_string(),
            reason: format!("failed to build http client: {e}"),
        })?;
        Ok(Self {
            http,
            endpoint,
            sink: Arc::new(TracingSink),
            per_page: PageSize::default(),
        })
    }

    pub fn with_sink(mut self, sink: Arc<dyn RequestSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Page size used by the paged listings.
    pub fn with_page_size(mut self, per_page: PageSize) -> Self {
        self.per_page = per_page;
        self
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn repositories(&self) -> Result<Vec<Record>> {
        self.list(&["repositories"])
    }

    pub fn repository(&self, id: impl Display) -> Result<Record> {
        self.single(&["repositories", id.to_string().as_str()])
    }

    pub fn account(&self, id: impl Display) -> Result<Record> {
        self.single(&["accounts", id.to_string().as_str()])
    }

    pub fn users(&self) -> Result<Vec<Record>> {
        self.list(&["users"])
    }

    pub fn user(&self, id: impl Display) -> Result<Record> {
        self.single(&["users", id.to_string().as_str()])
    }

    /// `repository` is the id or the name of the repository.
    pub fn releases_for(&self, repository: impl Display) -> Result<Vec<Record>> {
        self.list(&[repository.to_string().as_str(), "releases"])
    }

    pub fn tags_for(&self, repository: impl Display) -> Result<Vec<Record>> {
        self.list(&["repositories", repository.to_string().as_str(), "tags"])
    }

    pub fn branches_for(&self, repository: impl Display) -> Result<Vec<Record>> {
        self.list(&["repositories", repository.to_string().as_str(), "branches"])
    }

    /// Changesets across the account, newest first unless `params` says otherwise.
    pub fn changesets(&self, params: Params) -> PagedResult<Client> {
        PagedResult::new(self.clone(), "changesets", params).with_page_size(self.per_page)
    }

    pub fn changesets_for(&self, repository: impl Display, mut params: Params) -> PagedResult<Client> {
        params.insert("repository_id".to_string(), repository.to_string());
        PagedResult::new(self.clone(), "changesets/repository", params)
            .with_page_size(self.per_page)
    }

    /// Fetch `path` (slash-separated, relative to the API base) and unwrap
    /// whatever envelope shape comes back.
    pub fn get(&self, path: &str, params: &Params) -> Result<Unwrapped> {
        self.fetch(&route(path), params, envelope::unwrap_any)
    }

    fn single(&self, segments: &[&str]) -> Result<Record> {
        self.fetch(segments, &Params::new(), envelope::unwrap_single)
    }

    fn list(&self, segments: &[&str]) -> Result<Vec<Record>> {
        self.fetch(segments, &Params::new(), envelope::unwrap_list)
    }

    /// One GET, reported to the sink, decoded, then unwrapped by `unwrap`.
    fn fetch<T>(
        &self,
        segments: &[&str],
        params: &Params,
        unwrap: fn(Value) -> std::result::Result<T, String>,
    ) -> Result<T> {
        let target = self.endpoint.target(segments, params)?;
        let shown = target.redacted();

        let started = Instant::now();
        let outcome = self.send(&target);
        self.sink.append(&shown, started.elapsed());
        let (body, content_type) = outcome.inspect_err(|e| warn!(error = %e, "request failed"))?;

        let protocol = |body: String, reason: String| {
            let reason = match &content_type {
                Some(ct) => format!("{reason} (content-type: {ct})"),
                None => reason,
            };
            warn!(url = %shown, %reason, "unexpected response body");
            ApiError::Protocol {
                url: shown.clone(),
                body,
                reason,
            }
        };

        if let Some(ct) = &content_type
            && !is_json(ct)
            && body != EMPTY_XML_PLACEHOLDER
        {
            return Err(protocol(body, "expected a JSON response".to_string()));
        }

        match envelope::decode(&body).and_then(unwrap) {
            Ok(v) => Ok(v),
            Err(reason) => Err(protocol(body, reason)),
        }
    }

    fn send(&self, target: &RequestTarget<'_>) -> Result<(String, Option<String>)> {
        let mut request = self.http.get(target.url().clone());
        if let Some(c) = target.credentials() {
            request = request.basic_auth(&c.username, Some(&c.password));
        }
        let transport = |e: reqwest::Error| ApiError::Transport {
            url: target.redacted(),
            reason: e.without_url().to_string(),
        };

        let response = request.send().map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                url: target.redacted(),
                status: status.as_u16(),
            });
        }
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().map_err(transport)?;
        Ok((body, content_type))
    }
}

impl PageSource for Client {
    fn fetch_page(&self, path: &str, params: &Params) -> Result<Vec<Record>> {
        self.fetch(&route(path), params, envelope::unwrap_list)
    }
}

fn route(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// `application/json`, with or without parameters such as `charset`.
fn is_json(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}
