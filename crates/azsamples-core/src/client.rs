//! Azure Resource Manager transport and the generic operation helper
//!
//! Every wrapper in [`compute`](crate::compute) and [`storage`](crate::storage)
//! describes its call as an [`OperationSpec`] and hands it to
//! [`ArmClient::invoke`] (single call or long-running) or
//! [`ArmClient::pager`] (listings). Nothing else talks HTTP.

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, HeaderMap};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::auth::TokenCredential;
use crate::error::{CoreError, Result};
use crate::pager::Pager;
use crate::progress::{PollOptions, Poller};

/// User agent string for azsamples HTTP requests
const AZSAMPLES_USER_AGENT: &str = concat!("azsamples/", env!("CARGO_PKG_VERSION"));

/// Whether the service completes the call inline or hands back an operation to poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Sync,
    LongRunning,
}

/// Verb metadata for one service call
#[derive(Debug, Clone)]
pub struct OperationSpec {
    pub method: Method,
    /// Resource path, already percent-encoded (see [`ResourcePath`](crate::ResourcePath))
    pub path: String,
    pub api_version: &'static str,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub kind: OperationKind,
}

impl OperationSpec {
    pub fn new(method: Method, path: impl Into<String>, api_version: &'static str) -> Self {
        Self {
            method,
            path: path.into(),
            api_version,
            query: Vec::new(),
            body: None,
            kind: OperationKind::Sync,
        }
    }

    pub fn get(path: impl Into<String>, api_version: &'static str) -> Self {
        Self::new(Method::GET, path, api_version)
    }

    pub fn put(path: impl Into<String>, api_version: &'static str, body: &Value) -> Self {
        Self::new(Method::PUT, path, api_version).body(body)
    }

    pub fn patch(path: impl Into<String>, api_version: &'static str, body: &Value) -> Self {
        Self::new(Method::PATCH, path, api_version).body(body)
    }

    pub fn post(path: impl Into<String>, api_version: &'static str) -> Self {
        Self::new(Method::POST, path, api_version)
    }

    pub fn delete(path: impl Into<String>, api_version: &'static str) -> Self {
        Self::new(Method::DELETE, path, api_version)
    }

    /// Attach a request body, passed through unmodified
    #[must_use]
    pub fn body(mut self, body: &Value) -> Self {
        self.body = Some(body.clone());
        self
    }

    /// Attach a request body when one is given
    #[must_use]
    pub fn body_opt(self, body: Option<&Value>) -> Self {
        match body {
            Some(body) => self.body(body),
            None => self,
        }
    }

    /// Mark the call as long-running
    #[must_use]
    pub fn long_running(mut self) -> Self {
        self.kind = OperationKind::LongRunning;
        self
    }

    #[must_use]
    pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    /// Add a query parameter only when a value is given
    #[must_use]
    pub fn query_opt(self, key: &str, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }
}

/// Status, headers and decoded JSON body of a successful response
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

impl RawResponse {
    /// Header value as a string, if present and valid UTF-8
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Terminal outcome of [`ArmClient::invoke`]
#[derive(Debug, Clone)]
pub struct Completion {
    /// Path the operation was submitted to
    pub path: String,
    /// Final payload, if the service returned one
    pub body: Option<Value>,
}

impl Completion {
    /// The resource id, falling back to the submission path when the
    /// final payload has no `id`
    pub fn resource_id(&self) -> String {
        resource_id_or_path(self.body.as_ref(), &self.path)
    }

    /// The payload, or `Value::Null` when there was none
    pub fn into_body(self) -> Value {
        self.body.unwrap_or(Value::Null)
    }
}

/// `id` from a payload, or `path` when the payload lacks a non-empty `id`
///
/// Some services omit `id` from create responses.
pub fn resource_id_or_path(body: Option<&Value>, path: &str) -> String {
    body.and_then(|b| b.get("id"))
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| path.to_string())
}

struct Inner {
    http: reqwest::Client,
    endpoint: Url,
    credential: Arc<dyn TokenCredential>,
    scope: String,
}

/// Authenticated Resource Manager client shared by all per-resource clients
#[derive(Clone)]
pub struct ArmClient {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ArmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArmClient")
            .field("endpoint", &self.inner.endpoint.as_str())
            .field("scope", &self.inner.scope)
            .finish()
    }
}

impl ArmClient {
    /// Create a client; no request is made until the first call
    pub fn new(
        http: reqwest::Client,
        endpoint: &str,
        credential: Arc<dyn TokenCredential>,
        scope: impl Into<String>,
    ) -> Result<Self> {
        let endpoint = Url::parse(endpoint)?;
        Ok(Self {
            inner: Arc::new(Inner {
                http,
                endpoint,
                credential,
                scope: scope.into(),
            }),
        })
    }

    /// Build the reqwest client every ARM client shares
    pub fn http_client(user_agent: Option<&str>) -> Result<reqwest::Client> {
        let agent = match user_agent {
            Some(extra) => format!("{} {}", AZSAMPLES_USER_AGENT, extra),
            None => AZSAMPLES_USER_AGENT.to_string(),
        };
        Ok(reqwest::Client::builder().user_agent(agent).build()?)
    }

    pub fn endpoint(&self) -> &Url {
        &self.inner.endpoint
    }

    /// Absolute URL for a spec, including `api-version` and query parameters
    pub fn url_for(&self, spec: &OperationSpec) -> Url {
        let mut url = self.inner.endpoint.clone();
        url.set_path(&spec.path);
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("api-version", spec.api_version);
            for (key, value) in &spec.query {
                pairs.append_pair(key, value);
            }
        }
        url
    }

    /// Issue one request for `spec`; non-success statuses become errors
    pub async fn send(&self, spec: &OperationSpec) -> Result<RawResponse> {
        debug!(method = %spec.method, path = %spec.path, "Submitting ARM request");
        self.execute(spec.method.clone(), self.url_for(spec), spec.body.as_ref())
            .await
    }

    /// GET an absolute URL (poll URLs, `nextLink`s)
    pub async fn get_url(&self, url: Url) -> Result<RawResponse> {
        trace!(url = %url, "GET");
        self.execute(Method::GET, url, None).await
    }

    async fn execute(&self, method: Method, url: Url, body: Option<&Value>) -> Result<RawResponse> {
        let token = self.inner.credential.get_token(&self.inner.scope).await?;

        let mut request = self
            .inner
            .http
            .request(method, url)
            .header(AUTHORIZATION, format!("Bearer {}", token.token));
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.bytes().await?;
        trace!(status = status.as_u16(), bytes = bytes.len(), "ARM response");

        if !status.is_success() {
            return Err(CoreError::from_service_response(status.as_u16(), &bytes));
        }

        let body = if bytes.iter().all(u8::is_ascii_whitespace) {
            None
        } else {
            Some(serde_json::from_slice(&bytes)?)
        };

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }

    /// Submit a long-running operation and return its handle without waiting
    pub async fn begin(&self, spec: &OperationSpec) -> Result<Poller> {
        let response = self.send(spec).await?;
        Poller::from_response(self.clone(), spec, response)
    }

    /// Submit `spec` and, for long-running operations, wait for a terminal state
    pub async fn invoke(&self, spec: &OperationSpec, opts: &PollOptions) -> Result<Completion> {
        let body = match spec.kind {
            OperationKind::Sync => self.send(spec).await?.body,
            OperationKind::LongRunning => self.begin(spec).await?.wait(opts).await?,
        };

        Ok(Completion {
            path: spec.path.clone(),
            body,
        })
    }

    /// Single synchronous call returning the payload (`Value::Null` when empty)
    pub async fn fetch(&self, spec: &OperationSpec) -> Result<Value> {
        Ok(self.send(spec).await?.body.unwrap_or(Value::Null))
    }

    /// Lazy page sequence starting at `spec`
    pub fn pager(&self, spec: OperationSpec) -> Pager {
        Pager::new(self.clone(), spec)
    }
}
