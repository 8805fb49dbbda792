//! Progress tracking and polling for long-running ARM operations
//!
//! A long-running call answers with a poll location instead of a final
//! result. [`Poller`] follows that location with a fixed interval until the
//! operation succeeds, fails, the policy's timeout elapses, or the caller's
//! [`CancellationToken`] fires:
//!
//! ```text
//! Submitted -> Polling -> { Succeeded | Failed | Canceled }
//! ```
//!
//! Poll locations follow the ARM rules: `Azure-AsyncOperation` first, then
//! `Location`, then the resource's own `provisioningState`.
//!
//! # Example
//!
//! ```rust,ignore
//! use azsamples_core::{PollOptions, PollPolicy, ProgressEvent};
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! let cancel = CancellationToken::new();
//! let opts = PollOptions::new(PollPolicy::new(Duration::from_secs(10)))
//!     .with_cancel(cancel.clone())
//!     .with_progress(Arc::new(|event| {
//!         if let ProgressEvent::Polling { status, elapsed, .. } = event {
//!             println!("{} ({:.0}s)", status, elapsed.as_secs());
//!         }
//!     }));
//!
//! let id = vms.create_or_update("rg", "vm-1", &params, &opts).await?;
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::{Method, StatusCode};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::client::{ArmClient, OperationSpec, RawResponse};
use crate::error::{CoreError, ErrorDetail, Result};

/// Interval between status checks when none is configured
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

const HEADER_ASYNC_OPERATION: &str = "azure-asyncoperation";
const HEADER_LOCATION: &str = "location";

/// How often to poll and for how long
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// Give up with [`CoreError::PollTimeout`] after this long (unbounded when `None`)
    pub timeout: Option<Duration>,
}

impl PollPolicy {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

/// Progress events emitted while waiting
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// The operation was accepted and polling begins
    Started { operation: String },
    /// One status check with the status the service reported
    Polling {
        operation: String,
        status: String,
        elapsed: Duration,
    },
    /// The operation succeeded
    Completed { operation: String },
    /// The operation failed, timed out, or the wait was canceled
    Failed { operation: String, error: String },
}

/// Callback type for progress updates
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Per-call wait options for long-running wrappers
#[derive(Clone, Default)]
pub struct PollOptions {
    pub policy: PollPolicy,
    pub cancel: CancellationToken,
    pub on_progress: Option<ProgressCallback>,
}

impl std::fmt::Debug for PollOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollOptions")
            .field("policy", &self.policy)
            .field("cancelled", &self.cancel.is_cancelled())
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

impl PollOptions {
    #[must_use]
    pub fn new(policy: PollPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[must_use]
    pub fn with_progress(mut self, on_progress: ProgressCallback) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(cb) = &self.on_progress {
            cb(event);
        }
    }
}

/// Status reported by an operation or a resource's `provisioningState`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationStatus {
    InProgress(String),
    Succeeded,
    Failed,
    Canceled,
}

impl OperationStatus {
    /// Case-insensitive; anything unrecognised counts as still running
    pub fn parse(status: &str) -> Self {
        match status.to_ascii_lowercase().as_str() {
            "succeeded" => OperationStatus::Succeeded,
            "failed" => OperationStatus::Failed,
            "canceled" | "cancelled" => OperationStatus::Canceled,
            _ => OperationStatus::InProgress(status.to_string()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, OperationStatus::InProgress(_))
    }
}

/// Result of one status check
#[derive(Debug, Clone)]
pub enum PollState {
    Pending(String),
    Done(Option<Value>),
}

#[derive(Debug, Clone)]
enum Strategy {
    AsyncOperation {
        url: Url,
        final_location: Option<Url>,
    },
    Location {
        url: Url,
    },
    ProvisioningState {
        url: Url,
    },
    Done(Option<Value>),
    Failed(TerminalFailure),
}

// `CoreError` is not `Clone`; the terminal failure is kept as its parts.
#[derive(Debug, Clone)]
struct TerminalFailure {
    status: String,
    code: String,
    message: String,
}

impl From<TerminalFailure> for CoreError {
    fn from(e: TerminalFailure) -> Self {
        CoreError::OperationFailed {
            status: e.status,
            code: e.code,
            message: e.message,
        }
    }
}

/// Handle for one in-flight long-running operation
#[derive(Debug)]
pub struct Poller {
    client: ArmClient,
    method: Method,
    resource_url: Url,
    path: String,
    strategy: Strategy,
}

impl Poller {
    /// Inspect the submission response and pick how to follow the operation
    pub fn from_response(
        client: ArmClient,
        spec: &OperationSpec,
        response: RawResponse,
    ) -> Result<Self> {
        let mut resource = spec.clone();
        resource.query.clear();
        let resource_url = client.url_for(&resource);

        let async_operation = response
            .header(HEADER_ASYNC_OPERATION)
            .map(Url::parse)
            .transpose()?;
        let location = response
            .header(HEADER_LOCATION)
            .map(Url::parse)
            .transpose()?;

        let strategy = if let Some(url) = async_operation {
            Strategy::AsyncOperation {
                url,
                final_location: location,
            }
        } else if let Some(url) = location {
            Strategy::Location { url }
        } else if spec.method == Method::DELETE {
            Strategy::Done(None)
        } else {
            match provisioning_state(response.body.as_ref()) {
                Some(OperationStatus::Succeeded) | None => Strategy::Done(response.body),
                Some(OperationStatus::InProgress(_)) => Strategy::ProvisioningState {
                    url: resource_url.clone(),
                },
                Some(status) => Strategy::Failed(failure(
                    &status,
                    response.body.as_ref().and_then(|b| b.get("properties")),
                )),
            }
        };
        debug!(
            path = %spec.path,
            strategy = strategy_name(&strategy),
            "Long-running operation accepted"
        );

        Ok(Self {
            client,
            method: spec.method.clone(),
            resource_url,
            path: spec.path.clone(),
            strategy,
        })
    }

    /// True once the operation needs no further polling
    pub fn is_done(&self) -> bool {
        matches!(self.strategy, Strategy::Done(_) | Strategy::Failed(_))
    }

    /// Check the operation status once
    pub async fn poll(&mut self) -> Result<PollState> {
        match self.strategy.clone() {
            Strategy::Done(body) => Ok(PollState::Done(body)),
            Strategy::Failed(failure) => Err(failure.into()),
            Strategy::AsyncOperation {
                url,
                final_location,
            } => {
                let response = self.client.get_url(url).await?;
                let body = response.body.unwrap_or(Value::Null);
                let raw_status = body
                    .get("status")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        CoreError::InvalidResponse(
                            "operation status response has no 'status' field".to_string(),
                        )
                    })?;

                match OperationStatus::parse(raw_status) {
                    OperationStatus::InProgress(status) => Ok(PollState::Pending(status)),
                    OperationStatus::Succeeded => {
                        let result = self.final_result(final_location, &body).await?;
                        self.finish(result)
                    }
                    status => self.fail(failure(&status, Some(&body))),
                }
            }
            Strategy::Location { url } => {
                let response = self.client.get_url(url).await?;
                if response.status == StatusCode::ACCEPTED {
                    return Ok(PollState::Pending("InProgress".to_string()));
                }
                let result = match self.method {
                    Method::PUT | Method::PATCH => self.fetch_resource().await?,
                    Method::DELETE => None,
                    _ => response.body,
                };
                self.finish(result)
            }
            Strategy::ProvisioningState { url } => {
                let response = self.client.get_url(url).await?;
                match provisioning_state(response.body.as_ref()) {
                    Some(OperationStatus::InProgress(status)) => Ok(PollState::Pending(status)),
                    Some(OperationStatus::Succeeded) | None => self.finish(response.body),
                    Some(status) => self.fail(failure(
                        &status,
                        response.body.as_ref().and_then(|b| b.get("properties")),
                    )),
                }
            }
        }
    }

    /// Wait until a terminal state, the policy timeout, or cancellation
    ///
    /// Returns the final payload, if the operation produced one. The timeout
    /// bounds the whole wait, including a poll request that is still in flight.
    /// An operation that finished at submission is returned as is, even when
    /// the token has already fired.
    pub async fn wait(mut self, opts: &PollOptions) -> Result<Option<Value>> {
        let operation = self.path.clone();
        let start = Instant::now();
        let deadline = opts
            .policy
            .timeout
            .map(|timeout| (tokio::time::Instant::now() + timeout, timeout));
        opts.emit(ProgressEvent::Started {
            operation: operation.clone(),
        });

        loop {
            let state = if self.is_done() {
                self.poll().await
            } else {
                let interval = opts.policy.interval;
                tokio::select! {
                    biased;
                    _ = opts.cancel.cancelled() => Err(CoreError::Canceled),
                    timeout = expired(deadline) => Err(CoreError::PollTimeout(timeout)),
                    state = async {
                        tokio::time::sleep(interval).await;
                        self.poll().await
                    } => state,
                }
            };

            match state {
                Ok(PollState::Done(body)) => {
                    info!(
                        operation = %operation,
                        elapsed = ?start.elapsed(),
                        "Operation succeeded"
                    );
                    opts.emit(ProgressEvent::Completed {
                        operation: operation.clone(),
                    });
                    return Ok(body);
                }
                Ok(PollState::Pending(status)) => {
                    let elapsed = start.elapsed();
                    debug!(
                        operation = %operation,
                        status = %status,
                        ?elapsed,
                        "Operation in progress"
                    );
                    opts.emit(ProgressEvent::Polling {
                        operation: operation.clone(),
                        status,
                        elapsed,
                    });
                }
                Err(e) => return Err(self.stopped(opts, &operation, e)),
            }
        }
    }

    fn stopped(&self, opts: &PollOptions, operation: &str, error: CoreError) -> CoreError {
        warn!(operation = %operation, error = %error, "Operation wait ended without success");
        opts.emit(ProgressEvent::Failed {
            operation: operation.to_string(),
            error: error.to_string(),
        });
        error
    }

    fn finish(&mut self, body: Option<Value>) -> Result<PollState> {
        let body = if self.method == Method::DELETE {
            None
        } else {
            body
        };
        self.strategy = Strategy::Done(body.clone());
        Ok(PollState::Done(body))
    }

    fn fail(&mut self, failure: TerminalFailure) -> Result<PollState> {
        self.strategy = Strategy::Failed(failure.clone());
        Err(failure.into())
    }

    async fn fetch_resource(&self) -> Result<Option<Value>> {
        Ok(self.client.get_url(self.resource_url.clone()).await?.body)
    }

    async fn final_result(
        &self,
        final_location: Option<Url>,
        operation_body: &Value,
    ) -> Result<Option<Value>> {
        match self.method {
            Method::PUT | Method::PATCH => self.fetch_resource().await,
            Method::DELETE => Ok(None),
            _ => match final_location {
                Some(url) => Ok(self.client.get_url(url).await?.body),
                None => Ok(operation_body
                    .get("properties")
                    .and_then(|p| p.get("output"))
                    .cloned()),
            },
        }
    }
}

/// Resolves with the timeout once the deadline passes; never without one
async fn expired(deadline: Option<(tokio::time::Instant, Duration)>) -> Duration {
    match deadline {
        Some((at, timeout)) => {
            tokio::time::sleep_until(at).await;
            timeout
        }
        None => std::future::pending().await,
    }
}

fn provisioning_state(body: Option<&Value>) -> Option<OperationStatus> {
    body?
        .get("properties")?
        .get("provisioningState")?
        .as_str()
        .map(OperationStatus::parse)
}

fn failure(status: &OperationStatus, body: Option<&Value>) -> TerminalFailure {
    let status = match status {
        OperationStatus::Canceled => "Canceled",
        _ => "Failed",
    }
    .to_string();
    let detail: ErrorDetail = body
        .and_then(|b| b.get("error"))
        .and_then(|e| serde_json::from_value(e.clone()).ok())
        .unwrap_or_default();

    TerminalFailure {
        code: detail.code.unwrap_or_else(|| status.clone()),
        message: detail
            .message
            .unwrap_or_else(|| format!("operation finished with status {}", status)),
        status,
    }
}

fn strategy_name(strategy: &Strategy) -> &'static str {
    match strategy {
        Strategy::AsyncOperation { .. } => "azure-asyncoperation",
        Strategy::Location { .. } => "location",
        Strategy::ProvisioningState { .. } => "provisioning-state",
        Strategy::Done(_) => "done",
        Strategy::Failed(_) => "failed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_parsing() {
        assert_eq!(OperationStatus::parse("Succeeded"), OperationStatus::Succeeded);
        assert_eq!(OperationStatus::parse("FAILED"), OperationStatus::Failed);
        assert_eq!(OperationStatus::parse("Canceled"), OperationStatus::Canceled);
        assert_eq!(OperationStatus::parse("cancelled"), OperationStatus::Canceled);
        assert_eq!(
            OperationStatus::parse("Updating"),
            OperationStatus::InProgress("Updating".to_string())
        );
        assert!(!OperationStatus::parse("InProgress").is_terminal());
        assert!(OperationStatus::parse("succeeded").is_terminal());
    }

    #[test]
    fn test_provisioning_state_extraction() {
        let body = json!({"properties": {"provisioningState": "Creating"}});
        assert_eq!(
            provisioning_state(Some(&body)),
            Some(OperationStatus::InProgress("Creating".to_string()))
        );
        assert_eq!(provisioning_state(Some(&json!({"name": "x"}))), None);
        assert_eq!(provisioning_state(None), None);
    }

    #[test]
    fn test_failure_uses_service_error() {
        let body = json!({
            "status": "Failed",
            "error": {"code": "AllocationFailed", "message": "No capacity"}
        });
        let f = failure(&OperationStatus::Failed, Some(&body));
        assert_eq!(f.status, "Failed");
        assert_eq!(f.code, "AllocationFailed");
        assert_eq!(f.message, "No capacity");

        let f = failure(&OperationStatus::Canceled, None);
        assert_eq!(f.status, "Canceled");
        assert_eq!(f.code, "Canceled");
    }

    #[test]
    fn test_default_policy() {
        let policy = PollPolicy::default();
        assert_eq!(policy.interval, Duration::from_secs(30));
        assert!(policy.timeout.is_none());

        let policy = policy.with_timeout(Duration::from_secs(600));
        assert_eq!(policy.timeout, Some(Duration::from_secs(600)));
    }

    #[test]
    fn test_progress_callback_receives_events() {
        use std::sync::Mutex;

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let opts = PollOptions::default().with_progress(Arc::new(move |event: ProgressEvent| {
            sink.lock().unwrap().push(format!("{:?}", event));
        }));

        opts.emit(ProgressEvent::Started {
            operation: "/p".to_string(),
        });
        assert_eq!(seen.lock().unwrap().len(), 1);
    }
}
