//! Fake Resource Manager endpoint shared by the integration tests

#![allow(dead_code)]

use std::time::Duration;

use azsamples_core::{ClientFactory, CredentialSource, PollOptions, PollPolicy, Settings};
use serde_json::Value;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const SUBSCRIPTION: &str = "00000000-0000-0000-0000-000000000001";
pub const RESOURCE_GROUP: &str = "samples-rg";
pub const TOKEN: &str = "test-token";

pub struct MockArm {
    pub server: MockServer,
}

impl MockArm {
    pub async fn start() -> Self {
        init_tracing();
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Absolute URL on the fake endpoint
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.server.uri(), path)
    }

    pub fn settings(&self) -> Settings {
        Settings::new(SUBSCRIPTION, CredentialSource::AccessToken(TOKEN.to_string()))
            .with_resource_group(RESOURCE_GROUP)
            .with_endpoint(self.server.uri())
            .with_poll_policy(fast_policy())
    }

    pub fn factory(&self) -> ClientFactory {
        ClientFactory::new(&self.settings()).expect("factory")
    }

    /// Respond to `verb path` with `status` and a JSON body
    pub async fn respond(&self, verb: &str, route: &str, status: u16, body: Value) {
        Mock::given(method(verb))
            .and(path(route))
            .and(header("authorization", format!("Bearer {}", TOKEN).as_str()))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Respond to the next `times` matching requests only
    pub async fn respond_times(
        &self,
        verb: &str,
        route: &str,
        times: u64,
        response: ResponseTemplate,
    ) {
        Mock::given(method(verb))
            .and(path(route))
            .respond_with(response)
            .up_to_n_times(times)
            .mount(&self.server)
            .await;
    }

    /// Number of requests the server saw for `verb path`
    pub async fn count(&self, verb: &str, route: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.method.as_str() == verb && r.url.path() == route)
            .count()
    }
}

/// Route library logs through the test harness; `RUST_LOG=azsamples_core=debug` to see them
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn fast_policy() -> PollPolicy {
    PollPolicy::new(Duration::from_millis(10))
}

pub fn fast_options() -> PollOptions {
    PollOptions::new(fast_policy())
}

pub fn compute_path(suffix: &str) -> String {
    format!(
        "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Compute/{}",
        SUBSCRIPTION, RESOURCE_GROUP, suffix
    )
}

pub fn storage_path(suffix: &str) -> String {
    format!(
        "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Storage/{}",
        SUBSCRIPTION, RESOURCE_GROUP, suffix
    )
}

pub fn async_operation(url: &str) -> ResponseTemplate {
    ResponseTemplate::new(201).insert_header("Azure-AsyncOperation", url)
}

pub fn operation_status(status: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({ "status": status }))
}
