//! Resolved settings handed to the client factory
//!
//! [`Settings`] replaces process-wide configuration: every value a wrapper
//! needs is carried explicitly and nothing here aborts the process.

use std::env;
use std::fmt;

use tracing::{debug, info};

use super::config::{CloudEnvironment, Config, DEFAULT_LOCATION};
use super::credential::CredentialStore;
use super::error::{ConfigError, Result};
use crate::progress::PollPolicy;

pub const ENV_SUBSCRIPTION_ID: &str = "AZURE_SUBSCRIPTION_ID";
pub const ENV_TENANT_ID: &str = "AZURE_TENANT_ID";
pub const ENV_CLIENT_ID: &str = "AZURE_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "AZURE_CLIENT_SECRET";
pub const ENV_ACCESS_TOKEN: &str = "AZURE_ACCESS_TOKEN";
pub const ENV_RESOURCE_GROUP: &str = "AZURE_BASE_GROUP_NAME";
pub const ENV_LOCATION: &str = "AZURE_LOCATION_DEFAULT";
pub const ENV_CLOUD: &str = "AZURE_ENVIRONMENT";

/// Credential material, already resolved from env / keyring / plaintext
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Service principal; a token is requested on first use
    ClientSecret {
        tenant_id: String,
        client_id: String,
        client_secret: String,
    },
    /// Bearer token used as-is
    AccessToken(String),
}

// Secrets stay out of logs and panic messages.
impl fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::ClientSecret {
                tenant_id,
                client_id,
                ..
            } => f
                .debug_struct("ClientSecret")
                .field("tenant_id", tenant_id)
                .field("client_id", client_id)
                .field("client_secret", &"<redacted>")
                .finish(),
            CredentialSource::AccessToken(_) => {
                f.debug_tuple("AccessToken").field(&"<redacted>").finish()
            }
        }
    }
}

/// Everything a [`ClientFactory`](crate::ClientFactory) needs
#[derive(Debug, Clone)]
pub struct Settings {
    pub subscription_id: String,
    pub resource_group: Option<String>,
    pub location: String,
    pub cloud: CloudEnvironment,
    pub credentials: CredentialSource,
    pub poll: PollPolicy,
    pub user_agent: Option<String>,
    /// Overrides the cloud's Resource Manager endpoint
    pub endpoint: Option<String>,
    /// Overrides the cloud's token authority
    pub authority_host: Option<String>,
}

impl Settings {
    /// Create settings with required fields and defaults for the rest
    #[must_use]
    pub fn new(subscription_id: impl Into<String>, credentials: CredentialSource) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group: None,
            location: DEFAULT_LOCATION.to_string(),
            cloud: CloudEnvironment::default(),
            credentials,
            poll: PollPolicy::default(),
            user_agent: None,
            endpoint: None,
            authority_host: None,
        }
    }

    /// Set the default resource group
    #[must_use]
    pub fn with_resource_group(mut self, resource_group: impl Into<String>) -> Self {
        self.resource_group = Some(resource_group.into());
        self
    }

    /// Set the default location
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Set the cloud environment
    #[must_use]
    pub fn with_cloud(mut self, cloud: CloudEnvironment) -> Self {
        self.cloud = cloud;
        self
    }

    /// Set the poll policy for long-running operations
    #[must_use]
    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    /// Append a user agent fragment
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Point the clients at a different Resource Manager endpoint
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Point token requests at a different authority
    #[must_use]
    pub fn with_authority_host(mut self, authority_host: impl Into<String>) -> Self {
        self.authority_host = Some(authority_host.into());
        self
    }

    /// Resource Manager endpoint in effect
    pub fn resource_manager_endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or(self.cloud.resource_manager_endpoint())
    }

    /// Token authority in effect
    pub fn authority(&self) -> &str {
        self.authority_host
            .as_deref()
            .unwrap_or(self.cloud.authority_host())
    }

    /// Default resource group, or an error naming the variable to set
    pub fn resource_group(&self) -> Result<&str> {
        self.resource_group
            .as_deref()
            .ok_or_else(|| ConfigError::MissingSetting {
                name: "resource_group".to_string(),
                env_var: ENV_RESOURCE_GROUP.to_string(),
            })
    }

    /// Build settings purely from `AZURE_*` environment variables
    ///
    /// `AZURE_ACCESS_TOKEN` takes precedence over service principal
    /// variables when both are present.
    pub fn from_env() -> Result<Self> {
        let subscription_id = required_env(ENV_SUBSCRIPTION_ID, "subscription_id")?;

        let credentials = if let Some(token) = optional_env(ENV_ACCESS_TOKEN) {
            debug!("Using {} for authentication", ENV_ACCESS_TOKEN);
            CredentialSource::AccessToken(token)
        } else {
            CredentialSource::ClientSecret {
                tenant_id: required_env(ENV_TENANT_ID, "tenant_id")?,
                client_id: required_env(ENV_CLIENT_ID, "client_id")?,
                client_secret: required_env(ENV_CLIENT_SECRET, "client_secret")?,
            }
        };

        let mut settings = Settings::new(subscription_id, credentials);
        settings.resource_group = optional_env(ENV_RESOURCE_GROUP);
        if let Some(location) = optional_env(ENV_LOCATION) {
            settings.location = location;
        }
        if let Some(cloud) = optional_env(ENV_CLOUD) {
            settings.cloud = cloud.parse()?;
        }

        Ok(settings)
    }

    /// Build settings from a profile with environment variables layered on top
    pub fn resolve(config: &Config, explicit_profile: Option<&str>) -> Result<Self> {
        let name = config.resolve_profile(explicit_profile)?;
        let profile = config
            .profiles
            .get(&name)
            .ok_or_else(|| ConfigError::ProfileNotFound { name: name.clone() })?;
        info!("Using Azure profile: {}", name);

        let store = CredentialStore::new();
        let subscription_id =
            store.get_credential(&profile.subscription_id, Some(ENV_SUBSCRIPTION_ID))?;
        let credentials = profile.resolve_credentials()?;

        let mut settings = Settings::new(subscription_id, credentials);
        settings.resource_group =
            optional_env(ENV_RESOURCE_GROUP).or_else(|| profile.resource_group.clone());
        settings.location = optional_env(ENV_LOCATION).unwrap_or_else(|| profile.location.clone());
        settings.cloud = match optional_env(ENV_CLOUD) {
            Some(cloud) => cloud.parse()?,
            None => profile.cloud,
        };
        if let Some(poll) = &profile.poll {
            settings.poll = PollPolicy::from(poll);
        }
        settings.user_agent = profile.user_agent.clone();

        Ok(settings)
    }
}

fn optional_env(var: &str) -> Option<String> {
    env::var(var).ok().filter(|v| !v.is_empty())
}

fn required_env(var: &str, name: &str) -> Result<String> {
    optional_env(var).ok_or_else(|| ConfigError::MissingSetting {
        name: name.to_string(),
        env_var: var.to_string(),
    })
}
