//! Configuration file management
//!
//! Profiles are stored in TOML. Each profile names a subscription, the
//! default resource group and location, the Azure cloud to talk to, and
//! either service principal or static token credentials.
//!
//! ```toml
//! default_profile = "dev"
//!
//! [profiles.dev]
//! subscription_id = "${AZURE_SUBSCRIPTION_ID}"
//! resource_group = "samples-rg"
//! location = "westus2"
//! tenant_id = "00000000-0000-0000-0000-000000000000"
//! client_id = "11111111-1111-1111-1111-111111111111"
//! client_secret = "keyring:samples-sp"
//!
//! [profiles.dev.poll]
//! interval_secs = 15
//! timeout_secs = 1800
//! ```

#[cfg(target_os = "macos")]
use directories::BaseDirs;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::credential::CredentialStore;
use super::error::{ConfigError, Result};
use super::poll::PollConfig;
use super::settings::CredentialSource;

/// Location used when neither the profile nor the environment names one
pub const DEFAULT_LOCATION: &str = "westus2";

/// Main configuration structure
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Config {
    /// Profile used when none is named explicitly
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,
    /// Map of profile name -> profile configuration
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

/// Individual profile configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Profile {
    /// Subscription every client built from this profile is bound to
    pub subscription_id: String,
    /// Default resource group for samples
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group: Option<String>,
    /// Default location for new resources
    #[serde(default = "default_location")]
    pub location: String,
    /// Which Azure cloud to talk to
    #[serde(default)]
    pub cloud: CloudEnvironment,
    /// Credentials (flattened into the profile)
    #[serde(flatten)]
    pub credentials: ProfileCredentials,
    /// Long-running operation polling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll: Option<PollConfig>,
    /// Extra user agent fragment appended to every request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

/// Credentials a profile can carry
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(untagged)]
pub enum ProfileCredentials {
    /// Service principal with a client secret
    ClientSecret {
        tenant_id: String,
        client_id: String,
        client_secret: String,
    },
    /// Pre-acquired bearer token
    AccessToken { access_token: String },
}

/// Azure clouds with their management and login endpoints
#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum CloudEnvironment {
    #[default]
    Public,
    China,
    #[value(name = "usgovernment")]
    UsGovernment,
}

impl CloudEnvironment {
    /// Base URL of Azure Resource Manager
    pub fn resource_manager_endpoint(&self) -> &'static str {
        match self {
            CloudEnvironment::Public => "https://management.azure.com",
            CloudEnvironment::China => "https://management.chinacloudapi.cn",
            CloudEnvironment::UsGovernment => "https://management.usgovcloudapi.net",
        }
    }

    /// Base URL of the Microsoft Entra token endpoint
    pub fn authority_host(&self) -> &'static str {
        match self {
            CloudEnvironment::Public => "https://login.microsoftonline.com",
            CloudEnvironment::China => "https://login.chinacloudapi.cn",
            CloudEnvironment::UsGovernment => "https://login.microsoftonline.us",
        }
    }

    /// OAuth scope for management-plane tokens
    pub fn token_scope(&self) -> String {
        format!("{}/.default", self.resource_manager_endpoint())
    }
}

impl fmt::Display for CloudEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloudEnvironment::Public => write!(f, "public"),
            CloudEnvironment::China => write!(f, "china"),
            CloudEnvironment::UsGovernment => write!(f, "usgovernment"),
        }
    }
}

impl FromStr for CloudEnvironment {
    type Err = ConfigError;

    /// Accepts both the short names and the SDK-style `AzurePublicCloud` names
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "public" | "azurepubliccloud" | "azurecloud" => Ok(CloudEnvironment::Public),
            "china" | "azurechinacloud" => Ok(CloudEnvironment::China),
            "usgovernment" | "azureusgovernmentcloud" | "azureusgovernment" => {
                Ok(CloudEnvironment::UsGovernment)
            }
            other => Err(ConfigError::InvalidSetting {
                name: "cloud".to_string(),
                message: format!("unknown Azure cloud '{}'", other),
            }),
        }
    }
}

fn default_location() -> String {
    DEFAULT_LOCATION.to_string()
}

impl Profile {
    /// Create a profile with required fields
    pub fn new(subscription_id: impl Into<String>, credentials: ProfileCredentials) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group: None,
            location: default_location(),
            cloud: CloudEnvironment::default(),
            credentials,
            poll: None,
            user_agent: None,
        }
    }

    /// Resolve credentials (with keyring and environment support)
    pub fn resolve_credentials(&self) -> Result<CredentialSource> {
        let store = CredentialStore::new();

        match &self.credentials {
            ProfileCredentials::ClientSecret {
                tenant_id,
                client_id,
                client_secret,
            } => {
                let tenant_id = store
                    .get_credential(tenant_id, Some("AZURE_TENANT_ID"))
                    .map_err(|e| {
                        ConfigError::CredentialError(format!("Failed to resolve tenant id: {}", e))
                    })?;
                let client_id = store
                    .get_credential(client_id, Some("AZURE_CLIENT_ID"))
                    .map_err(|e| {
                        ConfigError::CredentialError(format!("Failed to resolve client id: {}", e))
                    })?;
                let client_secret = store
                    .get_credential(client_secret, Some("AZURE_CLIENT_SECRET"))
                    .map_err(|e| {
                        ConfigError::CredentialError(format!(
                            "Failed to resolve client secret: {}",
                            e
                        ))
                    })?;

                Ok(CredentialSource::ClientSecret {
                    tenant_id,
                    client_id,
                    client_secret,
                })
            }
            ProfileCredentials::AccessToken { access_token } => {
                let token = store
                    .get_credential(access_token, Some("AZURE_ACCESS_TOKEN"))
                    .map_err(|e| {
                        ConfigError::CredentialError(format!(
                            "Failed to resolve access token: {}",
                            e
                        ))
                    })?;
                Ok(CredentialSource::AccessToken(token))
            }
        }
    }
}

impl Config {
    /// Resolve which profile to use
    ///
    /// Order: explicit name, `default_profile`, then the alphabetically first
    /// profile.
    pub fn resolve_profile(&self, explicit_profile: Option<&str>) -> Result<String> {
        if let Some(profile_name) = explicit_profile {
            if !self.profiles.contains_key(profile_name) {
                return Err(ConfigError::ProfileNotFound {
                    name: profile_name.to_string(),
                });
            }
            return Ok(profile_name.to_string());
        }

        if let Some(ref default) = self.default_profile {
            return Ok(default.clone());
        }

        self.list_profiles()
            .first()
            .map(|(name, _)| (*name).clone())
            .ok_or_else(|| ConfigError::NoProfiles {
                suggestion: format!(
                    "Add a [profiles.<name>] table to {} or set AZURE_* environment variables.",
                    Self::config_path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|_| "the config file".to_string())
                ),
            })
    }

    /// Load configuration from the standard location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    ///
    /// A missing file yields an empty configuration.
    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::LoadError {
            path: config_path.display().to_string(),
            source: e,
        })?;

        let expanded_content = Self::expand_env_vars(&content);

        let config: Config = toml::from_str(&expanded_content)?;

        Ok(config)
    }

    /// Save configuration to the standard location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to_path(&config_path)
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::SaveError {
                path: parent.display().to_string(),
                source: e,
            })?;
        }

        let content = toml::to_string_pretty(self)?;

        fs::write(config_path, content).map_err(|e| ConfigError::SaveError {
            path: config_path.display().to_string(),
            source: e,
        })?;

        Ok(())
    }

    /// Set or update a profile
    pub fn set_profile(&mut self, name: String, profile: Profile) {
        self.profiles.insert(name, profile);
    }

    /// Remove a profile by name, clearing the default if it pointed there
    pub fn remove_profile(&mut self, name: &str) -> Option<Profile> {
        if self.default_profile.as_deref() == Some(name) {
            self.default_profile = None;
        }
        self.profiles.remove(name)
    }

    /// List all profiles sorted by name
    pub fn list_profiles(&self) -> Vec<(&String, &Profile)> {
        let mut profiles: Vec<_> = self.profiles.iter().collect();
        profiles.sort_by_key(|(name, _)| *name);
        profiles
    }

    /// Get the path to the configuration file
    ///
    /// On macOS `~/.config/azsamples/config.toml` wins when it (or its
    /// directory) exists; otherwise the platform config dir is used.
    pub fn config_path() -> Result<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            if let Some(base_dirs) = BaseDirs::new() {
                let linux_style_path = base_dirs
                    .home_dir()
                    .join(".config")
                    .join("azsamples")
                    .join("config.toml");

                if linux_style_path.exists()
                    || linux_style_path
                        .parent()
                        .map(|p| p.exists())
                        .unwrap_or(false)
                {
                    return Ok(linux_style_path);
                }
            }
        }

        let proj_dirs =
            ProjectDirs::from("com", "azsamples", "azsamples").ok_or(ConfigError::ConfigDirError)?;

        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Expand `${VAR}` and `${VAR:-default}` references
    ///
    /// Unset variables are left as-is so profiles that are never used do not
    /// need their variables defined.
    fn expand_env_vars(content: &str) -> String {
        shellexpand::env_with_context_no_errors(content, |var| std::env::var(var).ok()).to_string()
    }
}
