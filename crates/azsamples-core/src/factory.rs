//! Per-resource client construction
//!
//! A [`ClientFactory`] owns the authenticated [`ArmClient`] and hands out one
//! lightweight client per resource type, all bound to the same subscription.

use std::sync::Arc;

use tracing::debug;

use crate::auth::{TokenCredential, credential_from_source};
use crate::client::ArmClient;
use crate::compute::{
    RollingUpgradesClient, RunCommandsClient, VirtualMachineExtensionsClient,
    VirtualMachineImagesClient, VirtualMachineScaleSetExtensionsClient,
    VirtualMachineScaleSetVMsClient, VirtualMachineScaleSetsClient, VirtualMachinesClient,
};
use crate::config::Settings;
use crate::error::Result;
use crate::progress::PollOptions;
use crate::storage::{BlobContainersClient, StorageAccountsClient};

/// Builds resource clients from resolved [`Settings`]
///
/// Construction validates credential material but performs no network I/O.
#[derive(Debug, Clone)]
pub struct ClientFactory {
    client: ArmClient,
    subscription_id: String,
    location: String,
    resource_group: Option<String>,
    poll: PollOptions,
}

impl ClientFactory {
    /// Create a factory, resolving the credential described by `settings`
    pub fn new(settings: &Settings) -> Result<Self> {
        let http = ArmClient::http_client(settings.user_agent.as_deref())?;
        let credential =
            credential_from_source(&settings.credentials, http.clone(), settings.authority())?;
        Self::build(settings, http, credential)
    }

    /// Create a factory around a caller-provided credential
    pub fn with_credential(
        settings: &Settings,
        credential: Arc<dyn TokenCredential>,
    ) -> Result<Self> {
        let http = ArmClient::http_client(settings.user_agent.as_deref())?;
        Self::build(settings, http, credential)
    }

    fn build(
        settings: &Settings,
        http: reqwest::Client,
        credential: Arc<dyn TokenCredential>,
    ) -> Result<Self> {
        let endpoint = settings.resource_manager_endpoint();
        let client = ArmClient::new(http, endpoint, credential, settings.cloud.token_scope())?;
        debug!(
            endpoint = %endpoint,
            cloud = %settings.cloud,
            subscription = %settings.subscription_id,
            "Client factory ready"
        );

        Ok(Self {
            client,
            subscription_id: settings.subscription_id.clone(),
            location: settings.location.clone(),
            resource_group: settings.resource_group.clone(),
            poll: PollOptions::new(settings.poll),
        })
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    /// Default location from the settings
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Default resource group from the settings, if any
    pub fn resource_group(&self) -> Option<&str> {
        self.resource_group.as_deref()
    }

    /// Wait options built from the configured poll policy
    ///
    /// Clone and attach a cancellation token or progress callback per call.
    pub fn poll_options(&self) -> PollOptions {
        self.poll.clone()
    }

    /// The underlying transport, for calls no wrapper covers
    pub fn arm_client(&self) -> &ArmClient {
        &self.client
    }

    pub fn virtual_machines(&self) -> VirtualMachinesClient {
        VirtualMachinesClient::new(self.client.clone(), &self.subscription_id)
    }

    pub fn virtual_machine_extensions(&self) -> VirtualMachineExtensionsClient {
        VirtualMachineExtensionsClient::new(self.client.clone(), &self.subscription_id)
    }

    pub fn virtual_machine_images(&self) -> VirtualMachineImagesClient {
        VirtualMachineImagesClient::new(self.client.clone(), &self.subscription_id)
    }

    pub fn virtual_machine_scale_sets(&self) -> VirtualMachineScaleSetsClient {
        VirtualMachineScaleSetsClient::new(self.client.clone(), &self.subscription_id)
    }

    pub fn virtual_machine_scale_set_vms(&self) -> VirtualMachineScaleSetVMsClient {
        VirtualMachineScaleSetVMsClient::new(self.client.clone(), &self.subscription_id)
    }

    pub fn virtual_machine_scale_set_extensions(&self) -> VirtualMachineScaleSetExtensionsClient {
        VirtualMachineScaleSetExtensionsClient::new(self.client.clone(), &self.subscription_id)
    }

    pub fn rolling_upgrades(&self) -> RollingUpgradesClient {
        RollingUpgradesClient::new(self.client.clone(), &self.subscription_id)
    }

    pub fn run_commands(&self) -> RunCommandsClient {
        RunCommandsClient::new(self.client.clone(), &self.subscription_id)
    }

    pub fn storage_accounts(&self) -> StorageAccountsClient {
        StorageAccountsClient::new(self.client.clone(), &self.subscription_id)
    }

    pub fn blob_containers(&self) -> BlobContainersClient {
        BlobContainersClient::new(self.client.clone(), &self.subscription_id)
    }
}
