//! Scale set rolling upgrades

use serde_json::Value;

use super::{API_VERSION, group_path};
use crate::client::{ArmClient, OperationSpec};
use crate::error::Result;
use crate::progress::PollOptions;
use crate::resource::ResourcePath;

/// Rolling OS and extension upgrades of a scale set
#[derive(Debug, Clone)]
pub struct RollingUpgradesClient {
    client: ArmClient,
    subscription_id: String,
}

impl RollingUpgradesClient {
    pub fn new(client: ArmClient, subscription_id: &str) -> Self {
        Self {
            client,
            subscription_id: subscription_id.to_string(),
        }
    }

    fn scale_set_path(&self, resource_group: &str, scale_set: &str) -> ResourcePath {
        group_path(&self.subscription_id, resource_group)
            .child("virtualMachineScaleSets", scale_set)
    }

    /// Upgrade every instance to the latest platform image, in batches
    pub async fn start_os_upgrade(
        &self,
        resource_group: &str,
        scale_set: &str,
        opts: &PollOptions,
    ) -> Result<()> {
        let path = self
            .scale_set_path(resource_group, scale_set)
            .literal("osRollingUpgrade");
        self.post(path, opts).await
    }

    /// Roll the latest extension versions out to every instance
    pub async fn start_extension_upgrade(
        &self,
        resource_group: &str,
        scale_set: &str,
        opts: &PollOptions,
    ) -> Result<()> {
        let path = self
            .scale_set_path(resource_group, scale_set)
            .literal("extensionRollingUpgrade");
        self.post(path, opts).await
    }

    /// Cancel the rolling upgrade in progress
    pub async fn cancel(
        &self,
        resource_group: &str,
        scale_set: &str,
        opts: &PollOptions,
    ) -> Result<()> {
        let path = self
            .scale_set_path(resource_group, scale_set)
            .literal("rollingUpgrades")
            .literal("cancel");
        self.post(path, opts).await
    }

    /// Status of the latest rolling upgrade
    pub async fn get_latest(&self, resource_group: &str, scale_set: &str) -> Result<Value> {
        let spec = OperationSpec::get(
            self.scale_set_path(resource_group, scale_set)
                .literal("rollingUpgrades")
                .literal("latest"),
            API_VERSION,
        );
        self.client.fetch(&spec).await
    }

    async fn post(&self, path: ResourcePath, opts: &PollOptions) -> Result<()> {
        let spec = OperationSpec::post(path, API_VERSION).long_running();
        self.client.invoke(&spec, opts).await?;
        Ok(())
    }
}
