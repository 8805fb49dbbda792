//! Virtual machine scale sets
//!
//! Power actions accept an optional `{"instanceIds": [...]}` body; without
//! one they apply to every instance in the scale set.

use serde_json::{Value, json};

use super::{API_VERSION, group_path, subscription_path};
use crate::client::{ArmClient, OperationSpec};
use crate::error::Result;
use crate::progress::PollOptions;
use crate::resource::ResourcePath;

/// Operations on `Microsoft.Compute/virtualMachineScaleSets`
#[derive(Debug, Clone)]
pub struct VirtualMachineScaleSetsClient {
    client: ArmClient,
    subscription_id: String,
}

impl VirtualMachineScaleSetsClient {
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

    /// Create or replace a scale set and wait for provisioning
    pub async fn create_or_update(
        &self,
        resource_group: &str,
        scale_set: &str,
        params: &Value,
        opts: &PollOptions,
    ) -> Result<String> {
        let spec = OperationSpec::put(
            self.scale_set_path(resource_group, scale_set),
            API_VERSION,
            params,
        )
        .long_running();
        Ok(self.client.invoke(&spec, opts).await?.resource_id())
    }

    pub async fn get(
        &self,
        resource_group: &str,
        scale_set: &str,
        expand: Option<&str>,
    ) -> Result<Value> {
        let spec = OperationSpec::get(self.scale_set_path(resource_group, scale_set), API_VERSION)
            .query_opt("$expand", expand);
        self.client.fetch(&spec).await
    }

    pub async fn update(
        &self,
        resource_group: &str,
        scale_set: &str,
        params: &Value,
        opts: &PollOptions,
    ) -> Result<String> {
        let spec = OperationSpec::patch(
            self.scale_set_path(resource_group, scale_set),
            API_VERSION,
            params,
        )
        .long_running();
        Ok(self.client.invoke(&spec, opts).await?.resource_id())
    }

    pub async fn delete(
        &self,
        resource_group: &str,
        scale_set: &str,
        opts: &PollOptions,
    ) -> Result<()> {
        let spec =
            OperationSpec::delete(self.scale_set_path(resource_group, scale_set), API_VERSION)
                .long_running();
        self.client.invoke(&spec, opts).await?;
        Ok(())
    }

    pub async fn start(
        &self,
        resource_group: &str,
        scale_set: &str,
        instance_ids: Option<&Value>,
        opts: &PollOptions,
    ) -> Result<()> {
        self.action(resource_group, scale_set, "start", instance_ids, opts)
            .await
    }

    pub async fn power_off(
        &self,
        resource_group: &str,
        scale_set: &str,
        instance_ids: Option<&Value>,
        opts: &PollOptions,
    ) -> Result<()> {
        self.action(resource_group, scale_set, "poweroff", instance_ids, opts)
            .await
    }

    pub async fn restart(
        &self,
        resource_group: &str,
        scale_set: &str,
        instance_ids: Option<&Value>,
        opts: &PollOptions,
    ) -> Result<()> {
        self.action(resource_group, scale_set, "restart", instance_ids, opts)
            .await
    }

    pub async fn deallocate(
        &self,
        resource_group: &str,
        scale_set: &str,
        instance_ids: Option<&Value>,
        opts: &PollOptions,
    ) -> Result<()> {
        self.action(resource_group, scale_set, "deallocate", instance_ids, opts)
            .await
    }

    /// Reimage instances; `params` is a `VirtualMachineScaleSetReimageParameters` body
    pub async fn reimage(
        &self,
        resource_group: &str,
        scale_set: &str,
        params: Option<&Value>,
        opts: &PollOptions,
    ) -> Result<()> {
        self.action(resource_group, scale_set, "reimage", params, opts)
            .await
    }

    /// Bring the given instances up to the latest scale set model
    pub async fn update_instances(
        &self,
        resource_group: &str,
        scale_set: &str,
        instance_ids: &[&str],
        opts: &PollOptions,
    ) -> Result<()> {
        let body = json!({ "instanceIds": instance_ids });
        self.action(resource_group, scale_set, "manualupgrade", Some(&body), opts)
            .await
    }

    pub async fn get_instance_view(&self, resource_group: &str, scale_set: &str) -> Result<Value> {
        let spec = OperationSpec::get(
            self.scale_set_path(resource_group, scale_set).literal("instanceView"),
            API_VERSION,
        );
        self.client.fetch(&spec).await
    }

    /// All scale sets in a resource group
    pub async fn list(&self, resource_group: &str) -> Result<Vec<Value>> {
        let spec = OperationSpec::get(
            group_path(&self.subscription_id, resource_group).literal("virtualMachineScaleSets"),
            API_VERSION,
        );
        self.client.pager(spec).collect_all().await
    }

    /// All scale sets in the subscription
    pub async fn list_all(&self) -> Result<Vec<Value>> {
        let spec = OperationSpec::get(
            subscription_path(&self.subscription_id).literal("virtualMachineScaleSets"),
            API_VERSION,
        );
        self.client.pager(spec).collect_all().await
    }

    /// SKUs the scale set can be scaled to
    pub async fn list_skus(&self, resource_group: &str, scale_set: &str) -> Result<Vec<Value>> {
        let spec = OperationSpec::get(
            self.scale_set_path(resource_group, scale_set).literal("skus"),
            API_VERSION,
        );
        self.client.pager(spec).collect_all().await
    }

    async fn action(
        &self,
        resource_group: &str,
        scale_set: &str,
        action: &str,
        body: Option<&Value>,
        opts: &PollOptions,
    ) -> Result<()> {
        let spec = OperationSpec::post(
            self.scale_set_path(resource_group, scale_set).literal(action),
            API_VERSION,
        )
        .body_opt(body)
        .long_running();
        self.client.invoke(&spec, opts).await?;
        Ok(())
    }
}
