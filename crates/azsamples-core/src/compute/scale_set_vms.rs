use serde_json::Value;

use super::{API_VERSION, group_path};
use crate::client::{ArmClient, OperationSpec};
use crate::error::Result;
use crate::progress::PollOptions;
use crate::resource::ResourcePath;

/// Operations on individual scale set instances
/// (`virtualMachineScaleSets/{scale_set}/virtualMachines/{instance_id}`)
#[derive(Debug, Clone)]
pub struct VirtualMachineScaleSetVMsClient {
    client: ArmClient,
    subscription_id: String,
}

impl VirtualMachineScaleSetVMsClient {
    pub fn new(client: ArmClient, subscription_id: &str) -> Self {
        Self {
            client,
            subscription_id: subscription_id.to_string(),
        }
    }

    fn instances(&self, resource_group: &str, scale_set: &str) -> ResourcePath {
        group_path(&self.subscription_id, resource_group)
            .child("virtualMachineScaleSets", scale_set)
            .literal("virtualMachines")
    }

    fn instance_path(
        &self,
        resource_group: &str,
        scale_set: &str,
        instance_id: &str,
    ) -> ResourcePath {
        self.instances(resource_group, scale_set).segment(instance_id)
    }

    pub async fn get(
        &self,
        resource_group: &str,
        scale_set: &str,
        instance_id: &str,
        expand: Option<&str>,
    ) -> Result<Value> {
        let spec = OperationSpec::get(
            self.instance_path(resource_group, scale_set, instance_id),
            API_VERSION,
        )
        .query_opt("$expand", expand);
        self.client.fetch(&spec).await
    }

    pub async fn get_instance_view(
        &self,
        resource_group: &str,
        scale_set: &str,
        instance_id: &str,
    ) -> Result<Value> {
        let spec = OperationSpec::get(
            self.instance_path(resource_group, scale_set, instance_id)
                .literal("instanceView"),
            API_VERSION,
        );
        self.client.fetch(&spec).await
    }

    /// Replace an instance's model (PUT) and wait for the update
    pub async fn update(
        &self,
        resource_group: &str,
        scale_set: &str,
        instance_id: &str,
        params: &Value,
        opts: &PollOptions,
    ) -> Result<String> {
        let spec = OperationSpec::put(
            self.instance_path(resource_group, scale_set, instance_id),
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
        instance_id: &str,
        opts: &PollOptions,
    ) -> Result<()> {
        let spec = OperationSpec::delete(
            self.instance_path(resource_group, scale_set, instance_id),
            API_VERSION,
        )
        .long_running();
        self.client.invoke(&spec, opts).await?;
        Ok(())
    }

    pub async fn start(
        &self,
        resource_group: &str,
        scale_set: &str,
        instance_id: &str,
        opts: &PollOptions,
    ) -> Result<()> {
        self.action(resource_group, scale_set, instance_id, "start", None, opts)
            .await
    }

    pub async fn power_off(
        &self,
        resource_group: &str,
        scale_set: &str,
        instance_id: &str,
        opts: &PollOptions,
    ) -> Result<()> {
        self.action(resource_group, scale_set, instance_id, "poweroff", None, opts)
            .await
    }

    pub async fn restart(
        &self,
        resource_group: &str,
        scale_set: &str,
        instance_id: &str,
        opts: &PollOptions,
    ) -> Result<()> {
        self.action(resource_group, scale_set, instance_id, "restart", None, opts)
            .await
    }

    pub async fn deallocate(
        &self,
        resource_group: &str,
        scale_set: &str,
        instance_id: &str,
        opts: &PollOptions,
    ) -> Result<()> {
        self.action(resource_group, scale_set, instance_id, "deallocate", None, opts)
            .await
    }

    pub async fn reimage(
        &self,
        resource_group: &str,
        scale_set: &str,
        instance_id: &str,
        params: Option<&Value>,
        opts: &PollOptions,
    ) -> Result<()> {
        self.action(resource_group, scale_set, instance_id, "reimage", params, opts)
            .await
    }

    /// Run a script on one instance and return the command output
    pub async fn run_command(
        &self,
        resource_group: &str,
        scale_set: &str,
        instance_id: &str,
        params: &Value,
        opts: &PollOptions,
    ) -> Result<Value> {
        let spec = OperationSpec::post(
            self.instance_path(resource_group, scale_set, instance_id)
                .literal("runCommand"),
            API_VERSION,
        )
        .body(params)
        .long_running();
        Ok(self.client.invoke(&spec, opts).await?.into_body())
    }

    /// Instances of a scale set, optionally filtered with `$filter`
    pub async fn list(
        &self,
        resource_group: &str,
        scale_set: &str,
        filter: Option<&str>,
    ) -> Result<Vec<Value>> {
        let spec = OperationSpec::get(self.instances(resource_group, scale_set), API_VERSION)
            .query_opt("$filter", filter);
        self.client.pager(spec).collect_all().await
    }

    async fn action(
        &self,
        resource_group: &str,
        scale_set: &str,
        instance_id: &str,
        action: &str,
        body: Option<&Value>,
        opts: &PollOptions,
    ) -> Result<()> {
        let spec = OperationSpec::post(
            self.instance_path(resource_group, scale_set, instance_id)
                .literal(action),
            API_VERSION,
        )
        .body_opt(body)
        .long_running();
        self.client.invoke(&spec, opts).await?;
        Ok(())
    }
}
