use serde_json::Value;

use super::{API_VERSION, group_path};
use crate::client::{ArmClient, OperationSpec};
use crate::error::Result;
use crate::progress::PollOptions;
use crate::resource::ResourcePath;

/// Operations on `virtualMachineScaleSets/{scale_set}/extensions`
#[derive(Debug, Clone)]
pub struct VirtualMachineScaleSetExtensionsClient {
    client: ArmClient,
    subscription_id: String,
}

impl VirtualMachineScaleSetExtensionsClient {
    pub fn new(client: ArmClient, subscription_id: &str) -> Self {
        Self {
            client,
            subscription_id: subscription_id.to_string(),
        }
    }

    fn collection(&self, resource_group: &str, scale_set: &str) -> ResourcePath {
        group_path(&self.subscription_id, resource_group)
            .child("virtualMachineScaleSets", scale_set)
            .literal("extensions")
    }

    pub async fn create_or_update(
        &self,
        resource_group: &str,
        scale_set: &str,
        extension_name: &str,
        params: &Value,
        opts: &PollOptions,
    ) -> Result<String> {
        let spec = OperationSpec::put(
            self.collection(resource_group, scale_set).segment(extension_name),
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
        extension_name: &str,
        expand: Option<&str>,
    ) -> Result<Value> {
        let spec = OperationSpec::get(
            self.collection(resource_group, scale_set).segment(extension_name),
            API_VERSION,
        )
        .query_opt("$expand", expand);
        self.client.fetch(&spec).await
    }

    pub async fn update(
        &self,
        resource_group: &str,
        scale_set: &str,
        extension_name: &str,
        params: &Value,
        opts: &PollOptions,
    ) -> Result<String> {
        let spec = OperationSpec::patch(
            self.collection(resource_group, scale_set).segment(extension_name),
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
        extension_name: &str,
        opts: &PollOptions,
    ) -> Result<()> {
        let spec = OperationSpec::delete(
            self.collection(resource_group, scale_set).segment(extension_name),
            API_VERSION,
        )
        .long_running();
        self.client.invoke(&spec, opts).await?;
        Ok(())
    }

    pub async fn list(&self, resource_group: &str, scale_set: &str) -> Result<Vec<Value>> {
        let spec = OperationSpec::get(self.collection(resource_group, scale_set), API_VERSION);
        self.client.pager(spec).collect_all().await
    }
}
