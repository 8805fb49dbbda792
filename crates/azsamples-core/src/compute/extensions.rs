use serde_json::Value;

use super::{API_VERSION, group_path};
use crate::client::{ArmClient, OperationSpec};
use crate::error::Result;
use crate::progress::PollOptions;
use crate::resource::ResourcePath;

/// Operations on `virtualMachines/{vm}/extensions`
#[derive(Debug, Clone)]
pub struct VirtualMachineExtensionsClient {
    client: ArmClient,
    subscription_id: String,
}

impl VirtualMachineExtensionsClient {
    pub fn new(client: ArmClient, subscription_id: &str) -> Self {
        Self {
            client,
            subscription_id: subscription_id.to_string(),
        }
    }

    fn collection(&self, resource_group: &str, vm_name: &str) -> ResourcePath {
        group_path(&self.subscription_id, resource_group)
            .child("virtualMachines", vm_name)
            .literal("extensions")
    }

    fn extension_path(&self, resource_group: &str, vm_name: &str, name: &str) -> ResourcePath {
        self.collection(resource_group, vm_name).segment(name)
    }

    /// Install or replace an extension and wait for provisioning
    pub async fn create_or_update(
        &self,
        resource_group: &str,
        vm_name: &str,
        extension_name: &str,
        params: &Value,
        opts: &PollOptions,
    ) -> Result<String> {
        let spec = OperationSpec::put(
            self.extension_path(resource_group, vm_name, extension_name),
            API_VERSION,
            params,
        )
        .long_running();
        Ok(self.client.invoke(&spec, opts).await?.resource_id())
    }

    pub async fn get(
        &self,
        resource_group: &str,
        vm_name: &str,
        extension_name: &str,
        expand: Option<&str>,
    ) -> Result<Value> {
        let spec = OperationSpec::get(
            self.extension_path(resource_group, vm_name, extension_name),
            API_VERSION,
        )
        .query_opt("$expand", expand);
        self.client.fetch(&spec).await
    }

    pub async fn update(
        &self,
        resource_group: &str,
        vm_name: &str,
        extension_name: &str,
        params: &Value,
        opts: &PollOptions,
    ) -> Result<String> {
        let spec = OperationSpec::patch(
            self.extension_path(resource_group, vm_name, extension_name),
            API_VERSION,
            params,
        )
        .long_running();
        Ok(self.client.invoke(&spec, opts).await?.resource_id())
    }

    pub async fn delete(
        &self,
        resource_group: &str,
        vm_name: &str,
        extension_name: &str,
        opts: &PollOptions,
    ) -> Result<()> {
        let spec = OperationSpec::delete(
            self.extension_path(resource_group, vm_name, extension_name),
            API_VERSION,
        )
        .long_running();
        self.client.invoke(&spec, opts).await?;
        Ok(())
    }

    /// Extensions installed on a virtual machine
    ///
    /// The service returns every extension in one response.
    pub async fn list(
        &self,
        resource_group: &str,
        vm_name: &str,
        expand: Option<&str>,
    ) -> Result<Vec<Value>> {
        let spec = OperationSpec::get(self.collection(resource_group, vm_name), API_VERSION)
            .query_opt("$expand", expand);
        self.client.pager(spec).collect_all().await
    }
}
