//! Virtual machines

use serde_json::Value;

use super::{API_VERSION, group_path, subscription_path};
use crate::client::{ArmClient, OperationSpec};
use crate::error::Result;
use crate::progress::PollOptions;
use crate::resource::ResourcePath;

/// Operations on `Microsoft.Compute/virtualMachines`
#[derive(Debug, Clone)]
pub struct VirtualMachinesClient {
    client: ArmClient,
    subscription_id: String,
}

impl VirtualMachinesClient {
    pub fn new(client: ArmClient, subscription_id: &str) -> Self {
        Self {
            client,
            subscription_id: subscription_id.to_string(),
        }
    }

    fn vm_path(&self, resource_group: &str, vm_name: &str) -> ResourcePath {
        group_path(&self.subscription_id, resource_group).child("virtualMachines", vm_name)
    }

    /// Create or replace a virtual machine and wait for provisioning
    ///
    /// `params` is sent as the request body unmodified. Returns the resource
    /// id, or the request path when the final payload carries no `id`.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use serde_json::json;
    ///
    /// let vms = factory.virtual_machines();
    /// let params = json!({
    ///     "location": factory.location(),
    ///     "properties": {
    ///         "hardwareProfile": { "vmSize": "Standard_B1s" },
    ///         "storageProfile": { "imageReference": {
    ///             "publisher": "Canonical",
    ///             "offer": "0001-com-ubuntu-server-jammy",
    ///             "sku": "22_04-lts",
    ///             "version": "latest"
    ///         }},
    ///         "osProfile": { "computerName": "vm-1", "adminUsername": "azureuser" },
    ///         "networkProfile": { "networkInterfaces": [{ "id": nic_id }] }
    ///     }
    /// });
    ///
    /// let id = vms
    ///     .create_or_update("rg", "vm-1", &params, &factory.poll_options())
    ///     .await?;
    /// ```
    pub async fn create_or_update(
        &self,
        resource_group: &str,
        vm_name: &str,
        params: &Value,
        opts: &PollOptions,
    ) -> Result<String> {
        let spec = OperationSpec::put(self.vm_path(resource_group, vm_name), API_VERSION, params)
            .long_running();
        Ok(self.client.invoke(&spec, opts).await?.resource_id())
    }

    /// Get a virtual machine, optionally with `$expand` (e.g. `instanceView`)
    pub async fn get(
        &self,
        resource_group: &str,
        vm_name: &str,
        expand: Option<&str>,
    ) -> Result<Value> {
        let spec = OperationSpec::get(self.vm_path(resource_group, vm_name), API_VERSION)
            .query_opt("$expand", expand);
        self.client.fetch(&spec).await
    }

    /// Runtime status of a virtual machine
    pub async fn instance_view(&self, resource_group: &str, vm_name: &str) -> Result<Value> {
        let spec = OperationSpec::get(
            self.vm_path(resource_group, vm_name).literal("instanceView"),
            API_VERSION,
        );
        self.client.fetch(&spec).await
    }

    /// Patch a virtual machine and wait for the update
    pub async fn update(
        &self,
        resource_group: &str,
        vm_name: &str,
        params: &Value,
        opts: &PollOptions,
    ) -> Result<String> {
        let spec =
            OperationSpec::patch(self.vm_path(resource_group, vm_name), API_VERSION, params)
                .long_running();
        Ok(self.client.invoke(&spec, opts).await?.resource_id())
    }

    pub async fn delete(
        &self,
        resource_group: &str,
        vm_name: &str,
        opts: &PollOptions,
    ) -> Result<()> {
        let spec = OperationSpec::delete(self.vm_path(resource_group, vm_name), API_VERSION)
            .long_running();
        self.client.invoke(&spec, opts).await?;
        Ok(())
    }

    pub async fn start(
        &self,
        resource_group: &str,
        vm_name: &str,
        opts: &PollOptions,
    ) -> Result<()> {
        self.power_action(resource_group, vm_name, "start", opts).await
    }

    /// Stop the virtual machine; compute charges continue until deallocated
    pub async fn power_off(
        &self,
        resource_group: &str,
        vm_name: &str,
        opts: &PollOptions,
    ) -> Result<()> {
        self.power_action(resource_group, vm_name, "powerOff", opts).await
    }

    pub async fn restart(
        &self,
        resource_group: &str,
        vm_name: &str,
        opts: &PollOptions,
    ) -> Result<()> {
        self.power_action(resource_group, vm_name, "restart", opts).await
    }

    pub async fn deallocate(
        &self,
        resource_group: &str,
        vm_name: &str,
        opts: &PollOptions,
    ) -> Result<()> {
        self.power_action(resource_group, vm_name, "deallocate", opts).await
    }

    /// Move the virtual machine to a new host node
    pub async fn redeploy(
        &self,
        resource_group: &str,
        vm_name: &str,
        opts: &PollOptions,
    ) -> Result<()> {
        self.power_action(resource_group, vm_name, "redeploy", opts).await
    }

    /// Reimage the OS disk; `params` (e.g. `{"tempDisk": true}`) is optional
    pub async fn reimage(
        &self,
        resource_group: &str,
        vm_name: &str,
        params: Option<&Value>,
        opts: &PollOptions,
    ) -> Result<()> {
        let spec = OperationSpec::post(
            self.vm_path(resource_group, vm_name).literal("reimage"),
            API_VERSION,
        )
        .body_opt(params)
        .long_running();
        self.client.invoke(&spec, opts).await?;
        Ok(())
    }

    /// Run a script on the virtual machine and return the command output
    ///
    /// The output is the `RunCommandResult` payload (`{"value": [...]}`), or
    /// `Value::Null` when the service returns none.
    pub async fn run_command(
        &self,
        resource_group: &str,
        vm_name: &str,
        params: &Value,
        opts: &PollOptions,
    ) -> Result<Value> {
        let spec = OperationSpec::post(
            self.vm_path(resource_group, vm_name).literal("runCommand"),
            API_VERSION,
        )
        .body(params)
        .long_running();
        Ok(self.client.invoke(&spec, opts).await?.into_body())
    }

    /// Mark a deallocated virtual machine as generalized
    pub async fn generalize(&self, resource_group: &str, vm_name: &str) -> Result<()> {
        let spec = OperationSpec::post(
            self.vm_path(resource_group, vm_name).literal("generalize"),
            API_VERSION,
        );
        self.client.send(&spec).await?;
        Ok(())
    }

    /// All virtual machines in a resource group
    pub async fn list(&self, resource_group: &str) -> Result<Vec<Value>> {
        let spec = OperationSpec::get(
            group_path(&self.subscription_id, resource_group).literal("virtualMachines"),
            API_VERSION,
        );
        self.client.pager(spec).collect_all().await
    }

    /// All virtual machines in the subscription
    pub async fn list_all(&self) -> Result<Vec<Value>> {
        let spec = OperationSpec::get(
            subscription_path(&self.subscription_id).literal("virtualMachines"),
            API_VERSION,
        );
        self.client.pager(spec).collect_all().await
    }

    /// Sizes the virtual machine can be resized to
    pub async fn list_available_sizes(
        &self,
        resource_group: &str,
        vm_name: &str,
    ) -> Result<Vec<Value>> {
        let spec = OperationSpec::get(
            self.vm_path(resource_group, vm_name).literal("vmSizes"),
            API_VERSION,
        );
        self.client.pager(spec).collect_all().await
    }

    async fn power_action(
        &self,
        resource_group: &str,
        vm_name: &str,
        action: &str,
        opts: &PollOptions,
    ) -> Result<()> {
        let spec = OperationSpec::post(
            self.vm_path(resource_group, vm_name).literal(action),
            API_VERSION,
        )
        .long_running();
        self.client.invoke(&spec, opts).await?;
        Ok(())
    }
}
