//! Run commands
//!
//! Built-in commands are listed per location. Managed run commands are child
//! resources of a virtual machine and have the usual create/update/delete
//! lifecycle.

use serde_json::Value;

use super::{API_VERSION, group_path, subscription_path};
use crate::client::{ArmClient, OperationSpec};
use crate::error::Result;
use crate::progress::PollOptions;
use crate::resource::ResourcePath;

#[derive(Debug, Clone)]
pub struct RunCommandsClient {
    client: ArmClient,
    subscription_id: String,
}

impl RunCommandsClient {
    pub fn new(client: ArmClient, subscription_id: &str) -> Self {
        Self {
            client,
            subscription_id: subscription_id.to_string(),
        }
    }

    fn builtin(&self, location: &str) -> ResourcePath {
        subscription_path(&self.subscription_id)
            .child("locations", location)
            .literal("runCommands")
    }

    fn managed(&self, resource_group: &str, vm_name: &str) -> ResourcePath {
        group_path(&self.subscription_id, resource_group)
            .child("virtualMachines", vm_name)
            .literal("runCommands")
    }

    /// Built-in commands available in a location
    pub async fn list(&self, location: &str) -> Result<Vec<Value>> {
        let spec = OperationSpec::get(self.builtin(location), API_VERSION);
        self.client.pager(spec).collect_all().await
    }

    /// One built-in command, e.g. `RunShellScript`
    pub async fn get(&self, location: &str, command_id: &str) -> Result<Value> {
        let spec = OperationSpec::get(self.builtin(location).segment(command_id), API_VERSION);
        self.client.fetch(&spec).await
    }

    pub async fn create_or_update(
        &self,
        resource_group: &str,
        vm_name: &str,
        run_command_name: &str,
        params: &Value,
        opts: &PollOptions,
    ) -> Result<String> {
        let spec = OperationSpec::put(
            self.managed(resource_group, vm_name).segment(run_command_name),
            API_VERSION,
            params,
        )
        .long_running();
        Ok(self.client.invoke(&spec, opts).await?.resource_id())
    }

    pub async fn update(
        &self,
        resource_group: &str,
        vm_name: &str,
        run_command_name: &str,
        params: &Value,
        opts: &PollOptions,
    ) -> Result<String> {
        let spec = OperationSpec::patch(
            self.managed(resource_group, vm_name).segment(run_command_name),
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
        run_command_name: &str,
        opts: &PollOptions,
    ) -> Result<()> {
        let spec = OperationSpec::delete(
            self.managed(resource_group, vm_name).segment(run_command_name),
            API_VERSION,
        )
        .long_running();
        self.client.invoke(&spec, opts).await?;
        Ok(())
    }

    /// A managed run command; `$expand=instanceView` includes its output
    pub async fn get_by_virtual_machine(
        &self,
        resource_group: &str,
        vm_name: &str,
        run_command_name: &str,
        expand: Option<&str>,
    ) -> Result<Value> {
        let spec = OperationSpec::get(
            self.managed(resource_group, vm_name).segment(run_command_name),
            API_VERSION,
        )
        .query_opt("$expand", expand);
        self.client.fetch(&spec).await
    }

    pub async fn list_by_virtual_machine(
        &self,
        resource_group: &str,
        vm_name: &str,
        expand: Option<&str>,
    ) -> Result<Vec<Value>> {
        let spec = OperationSpec::get(self.managed(resource_group, vm_name), API_VERSION)
            .query_opt("$expand", expand);
        self.client.pager(spec).collect_all().await
    }
}
