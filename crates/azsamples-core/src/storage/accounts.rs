//! Storage accounts
//!
//! Account creation is long-running; update and delete complete inline.

use std::fmt;

use serde_json::{Value, json};

use super::{API_VERSION, PROVIDER, account_path};
use crate::client::{ArmClient, OperationSpec};
use crate::error::Result;
use crate::progress::PollOptions;
use crate::resource::ResourcePath;

/// Which access key to regenerate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKeyName {
    Key1,
    Key2,
}

impl fmt::Display for StorageKeyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageKeyName::Key1 => write!(f, "key1"),
            StorageKeyName::Key2 => write!(f, "key2"),
        }
    }
}

/// Operations on `Microsoft.Storage/storageAccounts`
#[derive(Debug, Clone)]
pub struct StorageAccountsClient {
    client: ArmClient,
    subscription_id: String,
}

impl StorageAccountsClient {
    pub fn new(client: ArmClient, subscription_id: &str) -> Self {
        Self {
            client,
            subscription_id: subscription_id.to_string(),
        }
    }

    fn account(&self, resource_group: &str, account_name: &str) -> ResourcePath {
        account_path(&self.subscription_id, resource_group, account_name)
    }

    fn subscription_scope(&self) -> ResourcePath {
        ResourcePath::subscription(&self.subscription_id).provider(PROVIDER)
    }

    /// Whether an account name is valid and not taken
    ///
    /// Returns the service payload: `{"nameAvailable": bool, "reason": ..., "message": ...}`.
    pub async fn check_name_availability(&self, account_name: &str) -> Result<Value> {
        let body = json!({
            "name": account_name,
            "type": "Microsoft.Storage/storageAccounts",
        });
        let spec = OperationSpec::post(
            self.subscription_scope().literal("checkNameAvailability"),
            API_VERSION,
        )
        .body(&body);
        self.client.fetch(&spec).await
    }

    /// Create a storage account and wait for provisioning
    ///
    /// `params` carries at least `sku`, `kind` and `location`.
    pub async fn create(
        &self,
        resource_group: &str,
        account_name: &str,
        params: &Value,
        opts: &PollOptions,
    ) -> Result<String> {
        let spec =
            OperationSpec::put(self.account(resource_group, account_name), API_VERSION, params)
                .long_running();
        Ok(self.client.invoke(&spec, opts).await?.resource_id())
    }

    /// Account properties; `expand` accepts `geoReplicationStats` or `blobRestoreStatus`
    pub async fn get_properties(
        &self,
        resource_group: &str,
        account_name: &str,
        expand: Option<&str>,
    ) -> Result<Value> {
        let spec = OperationSpec::get(self.account(resource_group, account_name), API_VERSION)
            .query_opt("$expand", expand);
        self.client.fetch(&spec).await
    }

    pub async fn update(
        &self,
        resource_group: &str,
        account_name: &str,
        params: &Value,
    ) -> Result<Value> {
        let spec =
            OperationSpec::patch(self.account(resource_group, account_name), API_VERSION, params);
        self.client.fetch(&spec).await
    }

    pub async fn delete(&self, resource_group: &str, account_name: &str) -> Result<()> {
        let spec = OperationSpec::delete(self.account(resource_group, account_name), API_VERSION);
        self.client.send(&spec).await?;
        Ok(())
    }

    /// All storage accounts in the subscription
    pub async fn list(&self) -> Result<Vec<Value>> {
        let spec = OperationSpec::get(
            self.subscription_scope().literal("storageAccounts"),
            API_VERSION,
        );
        self.client.pager(spec).collect_all().await
    }

    pub async fn list_by_resource_group(&self, resource_group: &str) -> Result<Vec<Value>> {
        let spec = OperationSpec::get(
            ResourcePath::subscription(&self.subscription_id)
                .resource_group(resource_group)
                .provider(PROVIDER)
                .literal("storageAccounts"),
            API_VERSION,
        );
        self.client.pager(spec).collect_all().await
    }

    /// Access keys (`{"keys": [{"keyName", "value", "permissions"}]}`)
    pub async fn list_keys(&self, resource_group: &str, account_name: &str) -> Result<Value> {
        let spec = OperationSpec::post(
            self.account(resource_group, account_name).literal("listKeys"),
            API_VERSION,
        );
        self.client.fetch(&spec).await
    }

    /// Regenerate one access key and return the new key set
    pub async fn regenerate_key(
        &self,
        resource_group: &str,
        account_name: &str,
        key: StorageKeyName,
    ) -> Result<Value> {
        let body = json!({ "keyName": key.to_string() });
        let spec = OperationSpec::post(
            self.account(resource_group, account_name).literal("regenerateKey"),
            API_VERSION,
        )
        .body(&body);
        self.client.fetch(&spec).await
    }
}
