//! Blob containers within a storage account's default blob service
//!
//! Container calls complete inline; none of them is long-running.

use serde_json::Value;

use super::{API_VERSION, account_path};
use crate::client::{ArmClient, OperationSpec, resource_id_or_path};
use crate::error::Result;
use crate::resource::ResourcePath;

/// Filters for [`BlobContainersClient::list`]
#[derive(Debug, Clone, Default)]
pub struct ContainerListOptions {
    pub max_page_size: Option<u32>,
    /// Name prefix filter, e.g. `name ge 'logs'`
    pub filter: Option<String>,
    /// `deleted` includes soft-deleted containers
    pub include: Option<String>,
}

/// Blob containers of a storage account, managed through the control plane
///
/// Every container operation completes inline; none are long-running.
#[derive(Debug, Clone)]
pub struct BlobContainersClient {
    client: ArmClient,
    subscription_id: String,
}

impl BlobContainersClient {
    pub fn new(client: ArmClient, subscription_id: &str) -> Self {
        Self {
            client,
            subscription_id: subscription_id.to_string(),
        }
    }

    fn containers(&self, resource_group: &str, account_name: &str) -> ResourcePath {
        account_path(&self.subscription_id, resource_group, account_name)
            .literal("blobServices")
            .literal("default")
            .literal("containers")
    }

    fn container(
        &self,
        resource_group: &str,
        account_name: &str,
        container: &str,
    ) -> ResourcePath {
        self.containers(resource_group, account_name).segment(container)
    }

    /// Create a container and return its id
    ///
    /// `params` is the container body, e.g. `{"properties": {"publicAccess": "None"}}`.
    pub async fn create(
        &self,
        resource_group: &str,
        account_name: &str,
        container: &str,
        params: &Value,
    ) -> Result<String> {
        let spec = OperationSpec::put(
            self.container(resource_group, account_name, container),
            API_VERSION,
            params,
        );
        let response = self.client.send(&spec).await?;
        Ok(resource_id_or_path(response.body.as_ref(), &spec.path))
    }

    pub async fn get(
        &self,
        resource_group: &str,
        account_name: &str,
        container: &str,
    ) -> Result<Value> {
        let spec = OperationSpec::get(
            self.container(resource_group, account_name, container),
            API_VERSION,
        );
        self.client.fetch(&spec).await
    }

    pub async fn update(
        &self,
        resource_group: &str,
        account_name: &str,
        container: &str,
        params: &Value,
    ) -> Result<Value> {
        let spec = OperationSpec::patch(
            self.container(resource_group, account_name, container),
            API_VERSION,
            params,
        );
        self.client.fetch(&spec).await
    }

    pub async fn delete(
        &self,
        resource_group: &str,
        account_name: &str,
        container: &str,
    ) -> Result<()> {
        let spec = OperationSpec::delete(
            self.container(resource_group, account_name, container),
            API_VERSION,
        );
        self.client.send(&spec).await?;
        Ok(())
    }

    pub async fn list(
        &self,
        resource_group: &str,
        account_name: &str,
        options: &ContainerListOptions,
    ) -> Result<Vec<Value>> {
        let spec = OperationSpec::get(self.containers(resource_group, account_name), API_VERSION)
            .query_opt("$maxpagesize", options.max_page_size.map(|n| n.to_string()))
            .query_opt("$filter", options.filter.as_deref())
            .query_opt("$include", options.include.as_deref());
        self.client.pager(spec).collect_all().await
    }

    /// Add legal hold tags; `legal_hold` is `{"tags": [...]}`
    ///
    /// Returns the resulting legal hold state.
    pub async fn set_legal_hold(
        &self,
        resource_group: &str,
        account_name: &str,
        container: &str,
        legal_hold: &Value,
    ) -> Result<Value> {
        self.legal_hold(resource_group, account_name, container, "setLegalHold", legal_hold)
            .await
    }

    /// Remove legal hold tags; tags not currently held are ignored by the service
    pub async fn clear_legal_hold(
        &self,
        resource_group: &str,
        account_name: &str,
        container: &str,
        legal_hold: &Value,
    ) -> Result<Value> {
        self.legal_hold(resource_group, account_name, container, "clearLegalHold", legal_hold)
            .await
    }

    async fn legal_hold(
        &self,
        resource_group: &str,
        account_name: &str,
        container: &str,
        action: &str,
        legal_hold: &Value,
    ) -> Result<Value> {
        let spec = OperationSpec::post(
            self.container(resource_group, account_name, container)
                .literal(action),
            API_VERSION,
        )
        .body(legal_hold);
        self.client.fetch(&spec).await
    }
}
