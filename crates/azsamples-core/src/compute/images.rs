//! Marketplace VM images
//!
//! Image listings are scoped to a location and answer with bare JSON arrays
//! rather than `{"value": [...]}` pages.

use serde_json::Value;

use super::{API_VERSION, subscription_path};
use crate::client::{ArmClient, OperationSpec};
use crate::error::Result;
use crate::resource::ResourcePath;

/// Filters for [`VirtualMachineImagesClient::list`]
#[derive(Debug, Clone, Default)]
pub struct ImageListOptions {
    pub filter: Option<String>,
    pub top: Option<u32>,
    pub orderby: Option<String>,
}

/// Read-only queries on `locations/{location}/publishers`
#[derive(Debug, Clone)]
pub struct VirtualMachineImagesClient {
    client: ArmClient,
    subscription_id: String,
}

impl VirtualMachineImagesClient {
    pub fn new(client: ArmClient, subscription_id: &str) -> Self {
        Self {
            client,
            subscription_id: subscription_id.to_string(),
        }
    }

    fn publishers(&self, location: &str) -> ResourcePath {
        subscription_path(&self.subscription_id)
            .child("locations", location)
            .literal("publishers")
    }

    fn offers(&self, location: &str, publisher: &str) -> ResourcePath {
        self.publishers(location)
            .segment(publisher)
            .literal("artifacttypes")
            .literal("vmimage")
            .literal("offers")
    }

    fn versions(&self, location: &str, publisher: &str, offer: &str, sku: &str) -> ResourcePath {
        self.offers(location, publisher)
            .segment(offer)
            .child("skus", sku)
            .literal("versions")
    }

    /// One image version
    pub async fn get(
        &self,
        location: &str,
        publisher: &str,
        offer: &str,
        sku: &str,
        version: &str,
    ) -> Result<Value> {
        let spec = OperationSpec::get(
            self.versions(location, publisher, offer, sku).segment(version),
            API_VERSION,
        );
        self.client.fetch(&spec).await
    }

    /// Image versions of a SKU
    pub async fn list(
        &self,
        location: &str,
        publisher: &str,
        offer: &str,
        sku: &str,
        options: &ImageListOptions,
    ) -> Result<Vec<Value>> {
        let spec = OperationSpec::get(self.versions(location, publisher, offer, sku), API_VERSION)
            .query_opt("$filter", options.filter.as_deref())
            .query_opt("$top", options.top.map(|top| top.to_string()))
            .query_opt("$orderby", options.orderby.as_deref());
        self.client.pager(spec).collect_all().await
    }

    pub async fn list_offers(&self, location: &str, publisher: &str) -> Result<Vec<Value>> {
        let spec = OperationSpec::get(self.offers(location, publisher), API_VERSION);
        self.client.pager(spec).collect_all().await
    }

    pub async fn list_publishers(&self, location: &str) -> Result<Vec<Value>> {
        let spec = OperationSpec::get(self.publishers(location), API_VERSION);
        self.client.pager(spec).collect_all().await
    }

    pub async fn list_skus(
        &self,
        location: &str,
        publisher: &str,
        offer: &str,
    ) -> Result<Vec<Value>> {
        let spec = OperationSpec::get(
            self.offers(location, publisher).segment(offer).literal("skus"),
            API_VERSION,
        );
        self.client.pager(spec).collect_all().await
    }
}
