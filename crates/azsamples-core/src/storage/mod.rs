//! Microsoft.Storage wrappers

mod accounts;
mod containers;

pub use accounts::{StorageAccountsClient, StorageKeyName};
pub use containers::{BlobContainersClient, ContainerListOptions};

use crate::resource::ResourcePath;

pub const API_VERSION: &str = "2023-05-01";
pub const PROVIDER: &str = "Microsoft.Storage";

/// `.../resourceGroups/{rg}/providers/Microsoft.Storage/storageAccounts/{account}`
pub(crate) fn account_path(
    subscription_id: &str,
    resource_group: &str,
    account_name: &str,
) -> ResourcePath {
    ResourcePath::subscription(subscription_id)
        .resource_group(resource_group)
        .provider(PROVIDER)
        .child("storageAccounts", account_name)
}
