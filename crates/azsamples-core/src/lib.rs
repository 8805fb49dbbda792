//! # azsamples-core
//!
//! Thin wrappers over Azure Resource Manager for compute (virtual machines,
//! scale sets, extensions, images, run commands) and storage (accounts, blob
//! containers).
//!
//! Every wrapper forwards caller-supplied identifiers and an opaque JSON
//! payload to exactly one ARM operation. Long-running operations are polled
//! with a fixed, caller-supplied interval until they are terminal, time out,
//! or the caller cancels. Results come back as a resource id, `()`, a JSON
//! payload, or a [`CoreError`].
//!
//! ## Layout
//!
//! - [`config`] - TOML profiles, environment resolution, [`Settings`]
//! - [`auth`] - bearer token credentials
//! - [`client`] - the ARM transport and [`OperationSpec`]
//! - [`progress`] - long-running operation polling
//! - [`pager`] - `nextLink` pagination
//! - [`compute`], [`storage`] - per-resource clients
//!
//! ## Example
//!
//! ```rust,ignore
//! use azsamples_core::{ClientFactory, Settings};
//! use serde_json::json;
//!
//! let settings = Settings::from_env()?;
//! let factory = ClientFactory::new(&settings)?;
//! let group = settings.resource_group()?;
//!
//! let accounts = factory.storage_accounts();
//! let id = accounts
//!     .create(
//!         group,
//!         "azsamplesdata01",
//!         &json!({
//!             "location": factory.location(),
//!             "kind": "StorageV2",
//!             "sku": { "name": "Standard_LRS" }
//!         }),
//!         &factory.poll_options(),
//!     )
//!     .await?;
//! println!("created {}", id);
//! ```

pub mod auth;
pub mod client;
pub mod compute;
pub mod config;
pub mod error;
pub mod factory;
pub mod pager;
pub mod progress;
pub mod resource;
pub mod storage;

pub use auth::{AccessToken, StaticTokenCredential, TokenCredential};
pub use client::{ArmClient, Completion, OperationKind, OperationSpec, resource_id_or_path};
pub use compute::{
    ImageListOptions, RollingUpgradesClient, RunCommandsClient, VirtualMachineExtensionsClient,
    VirtualMachineImagesClient, VirtualMachineScaleSetExtensionsClient,
    VirtualMachineScaleSetVMsClient, VirtualMachineScaleSetsClient, VirtualMachinesClient,
};
pub use config::{CloudEnvironment, Config, CredentialSource, Settings};
pub use error::{CoreError, Result};
pub use factory::ClientFactory;
pub use pager::{Page, Pager};
pub use progress::{PollOptions, PollPolicy, Poller, ProgressCallback, ProgressEvent};
pub use resource::{ResourceIdentity, ResourcePath};
pub use storage::{
    BlobContainersClient, ContainerListOptions, StorageAccountsClient, StorageKeyName,
};

pub use tokio_util::sync::CancellationToken;
