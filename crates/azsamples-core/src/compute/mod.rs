//! Microsoft.Compute wrappers
//!
//! One client per resource type. Each method maps to exactly one ARM
//! operation; long-running methods take [`PollOptions`](crate::PollOptions)
//! and return only after the operation is terminal.

mod extensions;
mod images;
mod rolling_upgrades;
mod run_commands;
mod scale_set_extensions;
mod scale_set_vms;
mod scale_sets;
mod virtual_machines;

pub use extensions::VirtualMachineExtensionsClient;
pub use images::{ImageListOptions, VirtualMachineImagesClient};
pub use rolling_upgrades::RollingUpgradesClient;
pub use run_commands::RunCommandsClient;
pub use scale_set_extensions::VirtualMachineScaleSetExtensionsClient;
pub use scale_set_vms::VirtualMachineScaleSetVMsClient;
pub use scale_sets::VirtualMachineScaleSetsClient;
pub use virtual_machines::VirtualMachinesClient;

use crate::resource::ResourcePath;

pub const API_VERSION: &str = "2024-07-01";
pub const PROVIDER: &str = "Microsoft.Compute";

/// `/subscriptions/{sub}/resourceGroups/{rg}/providers/Microsoft.Compute`
pub(crate) fn group_path(subscription_id: &str, resource_group: &str) -> ResourcePath {
    ResourcePath::subscription(subscription_id)
        .resource_group(resource_group)
        .provider(PROVIDER)
}

/// `/subscriptions/{sub}/providers/Microsoft.Compute`
pub(crate) fn subscription_path(subscription_id: &str) -> ResourcePath {
    ResourcePath::subscription(subscription_id).provider(PROVIDER)
}
