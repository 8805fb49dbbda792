//! Resource addressing
//!
//! [`ResourcePath`] builds percent-encoded ARM paths; [`ResourceIdentity`]
//! is the parsed form of a resource id such as the ones returned by the
//! create wrappers.

use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Builder for ARM resource paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePath {
    path: String,
}

impl ResourcePath {
    /// `/subscriptions/{subscription_id}`
    pub fn subscription(subscription_id: &str) -> Self {
        Self {
            path: String::from("/subscriptions"),
        }
        .segment(subscription_id)
    }

    /// `.../resourceGroups/{resource_group}`
    #[must_use]
    pub fn resource_group(self, resource_group: &str) -> Self {
        self.child("resourceGroups", resource_group)
    }

    /// `.../providers/{namespace}`
    #[must_use]
    pub fn provider(self, namespace: &str) -> Self {
        self.literal("providers").literal(namespace)
    }

    /// `.../{collection}/{name}`
    #[must_use]
    pub fn child(self, collection: &str, name: &str) -> Self {
        self.literal(collection).segment(name)
    }

    /// A fixed path segment (collection names, action names)
    #[must_use]
    pub fn literal(mut self, segment: &str) -> Self {
        self.path.push('/');
        self.path.push_str(segment);
        self
    }

    /// A caller-supplied segment, percent-encoded
    #[must_use]
    pub fn segment(mut self, value: &str) -> Self {
        self.path.push('/');
        self.path.push_str(&urlencoding::encode(value));
        self
    }

    pub fn as_str(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

impl From<ResourcePath> for String {
    fn from(path: ResourcePath) -> Self {
        path.path
    }
}

/// Subscription, resource group, resource name and optional instance id
///
/// Not validated beyond the shape of the id it was parsed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceIdentity {
    pub subscription_id: String,
    pub resource_group: String,
    pub provider: String,
    pub resource_type: String,
    pub resource_name: String,
    /// Scale set instance id (`.../virtualMachines/{instance_id}`)
    pub instance_id: Option<String>,
}

impl ResourceIdentity {
    /// Parse an ARM resource id
    ///
    /// ```rust
    /// use azsamples_core::ResourceIdentity;
    ///
    /// let id: ResourceIdentity = "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Compute/virtualMachineScaleSets/ss/virtualMachines/3"
    ///     .parse()
    ///     .unwrap();
    /// assert_eq!(id.resource_name, "ss");
    /// assert_eq!(id.instance_id.as_deref(), Some("3"));
    /// ```
    pub fn parse(id: &str) -> Result<Self, CoreError> {
        let invalid = || CoreError::InvalidResourceId(id.to_string());

        let segments: Vec<String> = id
            .trim_matches('/')
            .split('/')
            .map(|s| {
                urlencoding::decode(s)
                    .map(|d| d.into_owned())
                    .unwrap_or_else(|_| s.to_string())
            })
            .collect();

        let mut it = segments.iter().map(String::as_str);
        let (Some(subs), Some(subscription_id), Some(groups), Some(resource_group)) =
            (it.next(), it.next(), it.next(), it.next())
        else {
            return Err(invalid());
        };
        if !subs.eq_ignore_ascii_case("subscriptions")
            || !groups.eq_ignore_ascii_case("resourceGroups")
        {
            return Err(invalid());
        }
        let (Some(providers), Some(provider), Some(resource_type), Some(resource_name)) =
            (it.next(), it.next(), it.next(), it.next())
        else {
            return Err(invalid());
        };
        if !providers.eq_ignore_ascii_case("providers") {
            return Err(invalid());
        }

        let instance_id = match (it.next(), it.next()) {
            (Some(child), Some(instance)) if child.eq_ignore_ascii_case("virtualMachines") => {
                Some(instance.to_string())
            }
            _ => None,
        };

        Ok(Self {
            subscription_id: subscription_id.to_string(),
            resource_group: resource_group.to_string(),
            provider: provider.to_string(),
            resource_type: resource_type.to_string(),
            resource_name: resource_name.to_string(),
            instance_id,
        })
    }

    /// Rebuild the resource path this identity addresses
    pub fn path(&self) -> ResourcePath {
        let path = ResourcePath::subscription(&self.subscription_id)
            .resource_group(&self.resource_group)
            .provider(&self.provider)
            .child(&self.resource_type, &self.resource_name);
        match &self.instance_id {
            Some(instance) => path.child("virtualMachines", instance),
            None => path,
        }
    }
}

impl FromStr for ResourceIdentity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
