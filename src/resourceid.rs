// SPDX-FileCopyrightText: 2025 Maciej Borzecki <maciek.borzecki@gmail.com>
//
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use thiserror;

/// Wraps resource identifier parsing errors.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ResourceIdError {
    #[error("cannot parse resource ID {0:?}: number of segments is not even")]
    OddSegments(String),
    #[error("cannot parse resource ID {0:?}: key/value cannot be empty")]
    EmptySegment(String),
    #[error("no subscription ID found in {0:?}")]
    NoSubscription(String),
    #[error("no resource group found in {0:?}")]
    NoResourceGroup(String),
    #[error("no {kind} name found in {id:?}")]
    NoResourceName { kind: &'static str, id: String },
}

/// A parsed Azure Resource Manager identifier.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResourceId {
    pub subscription_id: String,
    pub resource_group: String,
    pub provider: String,
    /// Remaining type/name pairs, e.g. "networkInterfaces" -> "nic-0".
    pub path: HashMap<String, String>,
}

impl ResourceId {
    /// Parse an identifier of the form
    /// /subscriptions/{sub}/resourceGroups/{rg}/providers/{ns}/{type}/{name}.
    /// A full management URL is accepted too, only its path is considered.
    pub fn parse(id: &str) -> Result<ResourceId, ResourceIdError> {
        let path = strip_url(id);
        let path = path.trim_matches('/');

        let components: Vec<&str> = if path.is_empty() {
            vec![]
        } else {
            path.split('/').collect()
        };

        if components.len() % 2 != 0 {
            return Err(ResourceIdError::OddSegments(id.to_string()));
        }

        let mut pairs = HashMap::new();
        for kv in components.chunks(2) {
            let (key, value) = (kv[0], kv[1]);
            if key.is_empty() || value.is_empty() {
                return Err(ResourceIdError::EmptySegment(id.to_string()));
            }
            pairs.insert(key.to_string(), value.to_string());
        }

        let subscription_id = pairs
            .remove("subscriptions")
            .ok_or_else(|| ResourceIdError::NoSubscription(id.to_string()))?;

        // some APIs report the group key in lower case
        let resource_group = pairs
            .remove("resourceGroups")
            .or_else(|| pairs.remove("resourcegroups"))
            .unwrap_or_default();

        let provider = pairs.remove("providers").unwrap_or_default();

        Ok(ResourceId {
            subscription_id,
            resource_group,
            provider,
            path: pairs,
        })
    }
}

fn strip_url(id: &str) -> &str {
    let Some(scheme_end) = id.find("://") else {
        return id;
    };
    let rest = &id[scheme_end + 3..];
    let path = match rest.find('/') {
        Some(idx) => &rest[idx..],
        None => "",
    };
    match path.find('?') {
        Some(idx) => &path[..idx],
        None => path,
    }
}

/// Identifies a network interface by its group and name.
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceId {
    pub subscription_id: String,
    pub resource_group: String,
    pub name: String,
}

const NETWORK_INTERFACES: &str = "networkInterfaces";

impl InterfaceId {
    pub fn parse(id: &str) -> Result<InterfaceId, ResourceIdError> {
        let mut parsed = ResourceId::parse(id)?;
        if parsed.resource_group.is_empty() {
            return Err(ResourceIdError::NoResourceGroup(id.to_string()));
        }

        let name = parsed
            .path
            .remove(NETWORK_INTERFACES)
            .ok_or_else(|| ResourceIdError::NoResourceName {
                kind: "network interface",
                id: id.to_string(),
            })?;

        Ok(InterfaceId {
            subscription_id: parsed.subscription_id,
            resource_group: parsed.resource_group,
            name,
        })
    }
}
