// SPDX-FileCopyrightText: 2025 Maciej Borzecki <maciek.borzecki@gmail.com>
//
// SPDX-License-Identifier: MIT

use log;
use serde;

use crate::arm::types::{NetworkInterface, NetworkProfile};
use crate::lookup::{Context, InterfaceLookup};
use crate::resourceid::InterfaceId;

/// Addresses found on a single network interface.
#[derive(Debug, Default, PartialEq)]
pub struct InterfaceAddresses {
    pub private_addresses: Vec<String>,
    pub public_addresses: Vec<String>,
}

/// Addresses of an instance, across all of its network interfaces.
#[derive(serde::Serialize, Debug, Default, Clone, PartialEq)]
pub struct ConnectionInfo {
    /// First private address, or empty.
    pub primary_private_address: String,
    pub private_addresses: Vec<String>,
    /// First public address, or empty.
    pub primary_public_address: String,
    pub public_addresses: Vec<String>,
}

/// Collect the addresses of an interface in the order of its IP
/// configurations. Missing data is omitted, never an error.
pub fn extract_addresses(nic: &NetworkInterface) -> InterfaceAddresses {
    let mut addrs = InterfaceAddresses::default();

    let Some(configs) = nic.ip_configurations() else {
        return addrs;
    };

    for config in configs {
        if let Some(private) = config.private_address() {
            addrs.private_addresses.push(private.to_string());
        }

        match config.public_address() {
            Some(public) if !public.is_empty() => {
                addrs.public_addresses.push(public.to_string());
            }
            _ => {}
        }
    }

    addrs
}

/// Resolve the addresses of all interfaces referenced by a network profile.
///
/// Interfaces which cannot be looked up contribute no addresses. If the
/// context is done, resolution stops and whatever was collected so far is
/// returned.
pub fn resolve(
    ctx: &Context,
    lookup: &mut dyn InterfaceLookup,
    profile: Option<&NetworkProfile>,
) -> ConnectionInfo {
    let Some(refs) = profile.and_then(|p| p.network_interfaces.as_ref()) else {
        log::debug!("no network interfaces");
        return ConnectionInfo::default();
    };

    let mut private_addresses = Vec::new();
    let mut public_addresses = Vec::new();

    for nic_ref in refs {
        if let Some(err) = ctx.err() {
            log::warn!("stopping address resolution: {}", err);
            break;
        }

        let nic_id = match nic_ref.id.as_deref() {
            Some(id) if !id.is_empty() => id,
            _ => continue,
        };

        let id = match InterfaceId::parse(nic_id) {
            Ok(id) => id,
            Err(err) => {
                log::warn!("skipping interface: {}", err);
                continue;
            }
        };

        let nic = match lookup.get(ctx, &id.resource_group, &id.name) {
            Ok(nic) => nic,
            Err(err) => {
                log::warn!("skipping interface {}: {}", nic_id, err);
                continue;
            }
        };

        if nic.ip_configurations().is_none() {
            log::debug!("interface {} has no IP configurations", nic_id);
            continue;
        }

        let found = extract_addresses(&nic);
        log::debug!("interface {}: {:?}", nic_id, found);

        private_addresses.extend(found.private_addresses);
        public_addresses.extend(found.public_addresses);
    }

    ConnectionInfo {
        primary_private_address: private_addresses.first().cloned().unwrap_or_default(),
        private_addresses,
        primary_public_address: public_addresses.first().cloned().unwrap_or_default(),
        public_addresses,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, VecDeque};

    use super::*;
    use crate::arm::types::{
        IpConfiguration, IpConfigurationProperties, NetworkInterfaceProperties,
        NetworkInterfaceReference, PublicIpAddress, PublicIpAddressProperties,
    };
    use crate::lookup::{ContextError, LookupError};

    struct MockLookup {
        seen_calls: VecDeque<(String, String)>,
        nics: HashMap<String, Result<NetworkInterface, LookupError>>,
        // cancelled after this many calls
        cancel_after: Option<usize>,
    }

    impl MockLookup {
        fn new(nics: Vec<(&str, Result<NetworkInterface, LookupError>)>) -> Self {
            Self {
                seen_calls: VecDeque::new(),
                nics: nics
                    .into_iter()
                    .map(|(name, res)| (name.to_string(), res))
                    .collect(),
                cancel_after: None,
            }
        }
    }

    impl InterfaceLookup for MockLookup {
        fn get(
            &mut self,
            ctx: &Context,
            resource_group: &str,
            name: &str,
        ) -> Result<NetworkInterface, LookupError> {
            self.seen_calls
                .push_back((resource_group.to_string(), name.to_string()));

            if Some(self.seen_calls.len()) == self.cancel_after {
                ctx.cancel();
            }

            match self.nics.get(name) {
                Some(Ok(nic)) => Ok(nic.clone()),
                Some(Err(err)) => Err(LookupError::Command(err.to_string())),
                None => Err(LookupError::NotFound(format!("{}/{}", resource_group, name))),
            }
        }
    }

    fn nic_id(name: &str) -> String {
        format!(
            "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.Network/networkInterfaces/{}",
            name
        )
    }

    fn profile(names: &[&str]) -> NetworkProfile {
        NetworkProfile {
            network_interfaces: Some(
                names
                    .iter()
                    .map(|name| NetworkInterfaceReference {
                        id: Some(nic_id(name)),
                        properties: None,
                    })
                    .collect(),
            ),
        }
    }

    fn ipconfig(private: Option<&str>, public: Option<&str>) -> IpConfiguration {
        IpConfiguration {
            name: None,
            properties: Some(IpConfigurationProperties {
                private_ip_address: private.map(str::to_string),
                public_ip_address: public.map(|addr| PublicIpAddress {
                    id: None,
                    properties: Some(PublicIpAddressProperties {
                        ip_address: Some(addr.to_string()),
                    }),
                }),
            }),
        }
    }

    fn nic(configs: Vec<IpConfiguration>) -> NetworkInterface {
        NetworkInterface {
            id: None,
            name: None,
            properties: Some(NetworkInterfaceProperties {
                ip_configurations: Some(configs),
            }),
        }
    }

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_extract_no_configurations() {
        assert_eq!(
            extract_addresses(&NetworkInterface::default()),
            InterfaceAddresses::default()
        );
        assert_eq!(
            extract_addresses(&NetworkInterface {
                properties: Some(NetworkInterfaceProperties {
                    ip_configurations: None
                }),
                ..Default::default()
            }),
            InterfaceAddresses::default()
        );
    }

    #[test]
    fn test_extract_ordered() {
        let n = nic(vec![
            ipconfig(Some("10.0.0.4"), Some("20.0.0.1")),
            ipconfig(None, None),
            IpConfiguration::default(),
            ipconfig(Some("10.0.0.5"), None),
            ipconfig(None, Some("20.0.0.2")),
            // empty public address is dropped
            ipconfig(Some("10.0.0.6"), Some("")),
        ]);
        assert_eq!(
            extract_addresses(&n),
            InterfaceAddresses {
                private_addresses: strings(&["10.0.0.4", "10.0.0.5", "10.0.0.6"]),
                public_addresses: strings(&["20.0.0.1", "20.0.0.2"]),
            }
        );
    }

    #[test]
    fn test_resolve_no_profile() {
        let mut lookup = MockLookup::new(vec![]);
        let ctx = Context::background();

        assert_eq!(
            resolve(&ctx, &mut lookup, None),
            ConnectionInfo::default()
        );
        assert_eq!(
            resolve(&ctx, &mut lookup, Some(&NetworkProfile::default())),
            ConnectionInfo::default()
        );
        assert_eq!(
            resolve(&ctx, &mut lookup, Some(&profile(&[]))),
            ConnectionInfo::default()
        );
        assert!(lookup.seen_calls.is_empty());
    }

    #[test]
    fn test_resolve_ordered() {
        let mut lookup = MockLookup::new(vec![
            ("nic-1", Ok(nic(vec![ipconfig(Some("10.0.0.4"), None)]))),
            (
                "nic-2",
                Ok(nic(vec![ipconfig(Some("10.0.1.4"), Some("20.0.0.1"))])),
            ),
        ]);
        let info = resolve(
            &Context::background(),
            &mut lookup,
            Some(&profile(&["nic-1", "nic-2"])),
        );

        assert_eq!(
            info,
            ConnectionInfo {
                primary_private_address: "10.0.0.4".to_string(),
                private_addresses: strings(&["10.0.0.4", "10.0.1.4"]),
                primary_public_address: "20.0.0.1".to_string(),
                public_addresses: strings(&["20.0.0.1"]),
            }
        );
        assert_eq!(
            lookup.seen_calls,
            VecDeque::from([
                ("rg".to_string(), "nic-1".to_string()),
                ("rg".to_string(), "nic-2".to_string()),
            ])
        );
    }

    #[test]
    fn test_resolve_keeps_duplicates() {
        let mut lookup = MockLookup::new(vec![
            ("nic-1", Ok(nic(vec![ipconfig(Some("10.0.0.4"), None)]))),
            ("nic-2", Ok(nic(vec![ipconfig(Some("10.0.0.4"), None)]))),
        ]);
        let info = resolve(
            &Context::background(),
            &mut lookup,
            Some(&profile(&["nic-1", "nic-2", "nic-1"])),
        );
        assert_eq!(
            info.private_addresses,
            strings(&["10.0.0.4", "10.0.0.4", "10.0.0.4"])
        );
        assert_eq!(info.primary_private_address, "10.0.0.4");
    }

    #[test]
    fn test_resolve_skips_failures() {
        let mut lookup = MockLookup::new(vec![
            (
                "broken",
                Err(LookupError::Command("service unavailable".to_string())),
            ),
            ("no-config", Ok(NetworkInterface::default())),
            ("nic-2", Ok(nic(vec![ipconfig(Some("10.0.1.4"), None)]))),
        ]);

        let mut p = profile(&["missing", "broken", "no-config", "nic-2"]);
        let refs = p.network_interfaces.as_mut().unwrap();
        refs.insert(0, NetworkInterfaceReference::default());
        refs.insert(
            1,
            NetworkInterfaceReference {
                id: Some("".to_string()),
                properties: None,
            },
        );
        refs.insert(
            2,
            NetworkInterfaceReference {
                id: Some("not/a/valid/resource/id".to_string()),
                properties: None,
            },
        );

        let info = resolve(&Context::background(), &mut lookup, Some(&p));
        assert_eq!(
            info,
            ConnectionInfo {
                primary_private_address: "10.0.1.4".to_string(),
                private_addresses: strings(&["10.0.1.4"]),
                primary_public_address: "".to_string(),
                public_addresses: vec![],
            }
        );
        // references without an ID or with a bad one are never looked up
        assert_eq!(lookup.seen_calls.len(), 4);
    }

    #[test]
    fn test_resolve_all_failed() {
        let mut lookup = MockLookup::new(vec![]);
        let info = resolve(
            &Context::background(),
            &mut lookup,
            Some(&profile(&["nic-1", "nic-2"])),
        );
        assert_eq!(info, ConnectionInfo::default());
        assert_eq!(lookup.seen_calls.len(), 2);
    }

    #[test]
    fn test_resolve_cancelled_upfront() {
        let mut lookup = MockLookup::new(vec![(
            "nic-1",
            Ok(nic(vec![ipconfig(Some("10.0.0.4"), None)])),
        )]);
        let ctx = Context::background();
        ctx.cancel();
        assert_eq!(ctx.err(), Some(ContextError::Cancelled));

        let info = resolve(&ctx, &mut lookup, Some(&profile(&["nic-1"])));
        assert_eq!(info, ConnectionInfo::default());
        assert!(lookup.seen_calls.is_empty());
    }

    #[test]
    fn test_resolve_cancelled_partial() {
        let mut lookup = MockLookup::new(vec![
            ("nic-1", Ok(nic(vec![ipconfig(Some("10.0.0.4"), None)]))),
            ("nic-2", Ok(nic(vec![ipconfig(Some("10.0.1.4"), None)]))),
        ]);
        lookup.cancel_after = Some(1);

        let info = resolve(
            &Context::background(),
            &mut lookup,
            Some(&profile(&["nic-1", "nic-2"])),
        );
        assert_eq!(
            info,
            ConnectionInfo {
                primary_private_address: "10.0.0.4".to_string(),
                private_addresses: strings(&["10.0.0.4"]),
                ..Default::default()
            }
        );
        assert_eq!(lookup.seen_calls.len(), 1);
    }

    #[test]
    fn test_resolve_idempotent() {
        let mut lookup = MockLookup::new(vec![
            (
                "nic-1",
                Ok(nic(vec![ipconfig(Some("10.0.0.4"), Some("20.0.0.1"))])),
            ),
            ("nic-2", Ok(nic(vec![ipconfig(Some("10.0.1.4"), None)]))),
        ]);
        let p = profile(&["nic-1", "nic-2"]);
        let ctx = Context::background();

        let first = resolve(&ctx, &mut lookup, Some(&p));
        let second = resolve(&ctx, &mut lookup, Some(&p));
        assert_eq!(first, second);
        assert_eq!(first.primary_public_address, first.public_addresses[0]);
        assert_eq!(first.primary_private_address, first.private_addresses[0]);
    }
}
