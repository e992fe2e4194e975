// SPDX-FileCopyrightText: 2025 Maciej Borzecki <maciek.borzecki@gmail.com>
//
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::fmt;

use serde;

use crate::arm::types::VirtualMachine;
use crate::conninfo::ConnectionInfo;

/// Remote access protocol used by provisioners.
#[derive(serde::Serialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Ssh,
    WinRm,
}

impl Protocol {
    pub fn for_target(is_windows: bool) -> Self {
        if is_windows {
            Protocol::WinRm
        } else {
            Protocol::Ssh
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Ssh => "ssh",
            Protocol::WinRm => "winrm",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Describes how provisioners connect to an instance.
#[derive(serde::Serialize, Debug, Clone, PartialEq)]
pub struct ConnectionDescriptor {
    #[serde(rename = "type")]
    pub protocol: Protocol,
    /// Address to connect to, empty if none is known.
    pub host: String,
}

impl ConnectionDescriptor {
    pub fn to_map(&self) -> HashMap<String, String> {
        HashMap::from([
            ("type".to_string(), self.protocol.to_string()),
            ("host".to_string(), self.host.clone()),
        ])
    }

    /// Render as key=value lines, suitable for sourcing from a shell.
    pub fn to_env(&self) -> String {
        format!("type={}\nhost={}\n", self.protocol, self.host)
    }
}

/// Destination of connection details read by provisioners.
pub trait ConnectionSlot {
    /// Replace the connection details.
    fn set_conn_info(&mut self, info: HashMap<String, String>);
}

impl ConnectionSlot for HashMap<String, String> {
    fn set_conn_info(&mut self, info: HashMap<String, String>) {
        *self = info;
    }
}

/// Select the address to connect to, a public address is preferred over a
/// private one.
pub fn publish(info: &ConnectionInfo, is_windows: bool) -> ConnectionDescriptor {
    let host = if !info.primary_public_address.is_empty() {
        &info.primary_public_address
    } else {
        &info.primary_private_address
    };

    ConnectionDescriptor {
        protocol: Protocol::for_target(is_windows),
        host: host.clone(),
    }
}

/// Publish connection details into the slot.
pub fn publish_to(
    slot: &mut dyn ConnectionSlot,
    info: &ConnectionInfo,
    is_windows: bool,
) -> ConnectionDescriptor {
    let desc = publish(info, is_windows);
    log::debug!("connection info: {:?}", desc);
    slot.set_conn_info(desc.to_map());
    desc
}

/// Whether a virtual machine runs Windows.
pub fn is_windows(vm: &VirtualMachine) -> bool {
    let Some(props) = vm.properties.as_ref() else {
        return false;
    };

    let has_windows_config = props
        .os_profile
        .as_ref()
        .is_some_and(|os| os.windows_configuration.is_some());

    let windows_disk = props
        .storage_profile
        .as_ref()
        .and_then(|s| s.os_disk.as_ref())
        .and_then(|d| d.os_type.as_deref())
        .is_some_and(|t| t.eq_ignore_ascii_case("windows"));

    has_windows_config || windows_disk
}
