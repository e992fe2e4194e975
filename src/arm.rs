// SPDX-FileCopyrightText: 2025 Maciej Borzecki <maciek.borzecki@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Azure Resource Manager payloads, only the parts needed to find addresses.
//! Every field is optional, ARM omits whatever is not set.

pub mod types {
    #[derive(serde::Deserialize, Debug, Clone, PartialEq, Default)]
    #[serde(rename_all = "camelCase")]
    pub struct VirtualMachine {
        pub id: Option<String>,
        pub name: Option<String>,
        pub properties: Option<VirtualMachineProperties>,
    }

    #[derive(serde::Deserialize, Debug, Clone, PartialEq, Default)]
    #[serde(rename_all = "camelCase")]
    pub struct VirtualMachineProperties {
        pub network_profile: Option<NetworkProfile>,
        pub os_profile: Option<OsProfile>,
        pub storage_profile: Option<StorageProfile>,
    }

    #[derive(serde::Deserialize, Debug, Clone, PartialEq, Default)]
    #[serde(rename_all = "camelCase")]
    pub struct NetworkProfile {
        pub network_interfaces: Option<Vec<NetworkInterfaceReference>>,
    }

    #[derive(serde::Deserialize, Debug, Clone, PartialEq, Default)]
    pub struct NetworkInterfaceReference {
        pub id: Option<String>,
        pub properties: Option<NetworkInterfaceReferenceProperties>,
    }

    #[derive(serde::Deserialize, Debug, Clone, PartialEq, Default)]
    pub struct NetworkInterfaceReferenceProperties {
        pub primary: Option<bool>,
    }

    #[derive(serde::Deserialize, Debug, Clone, PartialEq, Default)]
    #[serde(rename_all = "camelCase")]
    pub struct OsProfile {
        pub windows_configuration: Option<serde_json::Value>,
        pub linux_configuration: Option<serde_json::Value>,
    }

    #[derive(serde::Deserialize, Debug, Clone, PartialEq, Default)]
    #[serde(rename_all = "camelCase")]
    pub struct StorageProfile {
        pub os_disk: Option<OsDisk>,
    }

    #[derive(serde::Deserialize, Debug, Clone, PartialEq, Default)]
    #[serde(rename_all = "camelCase")]
    pub struct OsDisk {
        pub os_type: Option<String>,
    }

    #[derive(serde::Deserialize, Debug, Clone, PartialEq, Default)]
    pub struct NetworkInterface {
        pub id: Option<String>,
        pub name: Option<String>,
        pub properties: Option<NetworkInterfaceProperties>,
    }

    #[derive(serde::Deserialize, Debug, Clone, PartialEq, Default)]
    #[serde(rename_all = "camelCase")]
    pub struct NetworkInterfaceProperties {
        pub ip_configurations: Option<Vec<IpConfiguration>>,
    }

    #[derive(serde::Deserialize, Debug, Clone, PartialEq, Default)]
    pub struct IpConfiguration {
        pub name: Option<String>,
        pub properties: Option<IpConfigurationProperties>,
    }

    #[derive(serde::Deserialize, Debug, Clone, PartialEq, Default)]
    pub struct IpConfigurationProperties {
        #[serde(rename = "privateIPAddress")]
        pub private_ip_address: Option<String>,
        #[serde(rename = "publicIPAddress")]
        pub public_ip_address: Option<PublicIpAddress>,
    }

    #[derive(serde::Deserialize, Debug, Clone, PartialEq, Default)]
    pub struct PublicIpAddress {
        pub id: Option<String>,
        pub properties: Option<PublicIpAddressProperties>,
    }

    #[derive(serde::Deserialize, Debug, Clone, PartialEq, Default)]
    #[serde(rename_all = "camelCase")]
    pub struct PublicIpAddressProperties {
        pub ip_address: Option<String>,
    }

    impl VirtualMachine {
        pub fn network_profile(&self) -> Option<&NetworkProfile> {
            self.properties.as_ref()?.network_profile.as_ref()
        }
    }

    impl NetworkInterface {
        /// IP configurations, None when the payload carries no list at all.
        pub fn ip_configurations(&self) -> Option<&[IpConfiguration]> {
            self.properties
                .as_ref()?
                .ip_configurations
                .as_deref()
        }
    }

    impl IpConfiguration {
        pub fn private_address(&self) -> Option<&str> {
            self.properties.as_ref()?.private_ip_address.as_deref()
        }

        pub fn public_address(&self) -> Option<&str> {
            self.properties
                .as_ref()?
                .public_ip_address
                .as_ref()?
                .properties
                .as_ref()?
                .ip_address
                .as_deref()
        }
    }
}
