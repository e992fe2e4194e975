// SPDX-FileCopyrightText: 2024 Maciej Borzecki <maciek.borzecki@gmail.com>
//
// SPDX-License-Identifier: MIT

use core::time;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log;
use serde;
use serde_yml;
use thiserror;

pub const CONFIG_FILE_NAME: &str = "vm-conninfo.yaml";

/// Wraps configuration errors.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("cannot read configuration: {0}")]
    Read(io::Error),
    #[error("cannot load configuration: {0}")]
    Parse(serde_yml::Error),
}

fn default_az() -> String {
    "az".to_string()
}

fn default_endpoint() -> String {
    "https://management.azure.com".to_string()
}

fn default_network_api_version() -> String {
    "2023-09-01".to_string()
}

fn default_compute_api_version() -> String {
    "2024-07-01".to_string()
}

/// Tool configuration.
#[derive(serde::Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Path to the az CLI.
    #[serde(default = "default_az")]
    pub az: String,
    /// Subscription used for lookups, taken from the VM identifier if unset.
    #[serde(default)]
    pub subscription: Option<String>,
    /// Resource Manager endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(rename = "network-api-version", default = "default_network_api_version")]
    pub network_api_version: String,
    #[serde(rename = "compute-api-version", default = "default_compute_api_version")]
    pub compute_api_version: String,
    /// Timeout for the whole resolution, in seconds.
    #[serde(default)]
    pub timeout: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            az: default_az(),
            subscription: None,
            endpoint: default_endpoint(),
            network_api_version: default_network_api_version(),
            compute_api_version: default_compute_api_version(),
            timeout: None,
        }
    }
}

impl Config {
    pub fn timeout(&self) -> Option<time::Duration> {
        self.timeout.map(time::Duration::from_secs)
    }
}

/// Load configuration from the provided reader.
pub fn load<R>(cfg: R) -> Result<Config, ConfigError>
where
    R: io::Read,
{
    let conf: Option<Config> = serde_yml::from_reader(cfg).map_err(ConfigError::Parse)?;
    // a null document carries no settings
    let conf = conf.unwrap_or_default();
    log::debug!("config: {:?}", conf);
    Ok(conf)
}

/// Load configuration from a file.
pub fn load_file(path: &Path) -> Result<Config, ConfigError> {
    log::debug!("loading config from {}", path.display());
    let f = fs::File::open(path).map_err(ConfigError::Read)?;
    load(f)
}

/// Look for a configuration file in the current directory and its parents.
pub fn locate(name: &str) -> Result<Option<PathBuf>, io::Error> {
    let start_dir = env::current_dir().and_then(fs::canonicalize)?;
    Ok(locate_from(&start_dir, name))
}

fn locate_from(start_dir: &Path, name: &str) -> Option<PathBuf> {
    let mut dir = Some(start_dir);

    while let Some(curdir) = dir {
        log::debug!("checking {}", curdir.display());
        let conf = curdir.join(name);
        if conf.exists() {
            log::debug!("found config {}", conf.display());
            return Some(conf);
        }
        dir = curdir.parent();
    }
    None
}
