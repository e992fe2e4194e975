// SPDX-FileCopyrightText: 2024 Maciej Borzecki <maciek.borzecki@gmail.com>
//
// SPDX-License-Identifier: MIT

use core::time;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context as _, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log;
use simple_logger;

use vm_conninfo::arm::types::VirtualMachine;
use vm_conninfo::lookup::Context;
use vm_conninfo::resourceid::ResourceId;
use vm_conninfo::{az, config, conninfo, provisioner};

/// Find the address provisioners use to reach an Azure virtual machine.
#[derive(Parser, Debug)]
#[command(name = "vm-conninfo", version = env!("BUILD_GIT_VERSION"))]
struct Cli {
    /// Configuration file, looked up in the current directory and its
    /// parents by default.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Subscription for lookups, overrides configuration.
    #[arg(long, global = true)]
    subscription: Option<String>,
    /// Give up after this many seconds.
    #[arg(long, global = true)]
    timeout: Option<u64>,
    /// More verbose logging, may be repeated.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    action: Action,
}

#[derive(clap::Args, Debug)]
struct Target {
    /// Read the virtual machine from a JSON file ('-' for stdin).
    #[arg(
        long,
        conflicts_with_all = ["resource_group", "name"],
        required_unless_present_all = ["resource_group", "name"]
    )]
    vm_file: Option<PathBuf>,
    /// Resource group of the virtual machine.
    #[arg(short = 'g', long, requires = "name")]
    resource_group: Option<String>,
    /// Name of the virtual machine.
    #[arg(short, long, requires = "resource_group")]
    name: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
enum Format {
    Json,
    Env,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Print the connection details for provisioners.
    Resolve {
        #[command(flatten)]
        target: Target,
        /// Connect using WinRM regardless of the OS of the machine.
        #[arg(long, conflicts_with = "posix")]
        windows: bool,
        /// Connect using SSH regardless of the OS of the machine.
        #[arg(long)]
        posix: bool,
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },
    /// Print all addresses of the machine.
    Addresses {
        #[command(flatten)]
        target: Target,
    },
}

fn log_level(verbose: u8) -> log::Level {
    match verbose {
        0 => log::Level::Warn,
        1 => log::Level::Info,
        2 => log::Level::Debug,
        _ => log::Level::Trace,
    }
}

fn load_config(path: Option<&Path>) -> Result<config::Config> {
    let path = match path {
        Some(path) => Some(path.to_path_buf()),
        None => config::locate(config::CONFIG_FILE_NAME).context("cannot locate config file")?,
    };

    match path {
        Some(path) => config::load_file(&path)
            .with_context(|| format!("cannot load config file {}", path.display())),
        None => {
            log::debug!("no config file, using defaults");
            Ok(config::Config::default())
        }
    }
}

fn read_vm(path: &Path) -> Result<VirtualMachine> {
    let vm: serde_json::Result<VirtualMachine> = if path == Path::new("-") {
        serde_json::from_reader(io::stdin().lock())
    } else {
        let f = fs::File::open(path)
            .with_context(|| format!("cannot open {}", path.display()))?;
        serde_json::from_reader(io::BufReader::new(f))
    };
    vm.context("cannot parse virtual machine JSON")
}

/// Pick the subscription for lookups, falling back to the one the virtual
/// machine lives in.
fn subscription_for(
    cli: Option<&str>,
    conf: &config::Config,
    vm_id: Option<&str>,
) -> Option<String> {
    cli.map(str::to_string)
        .or_else(|| conf.subscription.clone())
        .or_else(|| {
            vm_id
                .and_then(|id| ResourceId::parse(id).ok())
                .map(|id| id.subscription_id)
        })
}

/// Render connection details for provisioners reading our output.
fn render(desc: &provisioner::ConnectionDescriptor, format: Format) -> Result<String> {
    if desc.host.is_empty() {
        bail!("no address available to connect");
    }

    match format {
        Format::Json => serde_json::to_string(desc)
            .map(|s| s + "\n")
            .context("cannot encode connection info"),
        Format::Env => Ok(desc.to_env()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    simple_logger::init_with_level(log_level(cli.verbose)).context("cannot set up logging")?;

    let conf = load_config(cli.config.as_deref())?;

    let ctx = match cli
        .timeout
        .map(time::Duration::from_secs)
        .or_else(|| conf.timeout())
    {
        Some(timeout) => Context::with_timeout(timeout),
        None => Context::background(),
    };

    let target = match &cli.action {
        Action::Resolve { target, .. } => target,
        Action::Addresses { target } => target,
    };

    let (vm, mut client) = match (&target.vm_file, &target.resource_group, &target.name) {
        (Some(path), _, _) => {
            let vm = read_vm(path)?;
            let subscription =
                subscription_for(cli.subscription.as_deref(), &conf, vm.id.as_deref())
                    .context("cannot determine subscription of the virtual machine")?;
            let client = az::AzClient::new(az::AzCommandRunner, &conf, &subscription);
            (vm, client)
        }
        (None, Some(group), Some(name)) => {
            let subscription = subscription_for(cli.subscription.as_deref(), &conf, None)
                .context("no subscription configured")?;
            let mut client = az::AzClient::new(az::AzCommandRunner, &conf, &subscription);
            let vm = client
                .get_virtual_machine(&ctx, group, name)
                .with_context(|| format!("cannot get virtual machine {}/{}", group, name))?;
            (vm, client)
        }
        _ => return Err(anyhow!("no virtual machine given")),
    };

    let info = conninfo::resolve(&ctx, &mut client, vm.network_profile());

    match cli.action {
        Action::Resolve {
            windows,
            posix,
            format,
            ..
        } => {
            let is_windows = if windows {
                true
            } else if posix {
                false
            } else {
                provisioner::is_windows(&vm)
            };

            let desc = provisioner::publish(&info, is_windows);
            print!("{}", render(&desc, format)?);
        }
        Action::Addresses { .. } => {
            println!(
                "{}",
                serde_json::to_string_pretty(&info).context("cannot encode addresses")?
            );
        }
    }

    Ok(())
}
