// SPDX-FileCopyrightText: 2024 Maciej Borzecki <maciek.borzecki@gmail.com>
//
// SPDX-License-Identifier: MIT

use core::time;
use std::io::{self, Read};
#[cfg(unix)]
use std::os::unix::process::CommandExt;
use std::process::{Child, Command, Stdio};
use std::thread;

use log;
use serde_json;
use thiserror;

use crate::arm::types::{NetworkInterface, VirtualMachine};
use crate::config::Config;
use crate::lookup::{Context, ContextError, InterfaceLookup, LookupError};

pub struct AzCommand(Command);

/// Builds az command line.
pub struct AzCommandBuilder<'a> {
    binary: &'a str,
    args: Vec<&'a str>,
}

impl<'a> AzCommandBuilder<'a> {
    pub fn new(binary: &'a str) -> Self {
        Self {
            binary,
            args: Vec::new(),
        }
    }

    pub fn args(mut self, args: &[&'a str]) -> Self {
        self.args.extend_from_slice(args);
        self
    }

    pub fn build(self) -> AzCommand {
        let mut cmd = Command::new(self.binary);
        cmd.args(self.args);
        AzCommand(cmd)
    }
}

/// Wraps az command runner errors.
#[derive(thiserror::Error, Debug)]
pub enum AzRunnerError {
    #[error("cannot start az: {0}")]
    Start(io::Error),
    #[error("az command exited with status {exit_code}, stderr:\n{stderr}")]
    Execution { stderr: String, exit_code: i32 },
    #[error("az command interrupted: {0}")]
    Interrupted(ContextError),
}

/// Trait representing a way to run az command.
pub trait AzRunner {
    fn run(&mut self, ctx: &Context, cmd: AzCommand) -> Result<Vec<u8>, AzRunnerError>;
}

/// Wrapper for running az commands. The command runs in its own process group,
/// the whole group is killed once the context is done.
pub struct AzCommandRunner;

const POLL_INTERVAL: time::Duration = time::Duration::from_millis(50);

fn drain<R: Read + Send + 'static>(src: Option<R>) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut src) = src {
            // a read error leaves whatever was read so far
            let _ = src.read_to_end(&mut buf);
        }
        buf
    })
}

// az is a shell wrapper running python as its child, killing the wrapper alone
// leaves python behind.
#[cfg(unix)]
fn kill_group(child: &Child) {
    let pgid = format!("-{}", child.id());
    match Command::new("kill")
        .args(&["-KILL", "--", pgid.as_str()])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
    {
        Ok(status) if status.success() => {}
        Ok(status) => log::debug!("cannot kill process group {}: {}", pgid, status),
        Err(err) => log::debug!("cannot run kill: {}", err),
    }
}

fn kill(child: &mut Child) {
    #[cfg(unix)]
    kill_group(child);

    if let Err(err) = child.kill() {
        log::debug!("cannot kill az: {}", err);
    }
    let _ = child.wait();
}

impl AzRunner for AzCommandRunner {
    /// Runs a command returning its output (stdout).
    fn run(&mut self, ctx: &Context, azcmd: AzCommand) -> Result<Vec<u8>, AzRunnerError> {
        let AzCommand(mut cmd) = azcmd;

        log::trace!(
            "running az with: {:?}",
            cmd.get_args()
                .map(|a| a.to_string_lossy())
                .collect::<Vec<_>>()
        );

        if let Some(err) = ctx.err() {
            return Err(AzRunnerError::Interrupted(err));
        }

        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(AzRunnerError::Start)?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {}
                Err(err) => {
                    kill(&mut child);
                    return Err(AzRunnerError::Start(err));
                }
            }

            if let Some(err) = ctx.err() {
                log::debug!("interrupting az: {}", err);
                kill(&mut child);
                return Err(AzRunnerError::Interrupted(err));
            }

            thread::sleep(POLL_INTERVAL);
        };

        let stdout = stdout.join().unwrap_or_default();
        let stderr = stderr.join().unwrap_or_default();

        if !status.success() {
            return Err(AzRunnerError::Execution {
                stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
                exit_code: status.code().unwrap_or(255),
            });
        }
        Ok(stdout)
    }
}

/// Fetches resources from Azure Resource Manager using 'az rest'.
pub struct AzClient<R>
where
    R: AzRunner,
{
    runner: R,
    binary: String,
    endpoint: String,
    subscription: String,
    network_api_version: String,
    compute_api_version: String,
}

fn is_not_found(stderr: &str) -> bool {
    stderr.contains("ResourceNotFound")
        || stderr.contains("(NotFound)")
        || stderr.contains("Not Found")
}

impl<R> AzClient<R>
where
    R: AzRunner,
{
    pub fn new(runner: R, conf: &Config, subscription: &str) -> Self {
        Self {
            runner,
            binary: conf.az.clone(),
            endpoint: conf.endpoint.trim_end_matches('/').to_string(),
            subscription: subscription.to_string(),
            network_api_version: conf.network_api_version.clone(),
            compute_api_version: conf.compute_api_version.clone(),
        }
    }

    // Consume self and return the underlying runner, for tests.
    #[cfg(test)]
    fn test_into_runner(self) -> R {
        self.runner
    }

    fn resource_url(&self, resource_group: &str, resource: &str, api_version: &str) -> String {
        format!(
            "{}/subscriptions/{}/resourceGroups/{}/providers/{}?api-version={}",
            self.endpoint, self.subscription, resource_group, resource, api_version
        )
    }

    fn get_json<T>(&mut self, ctx: &Context, url: &str, what: &str) -> Result<T, LookupError>
    where
        T: serde::de::DeserializeOwned,
    {
        let output = self
            .runner
            .run(
                ctx,
                AzCommandBuilder::new(&self.binary)
                    .args(&["rest", "--method", "get", "--url", url])
                    .build(),
            )
            .map_err(|e| match &e {
                AzRunnerError::Interrupted(err) => LookupError::Context(*err),
                AzRunnerError::Execution { stderr, .. } if is_not_found(stderr) => {
                    LookupError::NotFound(what.to_string())
                }
                _ => LookupError::Command(e.to_string()),
            })?;

        serde_json::from_slice::<T>(&output).map_err(LookupError::Decode)
    }

    /// Fetch a virtual machine.
    pub fn get_virtual_machine(
        &mut self,
        ctx: &Context,
        resource_group: &str,
        name: &str,
    ) -> Result<VirtualMachine, LookupError> {
        log::debug!("get virtual machine {}/{}", resource_group, name);

        let url = self.resource_url(
            resource_group,
            &format!("Microsoft.Compute/virtualMachines/{}", name),
            &self.compute_api_version,
        );
        self.get_json(ctx, &url, &format!("{}/{}", resource_group, name))
    }
}

impl<R> InterfaceLookup for AzClient<R>
where
    R: AzRunner,
{
    fn get(
        &mut self,
        ctx: &Context,
        resource_group: &str,
        name: &str,
    ) -> Result<NetworkInterface, LookupError> {
        log::debug!("get network interface {}/{}", resource_group, name);

        // expand public IPs so that their addresses come along
        let url = format!(
            "{}&$expand=ipConfigurations/publicIPAddress",
            self.resource_url(
                resource_group,
                &format!("Microsoft.Network/networkInterfaces/{}", name),
                &self.network_api_version,
            )
        );
        self.get_json(ctx, &url, &format!("{}/{}", resource_group, name))
    }
}
