// SPDX-FileCopyrightText: 2025 Maciej Borzecki <maciek.borzecki@gmail.com>
//
// SPDX-License-Identifier: MIT

use std::io;
use std::process::Command;

fn git_describe() -> Result<String, io::Error> {
    let output = Command::new("git")
        .args(&["describe", "--always", "--dirty"])
        .output()?;
    if !output.status.success() {
        return Err(io::Error::other("git describe failed"));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");

    let version = match git_describe() {
        Ok(vers) if !vers.is_empty() => vers,
        _ => env!("CARGO_PKG_VERSION").to_string(),
    };
    println!("cargo:rustc-env=BUILD_GIT_VERSION={}", version);
}
