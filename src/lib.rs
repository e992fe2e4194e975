// SPDX-FileCopyrightText: 2025 Maciej Borzecki <maciek.borzecki@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Resolve the addresses of Azure virtual machines for provisioners.

pub mod arm;
pub mod az;
pub mod config;
pub mod conninfo;
pub mod lookup;
pub mod provisioner;
pub mod resourceid;
