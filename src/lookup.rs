// SPDX-FileCopyrightText: 2025 Maciej Borzecki <maciek.borzecki@gmail.com>
//
// SPDX-License-Identifier: MIT

use core::time;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use thiserror;

use crate::arm::types::NetworkInterface;

/// Why a context is done.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum ContextError {
    #[error("context cancelled")]
    Cancelled,
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Carries cancellation and an optional deadline across lookups. Clones share
/// the cancellation state.
#[derive(Debug, Clone)]
pub struct Context {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never done unless cancelled.
    pub fn background() -> Self {
        Context {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: None,
        }
    }

    /// A context done once the timeout elapses. A timeout too large to be
    /// represented means no deadline.
    pub fn with_timeout(timeout: time::Duration) -> Self {
        Context {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn err(&self) -> Option<ContextError> {
        if self.cancelled.load(Ordering::SeqCst) {
            return Some(ContextError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }
}

/// Wraps interface lookup errors.
#[derive(thiserror::Error, Debug)]
pub enum LookupError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error("network interface {0} not found")]
    NotFound(String),
    #[error("cannot execute lookup: {0}")]
    Command(String),
    #[error("cannot decode network interface: {0}")]
    Decode(serde_json::Error),
}

impl PartialEq for LookupError {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}

/// A client fetching network interfaces by resource group and name.
pub trait InterfaceLookup {
    /// Fetch a network interface, with its public IP addresses resolved.
    fn get(
        &mut self,
        ctx: &Context,
        resource_group: &str,
        name: &str,
    ) -> Result<NetworkInterface, LookupError>;
}
