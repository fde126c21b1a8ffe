// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Access to a serial device's modem-control register.

use std::fmt;
use std::future::Future;
use std::io;
use std::pin::Pin;

use thiserror::Error;

use crate::lines::ControlLines;

pub mod sim;

/// Operation that touched the register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortOp {
    ReadLines,
    WriteLines,
    WaitForChange,
}

impl fmt::Display for PortOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadLines => write!(f, "read control lines"),
            Self::WriteLines => write!(f, "set control lines"),
            Self::WaitForChange => write!(f, "wait for control line change"),
        }
    }
}

#[derive(Debug, Error)]
pub enum PortError {
    #[error("{0}: no such device")]
    NotFound(String),

    #[error("{0}: permission denied")]
    PermissionDenied(String),

    #[error("{0}: device busy")]
    Busy(String),

    #[error("{path}: {source}")]
    Open { path: String, source: io::Error },

    #[error("Failed to {op}: {source}")]
    Io { op: PortOp, source: io::Error },
}

impl PortError {
    pub fn io(op: PortOp, source: io::Error) -> Self {
        Self::Io { op, source }
    }

    /// Opening the device failed; there is nothing to retry against.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Io { .. })
    }
}

pub type PortResult<T> = Result<T, PortError>;

/// Alias to reduce type complexity in ControlPort.
pub type PortFuture<'a, T> = Pin<Box<dyn Future<Output = PortResult<T>> + Send + 'a>>;

/// An open serial device whose control lines can be read, written and
/// waited upon. Dropping the port releases the device.
pub trait ControlPort: Send {
    /// Read the whole modem-control register.
    fn read_lines<'a>(&'a mut self) -> PortFuture<'a, ControlLines>;

    /// Write a full register value. Callers read-modify-write when only some
    /// lines should change.
    fn write_lines<'a>(&'a mut self, lines: ControlLines) -> PortFuture<'a, ()>;

    /// Block until any line in `mask` transitions. Which line changed is not
    /// reported; re-read the register afterwards.
    fn wait_for_change<'a>(&'a mut self, mask: ControlLines) -> PortFuture<'a, ()>;
}

impl<P: ControlPort + ?Sized> ControlPort for Box<P> {
    fn read_lines<'a>(&'a mut self) -> PortFuture<'a, ControlLines> {
        (**self).read_lines()
    }

    fn write_lines<'a>(&'a mut self, lines: ControlLines) -> PortFuture<'a, ()> {
        (**self).write_lines(lines)
    }

    fn wait_for_change<'a>(&'a mut self, mask: ControlLines) -> PortFuture<'a, ()> {
        (**self).wait_for_change(mask)
    }
}
