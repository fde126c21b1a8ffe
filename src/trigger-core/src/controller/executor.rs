// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Runs triggered commands through the system shell.

use std::fmt;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::process::ExitStatus;

use thiserror::Error;
use tokio::process::Command;

const DEFAULT_SHELL: &str = "/bin/sh";

/// How a command finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Exited(i32),
    Signaled(i32),
}

impl CommandStatus {
    pub fn success(&self) -> bool {
        matches!(self, Self::Exited(0))
    }
}

impl From<ExitStatus> for CommandStatus {
    fn from(status: ExitStatus) -> Self {
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return Self::Signaled(signal);
            }
        }
        Self::Exited(status.code().unwrap_or(-1))
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exited(code) => write!(f, "{}", code),
            Self::Signaled(signal) => write!(f, "killed by signal {}", signal),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("{command}: {source}")]
    Spawn { command: String, source: io::Error },
}

pub type ExecFuture<'a> = Pin<Box<dyn Future<Output = Result<CommandStatus, ExecError>> + Send + 'a>>;

/// Runs one command to completion.
pub trait CommandExecutor: Send {
    fn execute<'a>(&'a mut self, command: &'a str) -> ExecFuture<'a>;
}

/// Executor that hands the command line to `sh -c` with inherited stdio,
/// like `system(3)`.
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    shell: String,
}

impl ShellExecutor {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

impl Default for ShellExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_SHELL)
    }
}

impl CommandExecutor for ShellExecutor {
    fn execute<'a>(&'a mut self, command: &'a str) -> ExecFuture<'a> {
        Box::pin(async move {
            let status = Command::new(&self.shell)
                .arg("-c")
                .arg(command)
                .status()
                .await
                .map_err(|source| ExecError::Spawn {
                    command: command.to_string(),
                    source,
                })?;
            Ok(CommandStatus::from(status))
        })
    }
}
