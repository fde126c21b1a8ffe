// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Monitor controller components.
//!
//! This module contains the control loop that watches the input lines,
//! the states it moves through, the policies that shape its waiting and
//! retrying, and the executor it hands triggered commands to.

pub mod executor;
pub mod machine;
pub mod monitor;
pub mod policies;

pub use executor::{CommandExecutor, CommandStatus, ExecError, ExecFuture, ShellExecutor};
pub use machine::{MonitorState, StopReason};
pub use monitor::{MonitorLoop, RunOutcome};
pub use policies::{FixedDelay, RetryPolicy, WaitStrategy};
