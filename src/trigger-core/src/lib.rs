// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

pub mod controller;
pub mod lines;
pub mod port;
pub mod trigger;

pub type DynResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub use controller::{MonitorLoop, RunOutcome, StopReason};
pub use lines::{ControlLines, InputLine};
pub use port::{ControlPort, PortError, PortOp, PortResult};
pub use trigger::{OutputPolicy, RunPolicy, TriggerConfig, TriggerConfigError, TriggerSpec, Triggers};
