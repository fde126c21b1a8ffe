// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Immutable trigger configuration handed to the monitor loop.

use std::time::Duration;

use thiserror::Error;

use crate::controller::policies::WaitStrategy;
use crate::lines::{ControlLines, InputLine};

/// Default debounce delay before re-reading the register.
pub const DEFAULT_RETEST_DELAY_US: u32 = 20;
/// Default pause after a failed port operation.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TriggerConfigError {
    #[error("poll interval must be greater than zero")]
    ZeroPollInterval,

    #[error("retry delay must be greater than zero")]
    ZeroRetryDelay,
}

/// What to do when one input line asserts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerSpec {
    /// Shell command to run, passed verbatim to the executor.
    pub command: Option<String>,
    /// Terminate after this iteration's commands when the line is asserted.
    pub exit_on_assert: bool,
}

impl TriggerSpec {
    pub fn exec(command: impl Into<String>) -> Self {
        Self {
            command: Some(command.into()),
            exit_on_assert: false,
        }
    }

    pub fn exit() -> Self {
        Self {
            command: None,
            exit_on_assert: true,
        }
    }

    pub fn with_exit(mut self) -> Self {
        self.exit_on_assert = true;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.command.is_some() || self.exit_on_assert
    }
}

/// Per-line triggers for CTS, DCD, DSR and RI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Triggers {
    pub cts: TriggerSpec,
    pub dcd: TriggerSpec,
    pub dsr: TriggerSpec,
    pub ri: TriggerSpec,
}

impl Triggers {
    pub fn get(&self, line: InputLine) -> &TriggerSpec {
        match line {
            InputLine::Cts => &self.cts,
            InputLine::Dcd => &self.dcd,
            InputLine::Dsr => &self.dsr,
            InputLine::Ri => &self.ri,
        }
    }

    /// Command configured for `line`, if any.
    pub fn command(&self, line: InputLine) -> Option<&str> {
        self.get(line).command.as_deref()
    }

    /// Lines the loop waits on.
    ///
    /// Only lines with a command are watched. A line carrying just an exit
    /// flag never wakes the loop on its own; see [`Triggers::unwatched_exits`].
    pub fn watch_mask(&self) -> ControlLines {
        InputLine::ALL
            .into_iter()
            .filter(|line| self.get(*line).command.is_some())
            .fold(ControlLines::empty(), |mask, line| mask | line.line())
    }

    /// Lines with an exit flag but no command.
    pub fn unwatched_exits(&self) -> Vec<InputLine> {
        InputLine::ALL
            .into_iter()
            .filter(|line| {
                let spec = self.get(*line);
                spec.exit_on_assert && spec.command.is_none()
            })
            .collect()
    }

    /// Next asserted line with a command, strictly after `after` in
    /// evaluation order (from the start when `after` is `None`).
    pub fn next_triggered(&self, lines: ControlLines, after: Option<InputLine>) -> Option<InputLine> {
        let start = after
            .and_then(|prev| InputLine::ALL.iter().position(|l| *l == prev))
            .map_or(0, |idx| idx + 1);
        InputLine::ALL[start..]
            .iter()
            .copied()
            .find(|line| line.is_asserted(lines) && self.get(*line).command.is_some())
    }

    /// First asserted line with its exit flag set, in evaluation order.
    pub fn exit_line(&self, lines: ControlLines) -> Option<InputLine> {
        InputLine::ALL
            .into_iter()
            .find(|line| line.is_asserted(lines) && self.get(*line).exit_on_assert)
    }
}

/// Persistent output lines and which of them to drop while a command runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputPolicy {
    pub assert_dtr: bool,
    pub assert_rts: bool,
    pub suppress_dtr_during_command: bool,
    pub suppress_rts_during_command: bool,
}

impl OutputPolicy {
    /// Lines OR-ed into the register at the start of every iteration.
    pub fn asserted(&self) -> ControlLines {
        let mut lines = ControlLines::empty();
        lines.set(ControlLines::DTR, self.assert_dtr);
        lines.set(ControlLines::RTS, self.assert_rts);
        lines
    }

    /// Lines cleared before running a command.
    pub fn suppressed(&self) -> ControlLines {
        let mut lines = ControlLines::empty();
        lines.set(ControlLines::DTR, self.suppress_dtr_during_command);
        lines.set(ControlLines::RTS, self.suppress_rts_during_command);
        lines
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPolicy {
    /// Terminate after one complete pass.
    pub single_shot: bool,
    /// Debounce delay between a detected change and the re-read.
    pub retest_delay_us: u32,
    /// Pause after a failed port operation.
    pub retry_delay: Duration,
    pub wait: WaitStrategy,
}

impl RunPolicy {
    pub fn retest_delay(&self) -> Duration {
        Duration::from_micros(u64::from(self.retest_delay_us))
    }
}

impl Default for RunPolicy {
    fn default() -> Self {
        Self {
            single_shot: false,
            retest_delay_us: DEFAULT_RETEST_DELAY_US,
            retry_delay: DEFAULT_RETRY_DELAY,
            wait: WaitStrategy::Interrupt,
        }
    }
}

/// Everything the monitor loop needs, built once before it starts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerConfig {
    pub triggers: Triggers,
    pub outputs: OutputPolicy,
    pub run: RunPolicy,
}

impl TriggerConfig {
    pub fn validate(&self) -> Result<(), TriggerConfigError> {
        if self.run.retry_delay.is_zero() {
            return Err(TriggerConfigError::ZeroRetryDelay);
        }
        if let WaitStrategy::Poll { interval, .. } = self.run.wait {
            if interval.is_zero() {
                return Err(TriggerConfigError::ZeroPollInterval);
            }
        }
        Ok(())
    }
}
