// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! States of the monitor loop.
//!
//! One iteration runs `AssertingOutputs -> Waiting -> Debouncing ->
//! Evaluating -> (Acting ...) -> EvaluatingExit`, then either loops back or
//! ends in `Terminating`. Port failures anywhere send the loop back to
//! `AssertingOutputs` after a backoff.

use std::fmt;

use crate::lines::{ControlLines, InputLine};

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// An asserted line had its exit flag set.
    ExitLine(InputLine),
    /// Single-shot mode completed its one pass.
    SingleShot,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExitLine(line) => write!(f, "{} asserted", line),
            Self::SingleShot => write!(f, "single pass complete"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// OR the persistent outputs into the register.
    AssertingOutputs,
    /// Block until a watched line changes.
    Waiting,
    /// Settle, then take a fresh snapshot.
    Debouncing,
    /// Pick the first command to run from the snapshot.
    Evaluating(ControlLines),
    /// Run the command for `line`; `lines` is the snapshot being evaluated.
    Acting {
        lines: ControlLines,
        line: InputLine,
    },
    /// All commands done; check the exit flags against the same snapshot.
    EvaluatingExit(ControlLines),
    Terminating(StopReason),
}

impl fmt::Display for MonitorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AssertingOutputs => write!(f, "AssertingOutputs"),
            Self::Waiting => write!(f, "Waiting"),
            Self::Debouncing => write!(f, "Debouncing"),
            Self::Evaluating(lines) => write!(f, "Evaluating({})", lines),
            Self::Acting { line, .. } => write!(f, "Acting({})", line),
            Self::EvaluatingExit(lines) => write!(f, "EvaluatingExit({})", lines),
            Self::Terminating(reason) => write!(f, "Terminating({})", reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let state = MonitorState::Acting {
            lines: ControlLines::DCD,
            line: InputLine::Dcd,
        };
        assert_eq!(state.to_string(), "Acting(DCD)");
        assert_eq!(
            MonitorState::Evaluating(ControlLines::CTS | ControlLines::RI).to_string(),
            "Evaluating(CTS|RI)"
        );
        assert_eq!(
            MonitorState::Terminating(StopReason::ExitLine(InputLine::Cts)).to_string(),
            "Terminating(CTS asserted)"
        );
    }
}
