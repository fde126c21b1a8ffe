// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Monitor loop policies for retry and waiting behavior.
//!
//! This module provides the policies that control how the monitor loop
//! pauses after port failures and how it waits for line transitions.

use std::fmt;
use std::time::Duration;

/// Policy for pausing after a failed port operation.
pub trait RetryPolicy: Send + Sync {
    /// Delay before retrying, given the number of consecutive failures so far
    /// (1 for the first).
    fn delay(&self, attempt: u32) -> Duration;
}

/// Fixed delay retry policy.
///
/// Uses a constant delay between retries, however many there were.
#[derive(Debug, Clone)]
pub struct FixedDelay {
    delay: Duration,
}

impl FixedDelay {
    /// Create a new fixed delay policy.
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for FixedDelay {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl RetryPolicy for FixedDelay {
    fn delay(&self, _attempt: u32) -> Duration {
        self.delay
    }
}

/// How the loop blocks until a watched line transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitStrategy {
    /// Sleep in the driver until it reports a transition. Never times out.
    #[default]
    Interrupt,
    /// Re-read the register every `interval` until a watched line differs
    /// from the value seen when waiting began. With a `timeout`, give up
    /// after that long and start the iteration over.
    Poll {
        interval: Duration,
        timeout: Option<Duration>,
    },
}

impl WaitStrategy {
    pub fn poll(interval: Duration, timeout: Option<Duration>) -> Self {
        Self::Poll { interval, timeout }
    }

    /// Whether a wait can end without a transition.
    pub fn is_bounded(&self) -> bool {
        matches!(self, Self::Poll { timeout: Some(_), .. })
    }
}

impl fmt::Display for WaitStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interrupt => write!(f, "interrupt"),
            Self::Poll {
                interval,
                timeout: None,
            } => write!(f, "poll every {:?}", interval),
            Self::Poll {
                interval,
                timeout: Some(timeout),
            } => write!(f, "poll every {:?} for up to {:?}", interval, timeout),
        }
    }
}
