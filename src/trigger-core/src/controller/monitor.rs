// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! The monitor loop: assert outputs, wait for a change, debounce, run the
//! triggered commands, then decide whether to exit.

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, error, info, trace, warn};

use crate::lines::{ControlLines, InputLine};
use crate::port::{ControlPort, PortError, PortResult};
use crate::trigger::TriggerConfig;

use super::executor::CommandExecutor;
use super::machine::{MonitorState, StopReason};
use super::policies::{FixedDelay, RetryPolicy, WaitStrategy};

const TIMER_RESOLUTION: Duration = Duration::from_millis(1);

/// Summary of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    pub reason: StopReason,
    /// Completed passes through `EvaluatingExit`.
    pub iterations: u64,
    /// Port failures that triggered a backoff.
    pub io_failures: u64,
    /// Commands handed to the executor, whatever their result.
    pub commands_run: u64,
}

enum WaitOutcome {
    Changed,
    TimedOut,
}

/// Drives one port and one executor until a stop condition.
///
/// The port is released when the loop finishes, after the register captured
/// at startup has been written back.
pub struct MonitorLoop<P, E> {
    config: TriggerConfig,
    port: P,
    executor: E,
    retry: Box<dyn RetryPolicy>,
    saved: Option<ControlLines>,
    consecutive_failures: u32,
    iterations: u64,
    io_failures: u64,
    commands_run: u64,
}

impl<P: ControlPort, E: CommandExecutor> MonitorLoop<P, E> {
    pub fn new(config: TriggerConfig, port: P, executor: E) -> Self {
        let retry = Box::new(FixedDelay::new(config.run.retry_delay));
        Self {
            config,
            port,
            executor,
            retry,
            saved: None,
            consecutive_failures: 0,
            iterations: 0,
            io_failures: 0,
            commands_run: 0,
        }
    }

    /// Replace the fixed backoff derived from the run policy.
    pub fn with_retry_policy(mut self, policy: impl RetryPolicy + 'static) -> Self {
        self.retry = Box::new(policy);
        self
    }

    /// Run until an exit line asserts or the single pass completes.
    pub async fn run(mut self) -> RunOutcome {
        match self.port.read_lines().await {
            Ok(lines) => {
                debug!("Saved control lines: {}", lines);
                self.saved = Some(lines);
            }
            Err(e) => warn!("Could not save control lines, they will not be restored: {}", e),
        }

        let mut state = MonitorState::AssertingOutputs;
        loop {
            trace!("State: {}", state);
            state = match state {
                MonitorState::Terminating(reason) => {
                    self.restore().await;
                    return RunOutcome {
                        reason,
                        iterations: self.iterations,
                        io_failures: self.io_failures,
                        commands_run: self.commands_run,
                    };
                }
                other => self.step(other).await,
            };
        }
    }

    async fn step(&mut self, state: MonitorState) -> MonitorState {
        match state {
            MonitorState::AssertingOutputs => match self.assert_outputs().await {
                Ok(()) => MonitorState::Waiting,
                Err(e) => self.backoff(e).await,
            },
            MonitorState::Waiting => match self.wait().await {
                Ok(WaitOutcome::Changed) => MonitorState::Debouncing,
                Ok(WaitOutcome::TimedOut) => {
                    trace!("No change before poll timeout");
                    MonitorState::AssertingOutputs
                }
                Err(e) => self.backoff(e).await,
            },
            MonitorState::Debouncing => match self.debounce().await {
                Ok(lines) => MonitorState::Evaluating(lines),
                Err(e) => self.backoff(e).await,
            },
            MonitorState::Evaluating(lines) => self.next_action(lines, None),
            MonitorState::Acting { lines, line } => {
                self.act(line).await;
                self.next_action(lines, Some(line))
            }
            MonitorState::EvaluatingExit(lines) => self.evaluate_exit(lines),
            MonitorState::Terminating(reason) => MonitorState::Terminating(reason),
        }
    }

    async fn assert_outputs(&mut self) -> PortResult<()> {
        let asserted = self.config.outputs.asserted();
        let lines = self.port.read_lines().await?;
        if !asserted.is_empty() {
            debug!("Setting {}", asserted);
        }
        self.port.write_lines(lines | asserted).await
    }

    async fn wait(&mut self) -> PortResult<WaitOutcome> {
        let mask = self.config.triggers.watch_mask();
        match self.config.run.wait {
            WaitStrategy::Interrupt => {
                trace!("Waiting for change on {}", mask);
                self.port.wait_for_change(mask).await?;
                trace!("Wait returned");
                Ok(WaitOutcome::Changed)
            }
            WaitStrategy::Poll { interval, timeout } => {
                trace!("Polling for change on {} every {:?}", mask, interval);
                self.poll_for_change(mask, interval, timeout).await
            }
        }
    }

    async fn poll_for_change(
        &mut self,
        mask: ControlLines,
        interval: Duration,
        timeout: Option<Duration>,
    ) -> PortResult<WaitOutcome> {
        let baseline = self.port.read_lines().await?.intersection(mask);
        let started = Instant::now();
        loop {
            time::sleep(interval).await;
            let now = self.port.read_lines().await?.intersection(mask);
            if now != baseline {
                return Ok(WaitOutcome::Changed);
            }
            if timeout.is_some_and(|limit| started.elapsed() >= limit) {
                return Ok(WaitOutcome::TimedOut);
            }
        }
    }

    async fn debounce(&mut self) -> PortResult<ControlLines> {
        let delay = self.config.run.retest_delay();
        trace!("Retesting after {} us", self.config.run.retest_delay_us);
        retest_sleep(delay).await;
        let lines = self.port.read_lines().await?;
        trace!("Lines after retest: {}", lines);
        Ok(lines)
    }

    fn next_action(&self, lines: ControlLines, after: Option<InputLine>) -> MonitorState {
        match self.config.triggers.next_triggered(lines, after) {
            Some(line) => MonitorState::Acting { lines, line },
            None => MonitorState::EvaluatingExit(lines),
        }
    }

    async fn act(&mut self, line: InputLine) {
        let Some(command) = self.config.triggers.command(line).map(str::to_owned) else {
            return;
        };
        info!("{} triggered, executing {}", line, command);
        self.suppress_outputs().await;
        self.commands_run += 1;
        match self.executor.execute(&command).await {
            Ok(status) if status.success() => info!("Return value: {}", status),
            Ok(status) => warn!("{} returned {}", command, status),
            Err(e) => error!("{}", e),
        }
    }

    /// Drop the outputs the policy wants low while a command runs.
    /// Failures are logged; the command still runs.
    async fn suppress_outputs(&mut self) {
        let suppressed = self.config.outputs.suppressed();
        if suppressed.is_empty() {
            return;
        }
        let lines = match self.port.read_lines().await {
            Ok(lines) => lines,
            Err(e) => {
                warn!("{}", e);
                return;
            }
        };
        debug!("Clearing {}", suppressed);
        if let Err(e) = self.port.write_lines(lines.difference(suppressed)).await {
            warn!("{}", e);
        }
    }

    fn evaluate_exit(&mut self, lines: ControlLines) -> MonitorState {
        self.iterations += 1;
        self.consecutive_failures = 0;
        if let Some(line) = self.config.triggers.exit_line(lines) {
            MonitorState::Terminating(StopReason::ExitLine(line))
        } else if self.config.run.single_shot {
            MonitorState::Terminating(StopReason::SingleShot)
        } else {
            MonitorState::AssertingOutputs
        }
    }

    async fn backoff(&mut self, err: PortError) -> MonitorState {
        self.io_failures += 1;
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        let delay = self.retry.delay(self.consecutive_failures);
        error!("{}; retrying in {:?}", err, delay);
        time::sleep(delay).await;
        MonitorState::AssertingOutputs
    }

    async fn restore(&mut self) {
        let Some(saved) = self.saved else {
            return;
        };
        debug!("Restoring control lines: {}", saved);
        if let Err(e) = self.port.write_lines(saved).await {
            warn!("Failed to restore control lines: {}", e);
        }
    }
}

/// The tokio timer ticks in whole milliseconds, so shorter retest delays
/// sleep the thread instead. The loop is the only task on its runtime.
async fn retest_sleep(delay: Duration) {
    if delay.is_zero() {
        return;
    }
    if delay < TIMER_RESOLUTION {
        std::thread::sleep(delay);
    } else {
        time::sleep(delay).await;
    }
}
