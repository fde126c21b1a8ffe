// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Simulated control port for development and testing.
//!
//! Holds the register in memory and replays a script of line changes on
//! each wait. No hardware required. Clones share the same device, so a test
//! can keep one handle to inspect or poke the register while the monitor
//! loop owns another.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

use crate::lines::ControlLines;
use crate::port::{ControlPort, PortError, PortFuture, PortOp};

/// One scripted outcome of `wait_for_change`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimStep {
    /// Input lines become exactly these, then the wait returns.
    Change(ControlLines),
    /// The wait fails.
    Fail,
}

/// Journal entry recorded for every port operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimOp {
    Read(ControlLines),
    Write(ControlLines),
    Wait(ControlLines),
}

#[derive(Debug)]
struct SimDevice {
    register: ControlLines,
    script: VecDeque<SimStep>,
    read_failures: u32,
    write_failures: u32,
    journal: Vec<SimOp>,
}

#[derive(Debug, Clone)]
pub struct SimulatedPort {
    device: Arc<Mutex<SimDevice>>,
    changed: Arc<Notify>,
}

impl SimulatedPort {
    pub fn new(initial: ControlLines) -> Self {
        Self {
            device: Arc::new(Mutex::new(SimDevice {
                register: initial,
                script: VecDeque::new(),
                read_failures: 0,
                write_failures: 0,
                journal: Vec::new(),
            })),
            changed: Arc::new(Notify::new()),
        }
    }

    pub fn with_script(self, steps: impl IntoIterator<Item = SimStep>) -> Self {
        self.device().script.extend(steps);
        self
    }

    fn device(&self) -> MutexGuard<'_, SimDevice> {
        self.device.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make the next `count` register reads fail.
    pub fn fail_reads(&self, count: u32) {
        self.device().read_failures = count;
    }

    /// Make the next `count` register writes fail.
    pub fn fail_writes(&self, count: u32) {
        self.device().write_failures = count;
    }

    /// Drive the input lines from outside, waking a pending unscripted wait.
    pub fn set_inputs(&self, inputs: ControlLines) {
        {
            let mut dev = self.device();
            dev.register = dev.register.difference(ControlLines::INPUTS) | inputs.inputs();
        }
        self.changed.notify_one();
    }

    /// Current register value, without touching the journal.
    pub fn register(&self) -> ControlLines {
        self.device().register
    }

    pub fn journal(&self) -> Vec<SimOp> {
        self.device().journal.clone()
    }

    /// Every value written so far, in order.
    pub fn writes(&self) -> Vec<ControlLines> {
        self.device()
            .journal
            .iter()
            .filter_map(|op| match op {
                SimOp::Write(lines) => Some(*lines),
                _ => None,
            })
            .collect()
    }

    pub fn wait_count(&self) -> usize {
        self.device()
            .journal
            .iter()
            .filter(|op| matches!(op, SimOp::Wait(_)))
            .count()
    }
}

impl Default for SimulatedPort {
    fn default() -> Self {
        Self::new(ControlLines::empty())
    }
}

impl ControlPort for SimulatedPort {
    fn read_lines<'a>(&'a mut self) -> PortFuture<'a, ControlLines> {
        let result = {
            let mut dev = self.device();
            if dev.read_failures > 0 {
                dev.read_failures -= 1;
                Err(PortError::io(
                    PortOp::ReadLines,
                    io::Error::other("simulated read failure"),
                ))
            } else {
                let lines = dev.register;
                dev.journal.push(SimOp::Read(lines));
                Ok(lines)
            }
        };
        Box::pin(std::future::ready(result))
    }

    fn write_lines<'a>(&'a mut self, lines: ControlLines) -> PortFuture<'a, ()> {
        let result = {
            let mut dev = self.device();
            if dev.write_failures > 0 {
                dev.write_failures -= 1;
                Err(PortError::io(
                    PortOp::WriteLines,
                    io::Error::other("simulated write failure"),
                ))
            } else {
                // Input lines are driven by the far end; a write cannot change them.
                dev.register = dev.register.inputs() | lines.difference(ControlLines::INPUTS);
                dev.journal.push(SimOp::Write(lines));
                Ok(())
            }
        };
        Box::pin(std::future::ready(result))
    }

    fn wait_for_change<'a>(&'a mut self, mask: ControlLines) -> PortFuture<'a, ()> {
        Box::pin(async move {
            let (step, before) = {
                let mut dev = self.device();
                dev.journal.push(SimOp::Wait(mask));
                (dev.script.pop_front(), dev.register.intersection(mask))
            };
            match step {
                Some(SimStep::Change(inputs)) => {
                    let mut dev = self.device();
                    dev.register = dev.register.difference(ControlLines::INPUTS) | inputs.inputs();
                    Ok(())
                }
                Some(SimStep::Fail) => Err(PortError::io(
                    PortOp::WaitForChange,
                    io::Error::other("simulated wait failure"),
                )),
                None => loop {
                    self.changed.notified().await;
                    let now = self.device().register.intersection(mask);
                    if now != before {
                        return Ok(());
                    }
                },
            }
        })
    }
}
