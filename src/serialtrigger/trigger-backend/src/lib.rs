// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Hardware access for the monitor loop.

#[cfg(unix)]
mod tty;

#[cfg(unix)]
pub use tty::TtyPort;
