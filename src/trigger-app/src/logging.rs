// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Pick the log level from the `-v` count, falling back to a configured
/// level name. With neither, only warnings and errors are shown.
pub fn log_level(configured: Option<&str>, verbosity: u8) -> Level {
    match verbosity {
        0 => configured
            .and_then(|s| s.parse::<Level>().ok())
            .unwrap_or(Level::WARN),
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Initialize logging to stdout.
pub fn init_logging(configured: Option<&str>, verbosity: u8) {
    FmtSubscriber::builder()
        .with_target(false)
        .with_max_level(log_level(configured, verbosity))
        .init();
}
