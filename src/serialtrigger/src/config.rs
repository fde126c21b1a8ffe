// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Configuration file support for serialtrigger.
//!
//! Config is loaded from the `[serialtrigger]` section of `serialtrigger.toml`.
//! Default search order:
//! 1. Path specified via `--config` CLI argument
//! 2. `./serialtrigger.toml`
//! 3. `~/.config/serialtrigger/serialtrigger.toml`
//! 4. `/etc/serialtrigger/serialtrigger.toml`
//!
//! Command-line options take priority over everything here.

use serde::{Deserialize, Serialize};
use trigger_app::ConfigFile;

/// Top-level configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerFileConfig {
    /// Serial device path (e.g. "/dev/ttyS0")
    pub device: Option<String>,
    /// Log level (trace, debug, info, warn, error), used when no -v is given
    pub log_level: Option<String>,
    /// Clear To Send
    pub cts: LineConfig,
    /// Data Carrier Detect
    pub dcd: LineConfig,
    /// Data Set Ready
    pub dsr: LineConfig,
    /// Ring Indicator
    pub ri: LineConfig,
    /// Output lines driven by us
    pub outputs: OutputsConfig,
    /// Loop behavior
    pub behavior: BehaviorConfig,
}

/// Actions for one input line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LineConfig {
    /// Shell command to execute when the line asserts
    pub exec: Option<String>,
    /// Exit when the line asserts
    pub exit: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputsConfig {
    /// Keep DTR asserted
    pub dtr: bool,
    /// Keep RTS asserted
    pub rts: bool,
    /// Clear DTR while commands execute
    pub clear_dtr: bool,
    /// Clear RTS while commands execute
    pub clear_rts: bool,
}

/// How to wait for line changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitKind {
    /// Block in the driver until a line changes
    #[default]
    Interrupt,
    /// Re-read the lines periodically
    Poll,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Exit after one detection pass
    pub once: bool,
    /// Microseconds to wait before re-reading the lines after a change
    pub retest_wait_us: u32,
    /// Milliseconds to pause after a failed port operation
    pub retry_delay_ms: u64,
    /// Wait strategy
    pub wait: WaitKind,
    /// Milliseconds between reads when polling
    pub poll_interval_ms: u64,
    /// Give up a poll wait after this many milliseconds and start over
    pub poll_timeout_ms: Option<u64>,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            once: false,
            retest_wait_us: 20,
            retry_delay_ms: 1000,
            wait: WaitKind::Interrupt,
            poll_interval_ms: 50,
            poll_timeout_ms: None,
        }
    }
}

impl TriggerFileConfig {
    pub fn validate(&self) -> Result<(), String> {
        validate_log_level(self.log_level.as_deref())?;

        if let Some(device) = &self.device {
            if device.trim().is_empty() {
                return Err("device must not be empty".to_string());
            }
        }
        if self.behavior.retry_delay_ms == 0 {
            return Err("[behavior].retry_delay_ms must be > 0".to_string());
        }
        if self.behavior.wait == WaitKind::Poll && self.behavior.poll_interval_ms == 0 {
            return Err("[behavior].poll_interval_ms must be > 0 when polling".to_string());
        }
        Ok(())
    }

    /// Example configuration for `--print-config`.
    pub fn example_toml() -> String {
        #[derive(serde::Serialize)]
        struct Wrapper {
            #[serde(rename = "serialtrigger")]
            inner: TriggerFileConfig,
        }
        let example = TriggerFileConfig {
            device: Some("/dev/ttyS0".to_string()),
            log_level: Some("info".to_string()),
            cts: LineConfig::default(),
            dcd: LineConfig {
                exec: Some("logger carrier detected".to_string()),
                exit: false,
            },
            dsr: LineConfig::default(),
            ri: LineConfig {
                exec: Some("/usr/local/bin/answer-call".to_string()),
                exit: true,
            },
            outputs: OutputsConfig {
                dtr: true,
                rts: false,
                clear_dtr: true,
                clear_rts: false,
            },
            behavior: BehaviorConfig::default(),
        };
        toml::to_string_pretty(&Wrapper { inner: example }).unwrap_or_default()
    }
}

fn validate_log_level(level: Option<&str>) -> Result<(), String> {
    if let Some(level) = level {
        match level {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(format!(
                    "log_level '{}' is invalid (expected one of: trace, debug, info, warn, error)",
                    level
                ))
            }
        }
    }
    Ok(())
}

impl ConfigFile for TriggerFileConfig {
    fn section_key() -> &'static str {
        "serialtrigger"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TriggerFileConfig::default();
        assert!(config.device.is_none());
        assert!(config.cts.exec.is_none());
        assert!(!config.ri.exit);
        assert!(!config.outputs.dtr);
        assert_eq!(config.behavior.retest_wait_us, 20);
        assert_eq!(config.behavior.retry_delay_ms, 1000);
        assert_eq!(config.behavior.wait, WaitKind::Interrupt);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml_str = r#"
device = "/dev/ttyUSB0"

[dcd]
exec = "true"
"#;

        let config: TriggerFileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.device.as_deref(), Some("/dev/ttyUSB0"));
        assert_eq!(config.dcd.exec.as_deref(), Some("true"));
        assert!(!config.dcd.exit);
        assert_eq!(config.behavior.retest_wait_us, 20);
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
device = "/dev/ttyS1"
log_level = "debug"

[cts]
exec = "echo cts"
exit = true

[ri]
exit = true

[outputs]
dtr = true
rts = true
clear_rts = true

[behavior]
once = true
retest_wait_us = 500
retry_delay_ms = 250
wait = "poll"
poll_interval_ms = 20
poll_timeout_ms = 5000
"#;

        let config: TriggerFileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.cts.exec.as_deref(), Some("echo cts"));
        assert!(config.cts.exit);
        assert!(config.ri.exit && config.ri.exec.is_none());
        assert!(config.outputs.dtr && config.outputs.rts);
        assert!(!config.outputs.clear_dtr && config.outputs.clear_rts);
        assert!(config.behavior.once);
        assert_eq!(config.behavior.retest_wait_us, 500);
        assert_eq!(config.behavior.retry_delay_ms, 250);
        assert_eq!(config.behavior.wait, WaitKind::Poll);
        assert_eq!(config.behavior.poll_interval_ms, 20);
        assert_eq!(config.behavior.poll_timeout_ms, Some(5000));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = TriggerFileConfig {
            log_level: Some("loud".to_string()),
            ..TriggerFileConfig::default()
        };
        assert!(config.validate().unwrap_err().contains("log_level"));

        config.log_level = None;
        config.behavior.retry_delay_ms = 0;
        assert!(config.validate().unwrap_err().contains("retry_delay_ms"));

        config.behavior.retry_delay_ms = 1000;
        config.behavior.wait = WaitKind::Poll;
        config.behavior.poll_interval_ms = 0;
        assert!(config.validate().unwrap_err().contains("poll_interval_ms"));

        config.behavior.wait = WaitKind::Interrupt;
        config.device = Some("  ".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_example_toml_round_trips() {
        let text = TriggerFileConfig::example_toml();
        assert!(text.contains("[serialtrigger]"));
        let table: toml::Table = toml::from_str(&text).unwrap();
        let section = toml::to_string(&table["serialtrigger"]).unwrap();
        let config: TriggerFileConfig = toml::from_str(&section).unwrap();
        assert_eq!(config.device.as_deref(), Some("/dev/ttyS0"));
        assert!(config.ri.exit);
        assert!(config.outputs.clear_dtr);
        assert!(config.validate().is_ok());
    }
}
