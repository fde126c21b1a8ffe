// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

mod config;
mod pinout;

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, CommandFactory, Parser};
use tracing::{debug, error, info, warn};

use trigger_app::{init_logging, ConfigFile, ConfigSource};
use trigger_backend::TtyPort;
use trigger_core::controller::{ShellExecutor, WaitStrategy};
use trigger_core::{
    DynResult, InputLine, MonitorLoop, OutputPolicy, RunPolicy, TriggerConfig, TriggerSpec,
    Triggers,
};

use config::{LineConfig, TriggerFileConfig, WaitKind};

const PKG_DESCRIPTION: &str = concat!(
    env!("CARGO_PKG_NAME"),
    " - execute commands on RS-232 control line changes"
);
const AFTER_HELP: &str = "All triggered commands are executed before triggered exits.";

const DCE_HEADING: &str = "Actions on signals from DCE";
const DTE_HEADING: &str = "Output signals from DTE";
const CONTROL_HEADING: &str = "Control";
const HELP_HEADING: &str = "Help and debug";

#[derive(Debug, Parser)]
#[command(
    author = env!("CARGO_PKG_AUTHORS"),
    version = env!("CARGO_PKG_VERSION"),
    about = PKG_DESCRIPTION,
    after_help = AFTER_HELP,
    disable_help_flag = true,
    disable_version_flag = true,
)]
struct Cli {
    /// Execute command on clear to send (CTS)
    #[arg(short = 'c', long = "cts-exec", value_name = "COMMAND", help_heading = DCE_HEADING)]
    cts_exec: Option<String>,
    /// Exit on clear to send (CTS)
    #[arg(short = 'C', long = "cts-exit", help_heading = DCE_HEADING)]
    cts_exit: bool,
    /// Execute command on data carrier detect (DCD)
    #[arg(short = 'a', long = "dcd-exec", value_name = "COMMAND", help_heading = DCE_HEADING)]
    dcd_exec: Option<String>,
    /// Exit on data carrier detect (DCD)
    #[arg(short = 'A', long = "dcd-exit", help_heading = DCE_HEADING)]
    dcd_exit: bool,
    /// Execute command on data set ready (DSR)
    #[arg(short = 's', long = "dsr-exec", value_name = "COMMAND", help_heading = DCE_HEADING)]
    dsr_exec: Option<String>,
    /// Exit on data set ready (DSR)
    #[arg(short = 'S', long = "dsr-exit", help_heading = DCE_HEADING)]
    dsr_exit: bool,
    /// Execute command on ring indicator (RI)
    #[arg(short = 'i', long = "ri-exec", value_name = "COMMAND", help_heading = DCE_HEADING)]
    ri_exec: Option<String>,
    /// Exit on ring indicator (RI)
    #[arg(short = 'I', long = "ri-exit", help_heading = DCE_HEADING)]
    ri_exit: bool,

    /// Set data terminal ready (DTR)
    #[arg(short = 'd', long = "dtr", help_heading = DTE_HEADING)]
    dtr: bool,
    /// Set ready to send (RTS)
    #[arg(short = 'r', long = "rts", help_heading = DTE_HEADING)]
    rts: bool,
    /// Clear data terminal ready (DTR) while executing commands
    #[arg(short = 'D', long = "clear-dtr", help_heading = DTE_HEADING)]
    clear_dtr: bool,
    /// Clear ready to send (RTS) while executing commands
    #[arg(short = 'R', long = "clear-rts", help_heading = DTE_HEADING)]
    clear_rts: bool,

    /// Exit after executing command once
    #[arg(short = 'o', long = "once", help_heading = CONTROL_HEADING)]
    once: bool,
    /// Microseconds to wait before retesting
    #[arg(short = 'w', long = "retest-wait", value_name = "TIME", help_heading = CONTROL_HEADING)]
    retest_wait: Option<u32>,
    /// Poll the lines every MS milliseconds instead of waiting for an interrupt
    #[arg(long = "poll-interval", value_name = "MS", help_heading = CONTROL_HEADING)]
    poll_interval: Option<u64>,
    /// Start over when polling sees no change for MS milliseconds
    #[arg(long = "poll-timeout", value_name = "MS", help_heading = CONTROL_HEADING)]
    poll_timeout: Option<u64>,
    /// Path to configuration file
    #[arg(long = "config", value_name = "FILE", help_heading = CONTROL_HEADING)]
    config: Option<PathBuf>,
    /// Print example configuration and exit
    #[arg(long = "print-config", help_heading = CONTROL_HEADING)]
    print_config: bool,

    /// Display this help text
    #[arg(short = 'h', long = "help", action = ArgAction::Help, help_heading = HELP_HEADING)]
    help: Option<bool>,
    /// Show DB-25 and DE-9 pinout
    #[arg(long = "pinout", help_heading = HELP_HEADING)]
    pinout: bool,
    /// Show debug output (repeat for more verbosity)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, help_heading = HELP_HEADING)]
    verbose: u8,
    /// Show version information
    #[arg(short = 'V', long = "version", action = ArgAction::Version, help_heading = HELP_HEADING)]
    version: Option<bool>,

    /// Serial device to monitor (e.g. /dev/ttyS0)
    #[arg(value_name = "DEVICE")]
    devices: Vec<String>,
}

/// Resolved configuration after merging config file and CLI arguments.
#[derive(Debug)]
struct ResolvedConfig {
    device: Option<String>,
    trigger: TriggerConfig,
}

fn line_trigger(exec: Option<&String>, exit: bool, file: &LineConfig) -> TriggerSpec {
    TriggerSpec {
        command: exec.or(file.exec.as_ref()).cloned(),
        exit_on_assert: exit || file.exit,
    }
}

fn resolve_wait(cli: &Cli, cfg: &TriggerFileConfig) -> WaitStrategy {
    let behavior = &cfg.behavior;
    let polling =
        cli.poll_interval.is_some() || cli.poll_timeout.is_some() || behavior.wait == WaitKind::Poll;
    if !polling {
        return WaitStrategy::Interrupt;
    }
    let interval = cli.poll_interval.unwrap_or(behavior.poll_interval_ms);
    let timeout = cli.poll_timeout.or(behavior.poll_timeout_ms);
    WaitStrategy::poll(
        Duration::from_millis(interval),
        timeout.map(Duration::from_millis),
    )
}

fn resolve_config(cli: &Cli, cfg: &TriggerFileConfig) -> DynResult<ResolvedConfig> {
    let triggers = Triggers {
        cts: line_trigger(cli.cts_exec.as_ref(), cli.cts_exit, &cfg.cts),
        dcd: line_trigger(cli.dcd_exec.as_ref(), cli.dcd_exit, &cfg.dcd),
        dsr: line_trigger(cli.dsr_exec.as_ref(), cli.dsr_exit, &cfg.dsr),
        ri: line_trigger(cli.ri_exec.as_ref(), cli.ri_exit, &cfg.ri),
    };
    let outputs = OutputPolicy {
        assert_dtr: cli.dtr || cfg.outputs.dtr,
        assert_rts: cli.rts || cfg.outputs.rts,
        suppress_dtr_during_command: cli.clear_dtr || cfg.outputs.clear_dtr,
        suppress_rts_during_command: cli.clear_rts || cfg.outputs.clear_rts,
    };
    let run = RunPolicy {
        single_shot: cli.once || cfg.behavior.once,
        retest_delay_us: cli.retest_wait.unwrap_or(cfg.behavior.retest_wait_us),
        retry_delay: Duration::from_millis(cfg.behavior.retry_delay_ms),
        wait: resolve_wait(cli, cfg),
    };

    let trigger = TriggerConfig {
        triggers,
        outputs,
        run,
    };
    trigger
        .validate()
        .map_err(|e| format!("Invalid configuration: {}", e))?;

    // Anything but exactly one positional DEVICE falls back to help, unless
    // none was given and the config file names one.
    let device = match cli.devices.as_slice() {
        [] => cfg.device.clone(),
        [device] => Some(device.clone()),
        _ => None,
    }
    .filter(|d| !d.trim().is_empty());

    Ok(ResolvedConfig { device, trigger })
}

/// Echo the effective configuration and flag setups that cannot work.
fn log_configuration(device: &str, config: &TriggerConfig) {
    for line in InputLine::ALL {
        let spec = config.triggers.get(line);
        if !spec.is_configured() {
            debug!("{} ignored", line);
            continue;
        }
        if let Some(cmd) = &spec.command {
            debug!("{} command: {}", line, cmd);
        }
        if spec.exit_on_assert {
            debug!("{} exit enabled", line);
        }
    }
    debug!(
        "Outputs: assert {}, clear while executing {}",
        config.outputs.asserted(),
        config.outputs.suppressed()
    );
    debug!(
        "Retest wait: {} us, once: {}",
        config.run.retest_delay_us, config.run.single_shot
    );

    for line in config.triggers.unwatched_exits() {
        warn!(
            "{} has an exit flag but no command; its transitions are not watched",
            line
        );
    }
    if config.triggers.watch_mask().is_empty() {
        warn!("No command configured for any line; {} will wait forever", device);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> DynResult<()> {
    let cli = Cli::parse();

    if cli.pinout {
        print!("{}", pinout::PINOUT);
        return Ok(());
    }

    if cli.print_config {
        println!("{}", TriggerFileConfig::example_toml());
        return Ok(());
    }

    let (cfg, source) = TriggerFileConfig::load(cli.config.as_deref())?;
    cfg.validate()
        .map_err(|e| format!("Invalid serialtrigger configuration: {}", e))?;

    init_logging(cfg.log_level.as_deref(), cli.verbose);

    match &source {
        ConfigSource::Defaults {
            without_section, ..
        } => {
            for path in without_section {
                warn!("{} has no [serialtrigger] section, ignored", path.display());
            }
            debug!("Using {}", source);
        }
        _ => info!("Loaded configuration from {}", source),
    }

    let resolved = resolve_config(&cli, &cfg)?;
    let Some(device) = resolved.device else {
        Cli::command().print_help()?;
        return Ok(());
    };
    log_configuration(&device, &resolved.trigger);

    let port = match TtyPort::open(&device) {
        Ok(port) => port,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Starting serialtrigger (device: {}, watching: {}, wait: {})",
        port.path(),
        resolved.trigger.triggers.watch_mask(),
        resolved.trigger.run.wait
    );

    let outcome = MonitorLoop::new(resolved.trigger, port, ShellExecutor::default())
        .run()
        .await;

    info!(
        "Stopped: {} ({} iteration(s), {} command(s), {} port failure(s))",
        outcome.reason, outcome.iterations, outcome.commands_run, outcome.io_failures
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use trigger_core::ControlLines;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("serialtrigger").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_short_flags() {
        let cli = parse(&[
            "-c", "cts.sh", "-A", "-s", "dsr.sh", "-I", "-d", "-R", "-o", "-w", "500", "-vv",
            "/dev/ttyS0",
        ]);
        assert_eq!(cli.cts_exec.as_deref(), Some("cts.sh"));
        assert!(cli.dcd_exit && cli.dcd_exec.is_none());
        assert_eq!(cli.dsr_exec.as_deref(), Some("dsr.sh"));
        assert!(cli.ri_exit);
        assert!(cli.dtr && !cli.rts);
        assert!(!cli.clear_dtr && cli.clear_rts);
        assert!(cli.once);
        assert_eq!(cli.retest_wait, Some(500));
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.devices, vec!["/dev/ttyS0".to_string()]);
    }

    #[test]
    fn test_long_flags() {
        let cli = parse(&[
            "--dcd-exec=logger carrier",
            "--cts-exit",
            "--ri-exec",
            "answer",
            "--rts",
            "--clear-dtr",
            "--retest-wait=0",
            "--verbose",
            "/dev/ttyUSB0",
        ]);
        assert_eq!(cli.dcd_exec.as_deref(), Some("logger carrier"));
        assert!(cli.cts_exit);
        assert_eq!(cli.ri_exec.as_deref(), Some("answer"));
        assert!(cli.rts && cli.clear_dtr);
        assert_eq!(cli.retest_wait, Some(0));
        assert_eq!(cli.verbose, 1);
    }

    #[test]
    fn test_rejects_bad_arguments() {
        assert!(Cli::try_parse_from(["serialtrigger", "--bogus"]).is_err());
        assert!(Cli::try_parse_from(["serialtrigger", "-w", "-5", "/dev/ttyS0"]).is_err());
        assert!(Cli::try_parse_from(["serialtrigger", "-w", "soon", "/dev/ttyS0"]).is_err());
    }

    #[test]
    fn test_help_and_version_are_informational() {
        let err = Cli::try_parse_from(["serialtrigger", "-h"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
        let err = Cli::try_parse_from(["serialtrigger", "-V"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);

        let help = Cli::command().render_help().to_string();
        for heading in [DCE_HEADING, DTE_HEADING, CONTROL_HEADING, HELP_HEADING] {
            assert!(help.contains(heading), "missing heading {}", heading);
        }
        assert!(help.contains(AFTER_HELP));
    }

    #[test]
    fn test_resolve_defaults() {
        let cli = parse(&["/dev/ttyS0"]);
        let resolved = resolve_config(&cli, &TriggerFileConfig::default()).unwrap();
        assert_eq!(resolved.device.as_deref(), Some("/dev/ttyS0"));
        assert_eq!(resolved.trigger, TriggerConfig::default());
        assert!(resolved.trigger.triggers.watch_mask().is_empty());
    }

    #[test]
    fn test_resolve_cli_over_file() {
        let file: TriggerFileConfig = toml::from_str(
            r#"
device = "/dev/ttyS1"

[cts]
exec = "from-file"

[dsr]
exec = "dsr-file"
exit = true

[outputs]
dtr = true

[behavior]
once = true
retest_wait_us = 100
retry_delay_ms = 250
"#,
        )
        .unwrap();
        let cli = parse(&["-c", "from-cli", "-r", "-w", "7", "/dev/ttyS0"]);
        let resolved = resolve_config(&cli, &file).unwrap();
        let trigger = &resolved.trigger;

        assert_eq!(resolved.device.as_deref(), Some("/dev/ttyS0"));
        assert_eq!(trigger.triggers.command(InputLine::Cts), Some("from-cli"));
        assert_eq!(trigger.triggers.command(InputLine::Dsr), Some("dsr-file"));
        assert!(trigger.triggers.dsr.exit_on_assert);
        assert_eq!(
            trigger.outputs.asserted(),
            ControlLines::DTR | ControlLines::RTS
        );
        assert!(trigger.run.single_shot);
        assert_eq!(trigger.run.retest_delay_us, 7);
        assert_eq!(trigger.run.retry_delay, Duration::from_millis(250));
        assert_eq!(trigger.run.wait, WaitStrategy::Interrupt);
    }

    #[test]
    fn test_device_from_file() {
        let file = TriggerFileConfig {
            device: Some("/dev/ttyS3".to_string()),
            ..TriggerFileConfig::default()
        };
        let resolved = resolve_config(&parse(&[]), &file).unwrap();
        assert_eq!(resolved.device.as_deref(), Some("/dev/ttyS3"));

        let resolved = resolve_config(&parse(&[]), &TriggerFileConfig::default()).unwrap();
        assert!(resolved.device.is_none());
    }

    #[test]
    fn test_extra_device_falls_back_to_help() {
        let cli = parse(&["-c", "x", "/dev/ttyS0", "/dev/ttyS1"]);
        assert_eq!(cli.devices.len(), 2);
        let file = TriggerFileConfig {
            device: Some("/dev/ttyS3".to_string()),
            ..TriggerFileConfig::default()
        };
        let resolved = resolve_config(&cli, &file).unwrap();
        assert!(resolved.device.is_none());
    }

    #[test]
    fn test_resolve_poll_strategy() {
        let cli = parse(&["--poll-interval", "10", "/dev/ttyS0"]);
        let resolved = resolve_config(&cli, &TriggerFileConfig::default()).unwrap();
        assert_eq!(
            resolved.trigger.run.wait,
            WaitStrategy::poll(Duration::from_millis(10), None)
        );

        let mut file = TriggerFileConfig::default();
        file.behavior.wait = WaitKind::Poll;
        file.behavior.poll_timeout_ms = Some(2000);
        let resolved = resolve_config(&parse(&["/dev/ttyS0"]), &file).unwrap();
        assert_eq!(
            resolved.trigger.run.wait,
            WaitStrategy::poll(Duration::from_millis(50), Some(Duration::from_secs(2)))
        );
        assert!(resolved.trigger.run.wait.is_bounded());
    }

    #[test]
    fn test_resolve_rejects_zero_poll_interval() {
        let cli = parse(&["--poll-interval", "0", "/dev/ttyS0"]);
        let err = resolve_config(&cli, &TriggerFileConfig::default()).unwrap_err();
        assert!(err.to_string().contains("poll interval"));
    }
}
