mod cli;
mod error_fmt;
mod run;

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use alarm_core::error::{AlarmError, Report, Result};
use clap::Parser;
use eyre::WrapErr;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    if !cli.json {
        let _ = color_eyre::install();
    }

    if let Err(err) = real_main(&cli) {
        let code = exit_code_for_error(&err);
        tracing::error!(error = %err, code, "alarm exiting with error");
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&err));
        } else {
            eprintln!("{}", humanize(&err));
        }
        std::process::exit(code);
    }
}

fn real_main(cli: &Cli) -> Result<()> {
    let cfg = load_config(&cli.config)?;
    init_logging(cli, &cfg)?;
    tracing::debug!(config = %cli.config.display(), device = %cfg.device.id, "config loaded");

    match &cli.cmd {
        Commands::Run { store, max_cycles } => {
            let shutdown = Arc::new(AtomicBool::new(false));
            let flag = Arc::clone(&shutdown);
            if let Err(e) = ctrlc::set_handler(move || {
                flag.store(true, Ordering::SeqCst);
            }) {
                tracing::warn!(error = %e, "failed to install Ctrl-C handler");
            }
            let summary = run::run_node(&cfg, store.as_deref(), *max_cycles, shutdown)?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({
                        "cycles": summary.cycles,
                        "failures": summary.failures,
                        "mode": summary.final_mode.as_str(),
                    })
                );
            } else {
                println!(
                    "stopped after {} cycles (mode: {}, collaborator failures: {})",
                    summary.cycles, summary.final_mode, summary.failures
                );
            }
        }
        Commands::SelfCheck => {
            let report = run::self_check(&cfg)?;
            let local = report.local_time.map(|t| t.to_string());
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({
                        "status": "ok",
                        "timezone": report.timezone,
                        "local_time": local,
                        "store_ready": report.store_ready,
                    })
                );
            } else {
                println!("self-check ok");
                println!(
                    "timezone {} (local time {})",
                    report.timezone,
                    local.as_deref().unwrap_or("unsynchronized")
                );
                if !report.store_ready {
                    println!("warning: store file is not readable JSON");
                }
            }
        }
        Commands::Schedule { at } => {
            let (sched, active) = run::schedule_at(&cfg, *at);
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({
                        "at": at.to_string(),
                        "window": format!(
                            "{:02}:{:02}-{:02}:{:02}",
                            sched.start_hour, sched.start_minute, sched.end_hour, sched.end_minute
                        ),
                        "enabled": sched.enabled,
                        "active": active,
                    })
                );
            } else {
                println!("{}", if active { "active" } else { "inactive" });
            }
        }
    }
    Ok(())
}

/// Read, parse and validate the config. Every failure here is a config error.
fn load_config(path: &Path) -> Result<alarm_config::Config> {
    let text = fs::read_to_string(path).map_err(|e| {
        Report::new(AlarmError::Config(format!(
            "cannot read {}: {e}",
            path.display()
        )))
    })?;
    let cfg = alarm_config::load_toml(&text)?;
    cfg.validate()
        .map_err(|e| Report::new(AlarmError::Config(e.to_string())))?;
    Ok(cfg)
}

fn init_logging(cli: &Cli, cfg: &alarm_config::Config) -> Result<()> {
    let level = cli
        .log_level
        .clone()
        .or_else(|| cfg.logging.level.clone())
        .unwrap_or_else(|| "info".to_string());
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&level))
        .wrap_err_with(|| format!("invalid log level {level:?}"))?;

    let console = if cli.json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed()
    };

    let file = match cfg.logging.file.as_deref() {
        Some(file) => {
            let path = Path::new(file);
            let dir = path
                .parent()
                .filter(|d| !d.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            fs::create_dir_all(dir).wrap_err_with(|| format!("create log dir {}", dir.display()))?;
            let name = path
                .file_name()
                .ok_or_else(|| eyre::eyre!("logging.file has no file name: {file}"))?;
            let appender = match cfg.logging.rotation.as_deref() {
                Some("daily") => tracing_appender::rolling::daily(dir, name),
                Some("hourly") => tracing_appender::rolling::hourly(dir, name),
                _ => tracing_appender::rolling::never(dir, name),
            };
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(writer)
                    .boxed(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .wrap_err("install tracing subscriber")?;
    Ok(())
}
