mod baseline;
mod cli;
mod config;
mod diff;
mod fingerprint;
mod monitor;
mod report;
mod scan;

use cli::{Cli, Command};
use config::MonitorConfig;
use diff::IncidentBatch;
use monitor::CheckOutcome;
use std::fmt as stdfmt;
use std::io::{IsTerminal, stderr};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{Event, Level, Subscriber, error, info, warn};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt as tracing_fmt;
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;

struct FimExitCode;

impl FimExitCode {
    /// Exit code used when integrity breaches were detected.
    fn breaches_found() -> ExitCode {
        ExitCode::from(1)
    }

    /// Exit code used for other errors (missing root, absent or corrupted
    /// baseline, report write failure, invalid arguments, etc.).
    fn any_error() -> ExitCode {
        ExitCode::from(255)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let result: anyhow::Result<ExitCode> = match cli.command {
        Command::Baseline {
            root,
            baseline_file,
        } => handle_baseline(root, baseline_file),
        Command::Check {
            root,
            baseline_file,
            report_dir,
            label,
        } => handle_check(root, baseline_file, report_dir, label),
    };

    match result {
        Ok(exit_code) => exit_code,
        Err(err) => {
            error!("{err}");
            FimExitCode::any_error()
        }
    }
}

fn handle_baseline(root: PathBuf, baseline_file: PathBuf) -> anyhow::Result<ExitCode> {
    if config::lies_inside_root(&root, &baseline_file) {
        warn!(
            "Baseline file {} lies inside the monitored root and will appear in every check",
            baseline_file.display()
        );
    }

    let config = MonitorConfig {
        root,
        baseline_path: baseline_file,
        // The baseline verb never reports; the directory is only carried.
        report_dir: PathBuf::from(config::DEFAULT_REPORT_DIR),
        label: MonitorConfig::default_label(),
    };

    monitor::create_baseline(&config)?;

    Ok(ExitCode::SUCCESS)
}

fn handle_check(
    root: PathBuf,
    baseline_file: PathBuf,
    report_dir: PathBuf,
    label: Option<String>,
) -> anyhow::Result<ExitCode> {
    for state_path in [&baseline_file, &report_dir] {
        if config::lies_inside_root(&root, state_path) {
            warn!(
                "{} lies inside the monitored root and will appear in every check",
                state_path.display()
            );
        }
    }

    let config = MonitorConfig {
        root,
        baseline_path: baseline_file,
        report_dir,
        label: label.unwrap_or_else(MonitorConfig::default_label),
    };

    match monitor::run_check(&config)? {
        // run_check already logged why there is no result to act on. These
        // are operational errors, not a clean verdict.
        CheckOutcome::NoBaseline | CheckOutcome::BaselineCorrupted(_) => {
            Ok(FimExitCode::any_error())
        }
        CheckOutcome::Clean { files_checked } => {
            info!("No changes detected ({files_checked} files verified)");
            Ok(ExitCode::SUCCESS)
        }
        CheckOutcome::Breaches { batch, report } => {
            print_incidents(&batch);

            error!("{} integrity breach(es) detected", batch.total());

            match report {
                Ok(path) => {
                    info!("Incident report written to {}", path.display());
                    Ok(FimExitCode::breaches_found())
                }
                // The classification above is still valid and was printed;
                // only the durable record is missing.
                Err(_) => Ok(FimExitCode::any_error()),
            }
        }
    }
}

fn print_incidents(batch: &IncidentBatch) {
    for line in format_incident_lines(batch) {
        println!("{line}");
    }
}

fn format_incident_lines(batch: &IncidentBatch) -> Vec<String> {
    let mut lines = Vec::new();

    for incident in &batch.modified {
        lines.push(format!("{:<2} {}", "M", incident.path));
        lines.push(format!(
            "   was: {}",
            truncate_hash(&incident.baseline_hash.to_string())
        ));
        lines.push(format!(
            "   now: {}",
            truncate_hash(&incident.current_hash.to_string())
        ));
    }

    for incident in &batch.added {
        lines.push(format!("{:<2} {}", "A", incident.path));
        lines.push(format!(
            "   now: {}",
            truncate_hash(&incident.current_hash.to_string())
        ));
    }

    for incident in &batch.deleted {
        lines.push(format!("{:<2} {}", "D", incident.path));
        lines.push(format!(
            "   was: {}",
            truncate_hash(&incident.baseline_hash.to_string())
        ));
    }

    lines
}

fn truncate_hash(hash: &str) -> String {
    if hash.len() > 12 {
        format!("{}...", &hash[..12])
    } else {
        hash.to_string()
    }
}

fn init_tracing(verbose: u8) {
    let stderr_is_terminal = stderr().is_terminal();
    let formatter = EmojiFormatter { stderr_is_terminal };

    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let fmt_layer = tracing_fmt::layer()
        .event_format(formatter)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

struct EmojiFormatter {
    stderr_is_terminal: bool,
}

impl<S, N> FormatEvent<S, N> for EmojiFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> stdfmt::Result {
        if self.stderr_is_terminal {
            match *event.metadata().level() {
                Level::DEBUG => write!(writer, "🔍 ")?,
                Level::INFO => write!(writer, "ℹ️ ")?,
                Level::WARN => write!(writer, "⚠️  ")?,
                Level::ERROR => write!(writer, "❌️ ")?,
                _ => {}
            }
        } else {
            match *event.metadata().level() {
                Level::DEBUG => writer.write_str("DEBUG: ")?,
                Level::INFO => writer.write_str("INFO: ")?,
                Level::WARN => writer.write_str("WARN: ")?,
                Level::ERROR => writer.write_str("ERROR: ")?,
                _ => {}
            }
        }

        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
