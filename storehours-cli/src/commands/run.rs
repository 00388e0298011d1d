//! `storehours run` — one Origin → ITSM opening-hours sync.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use storehours_core::{ConfigStore, Reporter};
use storehours_sync::{Environment, JobSettings, LogSettings, SyncReport, UreqTransport};

use crate::joblog::JobLog;
use crate::session::RunSession;

/// Arguments for `storehours run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// INI file with the `[ITSM]`, `[ORIGIN]`, `[ORIGIN2]` and `[MAIN]` sections.
    #[arg(long, default_value = "itsm.cfg")]
    pub config: PathBuf,

    /// Mirror the job log to a file (overrides `[MAIN] file_logging`).
    #[arg(long)]
    pub file_logging: bool,

    /// Job log file path (overrides `[MAIN] log_file`; implies --file-logging).
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Compare and log decisions without sending any update.
    #[arg(long)]
    pub dry_run: bool,

    /// ITSM environment (overrides `[ITSM] environment`).
    #[arg(long, value_parser = parse_environment)]
    pub env: Option<Environment>,

    /// Write the run summary as JSON to this path.
    #[arg(long)]
    pub report: Option<PathBuf>,
}

fn parse_environment(s: &str) -> std::result::Result<Environment, String> {
    s.parse()
}

impl RunArgs {
    pub fn run(self) -> ExitCode {
        let prepared = self.prepare();
        let log_settings = match &prepared {
            Ok((_, settings)) => self.log_settings(&settings.log),
            Err(_) => self.log_settings(&LogSettings::default()),
        };
        let log = open_log(&log_settings);
        RunSession::guard(&log, |session| {
            if let Some(path) = log.path() {
                log.debug(&format!("Job log is mirrored to {}", path.display()));
            }

            let result = prepared.and_then(|(config, settings)| {
                let transport = UreqTransport::builder().build();
                storehours_sync::run(&settings, &config, &transport, &log)
                    .context("Synchronization of store opening hours failed")
            });
            let result = result.and_then(|report| {
                if let Some(path) = &self.report {
                    write_report(path, &report)?;
                }
                Ok(report)
            });

            let (outcome, _) = session.conclude(result, |report| summary(report, log.warnings()));
            outcome
        })
        .into()
    }

    /// Load the config and apply command-line overrides.
    fn prepare(&self) -> Result<(ConfigStore, JobSettings)> {
        let config = ConfigStore::load_at(&self.config)
            .with_context(|| format!("could not load config {}", self.config.display()))?;
        let mut settings = JobSettings::from_config(&config).context("invalid job settings")?;
        if let Some(env) = self.env {
            settings.environment = env;
        }
        settings.dry_run = self.dry_run;
        Ok((config, settings))
    }

    fn log_settings(&self, configured: &LogSettings) -> LogSettings {
        LogSettings {
            file_logging: self.file_logging || self.log_file.is_some() || configured.file_logging,
            log_file: self
                .log_file
                .clone()
                .unwrap_or_else(|| configured.log_file.clone()),
        }
    }
}

fn open_log(settings: &LogSettings) -> JobLog {
    if !settings.file_logging {
        return JobLog::stdout();
    }
    match JobLog::with_file(&settings.log_file) {
        Ok(log) => log,
        Err(err) => {
            tracing::warn!(
                "cannot open job log file {}: {err}; logging to stdout only",
                settings.log_file.display()
            );
            JobLog::stdout()
        }
    }
}

fn write_report(path: &Path, report: &SyncReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("failed to serialize run report")?;
    fs::write(path, json).with_context(|| format!("failed to write report {}", path.display()))
}

pub fn summary(report: &SyncReport, warnings: usize) -> String {
    let prefix = if report.dry_run { "[dry-run] " } else { "" };
    let changes = if report.dry_run {
        format!("{} would be updated", report.would_update)
    } else {
        format!("{} updated, {} failed", report.updated, report.failed)
    };
    format!(
        "{prefix}Store opening hours synchronized: {} Origin stores, {} ITSM organizations, {changes}, {} unchanged, {warnings} warnings",
        report.origin_records, report.itsm_records, report.unchanged
    )
}
