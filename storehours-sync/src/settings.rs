//! Typed job settings derived from the INI config.

use std::path::PathBuf;

use storehours_core::vault::MAIN_SECTION;
use storehours_core::{ConfigError, ConfigStore};

use crate::itsm::{Environment, ListQuery, ITSM_SECTION};
use crate::origin::ORIGIN_SECTION;

pub const DEFAULT_LOG_FILE: &str = "process.logs";

/// Where the job log is mirrored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub file_logging: bool,
    pub log_file: PathBuf,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            file_logging: false,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSettings {
    pub origin_url: String,
    pub environment: Environment,
    /// Explicit ITSM base URL; wins over [`JobSettings::environment`].
    pub itsm_base_url: Option<String>,
    pub list_query: ListQuery,
    pub log: LogSettings,
    pub dry_run: bool,
}

impl JobSettings {
    /// Read every job setting. Only `[ORIGIN] origin_url` is mandatory here;
    /// credential keys are checked when the vault unwraps them.
    pub fn from_config(config: &ConfigStore) -> Result<Self, ConfigError> {
        let origin_url = config.get_text(ORIGIN_SECTION, "origin_url")?;

        let environment = match optional(config, ITSM_SECTION, "environment") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                section: ITSM_SECTION.to_string(),
                key: "environment".to_string(),
                value: raw.clone(),
                expected: "PROD or QA",
            })?,
            None => Environment::default(),
        };

        let defaults = ListQuery::default();
        let per_page = match optional(config, ITSM_SECTION, "per_page") {
            Some(_) => positive_page_size(config)?,
            None => defaults.per_page,
        };
        let list_query = ListQuery {
            per_page,
            source: config.get_text_or(ITSM_SECTION, "source", &defaults.source),
            source_id: config.get_text_or(ITSM_SECTION, "source_id", &defaults.source_id),
            fields: defaults.fields,
        };

        let log = LogSettings {
            file_logging: match optional(config, MAIN_SECTION, "file_logging") {
                Some(_) => config.get_bool(MAIN_SECTION, "file_logging")?,
                None => false,
            },
            log_file: PathBuf::from(config.get_text_or(MAIN_SECTION, "log_file", DEFAULT_LOG_FILE)),
        };

        Ok(Self {
            origin_url,
            environment,
            itsm_base_url: optional(config, ITSM_SECTION, "base_url"),
            list_query,
            log,
            dry_run: false,
        })
    }

    pub fn itsm_base_url(&self) -> &str {
        self.itsm_base_url
            .as_deref()
            .unwrap_or_else(|| self.environment.base_url())
    }
}

fn optional(config: &ConfigStore, section: &str, key: &str) -> Option<String> {
    config
        .get_text(section, key)
        .ok()
        .filter(|value| !value.is_empty())
}

fn positive_page_size(config: &ConfigStore) -> Result<u32, ConfigError> {
    let raw = config.get_int(ITSM_SECTION, "per_page")?;
    u32::try_from(raw)
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| ConfigError::InvalidValue {
            section: ITSM_SECTION.to_string(),
            key: "per_page".to_string(),
            value: raw.to_string(),
            expected: "a positive integer",
        })
}
