//! INI job configuration.
//!
//! # Format
//!
//! ```text
//! ; comment
//! [MAIN]
//! GLOBAL = s3cr3t
//!
//! [ITSM]
//! user = acme-it
//! pwd = 9f3a…
//! token = 51c0…
//! ```
//!
//! Keys are matched case-insensitively, section names are not. Values found in
//! a `[DEFAULT]` section are visible from every other section.
//!
//! Indented lines continue the previous value and are joined with `\n`. Blank
//! lines between a value and its continuation stay part of the value; trailing
//! blank lines do not.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::ConfigError;

/// Lines starting with this prefix are ignored.
pub const COMMENT_PREFIX: char = ';';

const DEFAULT_SECTION: &str = "DEFAULT";

type Section = BTreeMap<String, String>;

/// Parsed key/value sections of an INI file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigStore {
    defaults: Section,
    // Insertion order of section names, as written in the file.
    order: Vec<String>,
    sections: BTreeMap<String, Section>,
}

impl ConfigStore {
    /// Load and parse the config at `path`.
    ///
    /// Returns [`ConfigError::NotFound`] before any parsing when the file is
    /// absent.
    pub fn load_at(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self::parse(&contents)?;
        tracing::debug!(
            "loaded config {} ({} sections)",
            path.display(),
            store.order.len()
        );
        Ok(store)
    }

    /// Parse INI text.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let mut store = Self::default();
        let mut current: Option<String> = None;
        let mut last_key: Option<String> = None;
        // Blank lines seen since the last value line; kept only if an
        // indented continuation follows.
        let mut pending_blanks = 0usize;

        for (idx, raw) in contents.lines().enumerate() {
            let line_no = idx + 1;
            let trimmed = raw.trim();

            if trimmed.is_empty() {
                if last_key.is_some() {
                    pending_blanks += 1;
                }
                continue;
            }
            if trimmed.starts_with(COMMENT_PREFIX) {
                continue;
            }

            let indented = raw.starts_with(char::is_whitespace);
            if indented {
                if let (Some(section), Some(key)) = (current.as_deref(), last_key.as_deref()) {
                    let value = store.section_mut(section).get_mut(key).ok_or_else(|| {
                        parse_err(line_no, "continuation line without a key")
                    })?;
                    for _ in 0..=pending_blanks {
                        value.push('\n');
                    }
                    value.push_str(trimmed);
                    pending_blanks = 0;
                    continue;
                }
            }
            pending_blanks = 0;

            if let Some(rest) = trimmed.strip_prefix('[') {
                let name = rest
                    .strip_suffix(']')
                    .ok_or_else(|| parse_err(line_no, "unterminated section header"))?
                    .trim();
                if name.is_empty() {
                    return Err(parse_err(line_no, "empty section name"));
                }
                if name != DEFAULT_SECTION {
                    if store.sections.contains_key(name) {
                        return Err(parse_err(line_no, format!("duplicate section [{name}]")));
                    }
                    store.order.push(name.to_string());
                    store.sections.insert(name.to_string(), Section::new());
                }
                current = Some(name.to_string());
                last_key = None;
                continue;
            }

            let Some(section) = current.as_deref() else {
                return Err(parse_err(line_no, "key/value pair before any section header"));
            };
            let Some(split_at) = trimmed.find(['=', ':']) else {
                return Err(parse_err(line_no, format!("expected `key = value`, got {trimmed:?}")));
            };
            let key = trimmed[..split_at].trim().to_lowercase();
            let value = trimmed[split_at + 1..].trim().to_string();
            if key.is_empty() {
                return Err(parse_err(line_no, "empty key"));
            }

            let entries = store.section_mut(section);
            if entries.contains_key(&key) {
                return Err(parse_err(
                    line_no,
                    format!("duplicate key \"{key}\" in section [{section}]"),
                ));
            }
            entries.insert(key.clone(), value);
            last_key = Some(key);
        }

        Ok(store)
    }

    fn section_mut(&mut self, name: &str) -> &mut Section {
        if name == DEFAULT_SECTION {
            return &mut self.defaults;
        }
        self.sections.entry(name.to_string()).or_default()
    }

    /// Section names in file order, excluding `[DEFAULT]`.
    pub fn sections(&self) -> Vec<String> {
        self.order.clone()
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.sections.contains_key(section)
    }

    /// Keys visible from `section`, including inherited defaults.
    pub fn options(&self, section: &str) -> Result<Vec<String>, ConfigError> {
        let entries = self.section(section)?;
        let mut keys: Vec<String> = entries.keys().cloned().collect();
        for key in self.defaults.keys() {
            if !entries.contains_key(key) {
                keys.push(key.clone());
            }
        }
        Ok(keys)
    }

    pub fn get_text(&self, section: &str, key: &str) -> Result<String, ConfigError> {
        let entries = self.section(section)?;
        let key_lc = key.to_lowercase();
        entries
            .get(&key_lc)
            .or_else(|| self.defaults.get(&key_lc))
            .cloned()
            .ok_or_else(|| ConfigError::MissingKey {
                section: section.to_string(),
                key: key.to_string(),
            })
    }

    /// Like [`get_text`](Self::get_text), but a missing section or key yields
    /// `default`.
    pub fn get_text_or(&self, section: &str, key: &str, default: &str) -> String {
        match self.get_text(section, key) {
            Ok(value) => value,
            Err(_) => default.to_string(),
        }
    }

    pub fn get_int(&self, section: &str, key: &str) -> Result<i64, ConfigError> {
        let value = self.get_text(section, key)?;
        value
            .parse::<i64>()
            .map_err(|_| invalid(section, key, value.clone(), "integer"))
    }

    /// Boolean lookup accepting `1/yes/true/on` and `0/no/false/off`.
    pub fn get_bool(&self, section: &str, key: &str) -> Result<bool, ConfigError> {
        let value = self.get_text(section, key)?;
        match value.to_ascii_lowercase().as_str() {
            "1" | "yes" | "true" | "on" => Ok(true),
            "0" | "no" | "false" | "off" => Ok(false),
            _ => Err(invalid(section, key, value, "boolean")),
        }
    }

    /// Set `key` in an existing section.
    pub fn set(&mut self, section: &str, key: &str, value: &str) -> Result<(), ConfigError> {
        let entries = self
            .sections
            .get_mut(section)
            .ok_or_else(|| ConfigError::MissingSection {
                section: section.to_string(),
            })?;
        entries.insert(key.to_lowercase(), value.to_string());
        Ok(())
    }

    fn section(&self, section: &str) -> Result<&Section, ConfigError> {
        self.sections
            .get(section)
            .ok_or_else(|| ConfigError::MissingSection {
                section: section.to_string(),
            })
    }
}

fn parse_err(line: usize, message: impl Into<String>) -> ConfigError {
    ConfigError::Parse {
        line,
        message: message.into(),
    }
}

fn invalid(section: &str, key: &str, value: String, expected: &'static str) -> ConfigError {
    ConfigError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value,
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
; job credentials
[MAIN]
GLOBAL = top-secret

[ITSM]
user = acme
per_page: 50
file_logging = yes
description = first line
  second line
";

    #[test]
    fn parses_sections_in_file_order() {
        let store = ConfigStore::parse(SAMPLE).unwrap();
        assert_eq!(store.sections(), vec!["MAIN", "ITSM"]);
    }

    #[test]
    fn keys_are_case_insensitive() {
        let store = ConfigStore::parse(SAMPLE).unwrap();
        assert_eq!(store.get_text("MAIN", "GLOBAL").unwrap(), "top-secret");
        assert_eq!(store.get_text("MAIN", "global").unwrap(), "top-secret");
    }

    #[test]
    fn colon_separator_and_typed_getters() {
        let store = ConfigStore::parse(SAMPLE).unwrap();
        assert_eq!(store.get_int("ITSM", "per_page").unwrap(), 50);
        assert!(store.get_bool("ITSM", "file_logging").unwrap());
    }

    #[test]
    fn continuation_lines_are_joined() {
        let store = ConfigStore::parse(SAMPLE).unwrap();
        assert_eq!(
            store.get_text("ITSM", "description").unwrap(),
            "first line\nsecond line"
        );
    }

    #[test]
    fn blank_lines_inside_a_value_are_kept() {
        let store =
            ConfigStore::parse("[A]\nnote = a\n\n  b\n\n\nother = c\n").unwrap();
        assert_eq!(store.get_text("A", "note").unwrap(), "a\n\nb");
        assert_eq!(store.get_text("A", "other").unwrap(), "c");
    }

    #[test]
    fn comment_lines_are_ignored() {
        let store = ConfigStore::parse("; [HIDDEN]\n[A]\n; k = v\nx = 1\n").unwrap();
        assert_eq!(store.sections(), vec!["A"]);
        assert_eq!(store.options("A").unwrap(), vec!["x"]);
    }

    #[test]
    fn defaults_are_inherited() {
        let store = ConfigStore::parse("[DEFAULT]\nper_page = 10\n[ITSM]\nuser = a\n").unwrap();
        assert_eq!(store.get_int("ITSM", "per_page").unwrap(), 10);
        assert!(!store.has_section("DEFAULT"));
    }

    #[test]
    fn missing_section_and_key_are_distinguished() {
        let store = ConfigStore::parse(SAMPLE).unwrap();
        assert!(matches!(
            store.get_text("ORIGIN", "user"),
            Err(ConfigError::MissingSection { .. })
        ));
        assert!(matches!(
            store.get_text("ITSM", "token"),
            Err(ConfigError::MissingKey { .. })
        ));
    }

    #[test]
    fn key_before_section_is_a_parse_error() {
        let err = ConfigStore::parse("user = a\n[ITSM]\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { line: 1, .. }), "got: {err}");
    }

    #[test]
    fn duplicate_key_reports_line() {
        let err = ConfigStore::parse("[A]\nx = 1\nX = 2\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { line: 3, .. }), "got: {err}");
    }

    #[test]
    fn set_overrides_value() {
        let mut store = ConfigStore::parse(SAMPLE).unwrap();
        store.set("ITSM", "user", "other").unwrap();
        assert_eq!(store.get_text("ITSM", "user").unwrap(), "other");
        assert!(store.set("NOPE", "user", "x").is_err());
    }
}
