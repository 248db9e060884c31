//! rtype_options: rtconfig.json parsing and checker options.
//!
//! Parses rtconfig.json files into [`RtConfig`]. Every option is optional
//! so that a config file and command-line flags can be layered.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Checker options, matching the `checkerOptions` block of rtconfig.json.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckerOptions {
    /// Enables every strictness option that is not set explicitly.
    pub strict: Option<bool>,
    /// Report declarations that end up typed `any` without an annotation.
    pub no_implicit_any: Option<bool>,
    /// Reject properties a record type does not declare.
    pub closed_records: Option<bool>,
}

impl CheckerOptions {
    pub fn no_implicit_any(&self) -> bool {
        self.no_implicit_any.or(self.strict).unwrap_or(false)
    }

    /// `strict` does not imply closed records: open records are the
    /// structural default.
    pub fn closed_records(&self) -> bool {
        self.closed_records.unwrap_or(false)
    }

    /// Layer `overrides` on top of `self`. Options set in `overrides` win.
    pub fn merge(&self, overrides: &CheckerOptions) -> CheckerOptions {
        CheckerOptions {
            strict: overrides.strict.or(self.strict),
            no_implicit_any: overrides.no_implicit_any.or(self.no_implicit_any),
            closed_records: overrides.closed_records.or(self.closed_records),
        }
    }
}

/// The rtconfig.json file structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RtConfig {
    pub checker_options: Option<CheckerOptions>,
    pub files: Option<Vec<String>>,
}

impl RtConfig {
    pub fn options(&self) -> CheckerOptions {
        self.checker_options.clone().unwrap_or_default()
    }

    /// Program files, resolved against the directory holding the config.
    pub fn resolve_files(&self, config_path: &Path) -> Vec<PathBuf> {
        let base = config_path.parent().unwrap_or_else(|| Path::new(""));
        self.files
            .iter()
            .flatten()
            .map(|file| base.join(file))
            .collect()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read '{}'", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{}' is not a valid rtconfig.json", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Contents written by `rtc --init`.
pub const DEFAULT_CONFIG: &str = r#"{
  "checkerOptions": {
    "strict": true,
    "closedRecords": false
  },
  "files": []
}
"#;

/// Parse an rtconfig.json file from a string.
pub fn parse_rtconfig(content: &str) -> Result<RtConfig, serde_json::Error> {
    serde_json::from_str(content)
}

/// Parse an rtconfig.json file from a path.
pub fn parse_rtconfig_file(path: &Path) -> Result<RtConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_rtconfig(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
