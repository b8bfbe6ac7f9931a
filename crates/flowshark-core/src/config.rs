//! Decode configuration shared by the capture analysis and the live collector.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fields::{CiscoFieldScheme, CiscoLengthScheme, FieldScheme};
use crate::protocols::netflow_v9::layout::{NETFLOW_V9_VERSION, VERSION_RANGE};

fn default_max_examples() -> usize {
    3
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("unknown {what} '{value}' (expected one of: {expected})")]
    UnknownValue {
        what: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Which field table interprets data records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SchemeKind {
    /// Names with typed values.
    #[default]
    Cisco,
    /// Names and lengths only; values stay raw bytes.
    CiscoLengths,
}

impl SchemeKind {
    pub fn scheme(self) -> &'static dyn FieldScheme {
        match self {
            SchemeKind::Cisco => &CiscoFieldScheme,
            SchemeKind::CiscoLengths => &CiscoLengthScheme,
        }
    }

    pub fn as_str(self) -> &'static str {
        self.scheme().name()
    }
}

impl FromStr for SchemeKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "cisco" => Ok(SchemeKind::Cisco),
            "cisco-lengths" => Ok(SchemeKind::CiscoLengths),
            _ => Err(ConfigError::UnknownValue {
                what: "scheme",
                value: value.to_string(),
                expected: "cisco, cisco-lengths",
            }),
        }
    }
}

/// How many records of each data flowset get interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordMode {
    None,
    #[default]
    First,
    All,
}

impl RecordMode {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordMode::None => "none",
            RecordMode::First => "first",
            RecordMode::All => "all",
        }
    }
}

impl FromStr for RecordMode {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "none" => Ok(RecordMode::None),
            "first" => Ok(RecordMode::First),
            "all" => Ok(RecordMode::All),
            _ => Err(ConfigError::UnknownValue {
                what: "record mode",
                value: value.to_string(),
                expected: "none, first, all",
            }),
        }
    }
}

/// Decode settings; every field has a default so partial files are valid.
///
/// # Examples
/// ```
/// use flowshark_core::{DecodeConfig, RecordMode, SchemeKind};
///
/// let config: DecodeConfig = serde_json::from_str(r#"{"ports": [2055], "records": "all"}"#)?;
/// assert_eq!(config.scheme, SchemeKind::Cisco);
/// assert_eq!(config.records, RecordMode::All);
/// assert!(config.accepts_port(2055));
/// assert!(!config.accepts_port(9995));
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecodeConfig {
    pub scheme: SchemeKind,
    /// UDP destination ports carrying exports; empty means sniff the version.
    pub ports: Vec<u16>,
    pub records: RecordMode,
    pub max_examples: usize,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            scheme: SchemeKind::default(),
            ports: Vec::new(),
            records: RecordMode::default(),
            max_examples: default_max_examples(),
        }
    }
}

impl DecodeConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn accepts_port(&self, port: u16) -> bool {
        self.ports.is_empty() || self.ports.contains(&port)
    }

    /// Whether a UDP payload sent to `port` should be decoded as NetFlow v9.
    ///
    /// With explicit ports every payload on them is decoded so malformed
    /// exports surface as failures. Without ports only payloads starting
    /// with version 9 are picked up.
    pub fn selects(&self, port: u16, payload: &[u8]) -> bool {
        if !self.ports.is_empty() {
            return self.ports.contains(&port);
        }
        payload
            .get(VERSION_RANGE)
            .is_some_and(|version| version == NETFLOW_V9_VERSION.to_be_bytes())
    }
}
