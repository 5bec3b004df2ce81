use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn};

pub const DATASOURCE_VAR: &str = "DATASOURCE";
pub const WRITE_MODE_VAR: &str = "DATASOURCE_WRITE_MODE";
pub const DEFAULT_DATASOURCE: &str = "data/data.json";

/// How the document store overwrites the backing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Write a sibling temp file, fsync it, then rename it over the datasource.
    #[default]
    Atomic,
    /// Truncate and rewrite the datasource directly. A crash mid-write can corrupt it.
    InPlace,
}

impl FromStr for WriteMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "atomic" => Ok(WriteMode::Atomic),
            "in_place" | "in-place" | "inplace" => Ok(WriteMode::InPlace),
            other => Err(format!("unknown write mode '{}'", other)),
        }
    }
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteMode::Atomic => write!(f, "atomic"),
            WriteMode::InPlace => write!(f, "in_place"),
        }
    }
}

/// Location of the JSON datasource and how it is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSourceConfig {
    pub datasource: PathBuf,
    pub write_mode: WriteMode,
}

impl DataSourceConfig {
    pub fn new(datasource: impl Into<PathBuf>) -> Self {
        Self {
            datasource: datasource.into(),
            write_mode: WriteMode::default(),
        }
    }

    pub fn with_write_mode(mut self, write_mode: WriteMode) -> Self {
        self.write_mode = write_mode;
        self
    }

    /// Reads `DATASOURCE` and `DATASOURCE_WRITE_MODE`, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let datasource = match lookup(DATASOURCE_VAR) {
            Some(path) if !path.trim().is_empty() => {
                info!("Using datasource {} from environment variable {}.", path, DATASOURCE_VAR);
                PathBuf::from(path)
            }
            _ => {
                info!(
                    "{} environment variable not set. Using default datasource {}.",
                    DATASOURCE_VAR, DEFAULT_DATASOURCE
                );
                PathBuf::from(DEFAULT_DATASOURCE)
            }
        };

        let write_mode = match lookup(WRITE_MODE_VAR) {
            Some(raw) => match raw.parse::<WriteMode>() {
                Ok(mode) => mode,
                Err(e) => {
                    warn!(
                        "Invalid {} value: {}. Using default write mode {}.",
                        WRITE_MODE_VAR,
                        e,
                        WriteMode::default()
                    );
                    WriteMode::default()
                }
            },
            None => WriteMode::default(),
        };

        Self {
            datasource,
            write_mode,
        }
    }
}
