//! Configuration
//!
//! Read from toml files; every key is optional:
//!
//! ```toml
//! blocks_dir = "/home/user/.bitcoin/blocks"
//! first_file = 0
//! file_count = 10
//! strictness = "lenient"
//! magic      = "f9beb4d9"
//! log_level  = "info"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use slog::Drain;

use crate::archive::{Strictness, MAINNET_MAGIC};
use crate::error::Result;
use crate::util;


#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Critical,
    Error,
    Warning,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for slog::Level {
    fn from(level: LogLevel) -> slog::Level {
        match level {
            LogLevel::Critical => slog::Level::Critical,
            LogLevel::Error    => slog::Level::Error,
            LogLevel::Warning  => slog::Level::Warning,
            LogLevel::Info     => slog::Level::Info,
            LogLevel::Debug    => slog::Level::Debug,
            LogLevel::Trace    => slog::Level::Trace,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory holding the blkNNNNN.dat files
    pub blocks_dir: PathBuf,

    /// Number of the first file to read
    pub first_file: usize,

    /// Number of files to read; None reads up to the first missing file
    pub file_count: Option<usize>,

    pub strictness: Strictness,

    /// Expected magic number, as hex; an empty string accepts any
    #[serde(serialize_with = "serialize_magic", deserialize_with = "deserialize_magic")]
    pub magic: Option<[u8; 4]>,

    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            blocks_dir: PathBuf::from("blocks"),
            first_file: 0,
            file_count: None,
            strictness: Strictness::default(),
            magic:      Some(MAINNET_MAGIC),
            log_level:  LogLevel::Info,
        }
    }
}

impl Config {

    pub fn from_toml(s: &str) -> Result<Config> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config> {
        let contents = fs::read_to_string(path)?;
        Config::from_toml(&contents)
    }

    /// Terminal logger at the configured level
    pub fn logger(&self) -> slog::Logger {
        terminal_logger(self.log_level.into())
    }
}

fn serialize_magic<S: Serializer>(magic: &Option<[u8; 4]>, serializer: S) -> ::std::result::Result<S::Ok, S::Error> {
    match *magic {
        Some(ref bytes) => serializer.serialize_str(&util::to_hex(bytes)),
        None            => serializer.serialize_str(""),
    }
}

fn deserialize_magic<'de, D: Deserializer<'de>>(deserializer: D) -> ::std::result::Result<Option<[u8; 4]>, D::Error> {
    let hex: String = de::Deserialize::deserialize(deserializer)?;
    if hex.is_empty() {
        return Ok(None);
    }

    let bytes = util::from_hex(&hex)
        .filter(|b| b.len() == 4)
        .ok_or_else(|| de::Error::custom(format!("magic must be 4 hex encoded bytes, not `{}`", hex)))?;

    let mut magic = [0; 4];
    magic.copy_from_slice(&bytes);
    Ok(Some(magic))
}


/// Compact terminal logger that drops records below `level`
pub fn terminal_logger(level: slog::Level) -> slog::Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::CompactFormat::new(decorator).build();
    let drain = ::std::sync::Mutex::new(drain).fuse();
    let drain = slog::LevelFilter::new(drain, level).fuse();

    slog::Logger::root(drain, o!())
}
