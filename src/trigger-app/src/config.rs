// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Section-keyed TOML configuration shared by the serialtrigger binaries.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

const CONFIG_DIR: &str = "serialtrigger";
const CONFIG_FILE: &str = "serialtrigger.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    ReadError(PathBuf, String),

    #[error("Failed to parse config file {0}: {1}")]
    ParseError(PathBuf, String),

    #[error("Config file {0} has no [{1}] section")]
    MissingSection(PathBuf, &'static str),
}

/// Where a loaded configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// The file named on the command line.
    Explicit(PathBuf),
    /// The first default location carrying the section.
    Found(PathBuf),
    /// No usable file; built-in defaults apply.
    Defaults {
        /// Every default location looked at, in order.
        searched: Vec<PathBuf>,
        /// Files that exist but lack the section.
        without_section: Vec<PathBuf>,
    },
}

impl ConfigSource {
    /// File the configuration was read from, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Explicit(path) | Self::Found(path) => Some(path),
            Self::Defaults { .. } => None,
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit(path) | Self::Found(path) => write!(f, "{}", path.display()),
            Self::Defaults { searched, .. } => {
                write!(f, "built-in defaults (searched ")?;
                for (idx, path) in searched.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", path.display())?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Default locations for `serialtrigger.toml`: current directory, then the
/// user config directory, then `/etc`.
fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(CONFIG_FILE)];
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join(CONFIG_DIR).join(CONFIG_FILE));
    }
    paths.push(PathBuf::from("/etc").join(CONFIG_DIR).join(CONFIG_FILE));
    paths
}

/// Parse `key` out of `path`. `Ok(None)` when the file has no such section.
fn read_section<T: DeserializeOwned>(path: &Path, key: &str) -> Result<Option<T>, ConfigError> {
    let parse_error = |e: &dyn fmt::Display| ConfigError::ParseError(path.to_path_buf(), e.to_string());

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::ReadError(path.to_path_buf(), e.to_string()))?;
    let mut table: toml::Table = toml::from_str(&content).map_err(|e| parse_error(&e))?;
    let Some(section) = table.remove(key) else {
        return Ok(None);
    };
    // Going through the value keeps serde defaults for omitted keys.
    section.try_into().map(Some).map_err(|e| parse_error(&e))
}

/// A configuration type stored under one `[section]` of `serialtrigger.toml`.
pub trait ConfigFile: Sized + Default + DeserializeOwned {
    fn section_key() -> &'static str;

    /// Load the section from `path`; a file without it is an error.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        read_section(path, Self::section_key())?
            .ok_or_else(|| ConfigError::MissingSection(path.to_path_buf(), Self::section_key()))
    }

    /// Load from the first default location that has the section, or fall
    /// back to defaults. Files without the section are skipped and reported.
    fn load_from_default_paths() -> Result<(Self, ConfigSource), ConfigError> {
        Self::load_from_paths(config_search_paths())
    }

    fn load_from_paths(paths: Vec<PathBuf>) -> Result<(Self, ConfigSource), ConfigError> {
        let mut without_section = Vec::new();
        for path in &paths {
            if !path.exists() {
                continue;
            }
            match read_section(path, Self::section_key())? {
                Some(cfg) => return Ok((cfg, ConfigSource::Found(path.clone()))),
                None => without_section.push(path.clone()),
            }
        }
        Ok((
            Self::default(),
            ConfigSource::Defaults {
                searched: paths,
                without_section,
            },
        ))
    }

    /// Load `explicit` when given, otherwise search the default locations.
    fn load(explicit: Option<&Path>) -> Result<(Self, ConfigSource), ConfigError> {
        match explicit {
            Some(path) => Ok((
                Self::load_from_file(path)?,
                ConfigSource::Explicit(path.to_path_buf()),
            )),
            None => Self::load_from_default_paths(),
        }
    }
}
