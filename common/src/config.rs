//! This is the `ConfigFile` struct.
//!
//! This is for finding the right default locations for the various configuration files of the
//! ACUTE tools.  It is a configuration file/struct neutral loading engine, storing only the
//! base directory and with `load()` read the proper file or fall back to defaults.
//!
//! The configuration itself is available with `.inner()` or `.into_inner()`.
//!

use std::fmt::Debug;
use std::fs;
use std::path::PathBuf;

use directories::BaseDirs;
use eyre::Result;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, trace};

use crate::makepath;

/// Main name for the directory base
const TAG: &str = "acute";

/// Anything with a `version` field checked at load time.
///
pub trait Versioned {
    fn version(&self) -> usize;
}

/// A configuration struct that `ConfigFile` knows how to find and check.
///
pub trait IntoConfig: Debug + Default + DeserializeOwned + Versioned {
    /// Default file name inside the configuration directory.
    const FILENAME: &'static str;
    /// Version this code understands.
    const VERSION: usize;
}

#[derive(Debug, Error)]
pub enum ConfigStatus {
    #[error("Bad file version {found} in {file}, expected {expected}")]
    BadFileVersion {
        file: String,
        found: usize,
        expected: usize,
    },
    #[error("Missing configuration file {0}")]
    MissingConfig(String),
    #[error("Can not find a home directory")]
    NoHomeDir,
}

/// Configuration for one of the tools, found in `$HOME/.config/acute` (or
/// `%LOCALAPPDATA%\acute`) unless a specific file is given.
///
#[derive(Debug)]
pub struct ConfigFile<T: IntoConfig> {
    /// Tag is the project name.
    tag: String,
    /// This is the base directory for all files.
    basedir: PathBuf,
    inner: T,
}

impl<T> ConfigFile<T>
where
    T: IntoConfig,
{
    #[tracing::instrument]
    fn new(tag: &str) -> Result<Self> {
        let basedir: PathBuf = match BaseDirs::new() {
            Some(base) => {
                #[cfg(unix)]
                let base = base.home_dir().join(".config");

                #[cfg(windows)]
                let base = base.data_local_dir().to_path_buf();

                debug!("base = {base:?}");
                makepath!(base, tag)
            }
            None => {
                #[cfg(unix)]
                let homedir = std::env::var("HOME").map_err(|_| ConfigStatus::NoHomeDir)?;

                #[cfg(windows)]
                let homedir = std::env::var("LOCALAPPDATA").map_err(|_| ConfigStatus::NoHomeDir)?;

                debug!("base = {homedir}");

                #[cfg(unix)]
                let base: PathBuf = makepath!(homedir, ".config", tag);

                #[cfg(windows)]
                let base: PathBuf = makepath!(homedir, tag);

                base
            }
        };
        Ok(ConfigFile {
            tag: String::from(tag),
            basedir,
            inner: T::default(),
        })
    }

    /// Returns the path of the default config directory
    ///
    pub fn config_path(&self) -> PathBuf {
        self.basedir.clone()
    }

    /// Returns the path of the default config file
    ///
    pub fn default_file(&self) -> PathBuf {
        self.config_path().join(T::FILENAME)
    }

    /// Load the file and return a struct T in the right format.
    ///
    /// - a file given explicitly must exist,
    /// - otherwise the default file in the base directory is used if present,
    /// - otherwise we run with `T::default()`.
    ///
    #[tracing::instrument]
    pub fn load(fname: Option<&str>) -> Result<ConfigFile<T>> {
        let mut cfg = ConfigFile::<T>::new(TAG)?;

        let fname = match fname {
            Some(fname) => {
                let fname = PathBuf::from(fname);
                if !fname.exists() {
                    return Err(ConfigStatus::MissingConfig(fname.to_string_lossy().to_string()).into());
                }
                fname
            }
            None => {
                let def = cfg.default_file();
                if !def.exists() {
                    debug!("no {def:?}, using defaults");
                    return Ok(cfg);
                }
                def
            }
        };

        trace!("Loading config file {fname:?} for {}", cfg.tag);
        let data = fs::read_to_string(&fname)?;
        let data: T = hcl::from_str(&data)?;
        debug!("struct data = {data:?}");

        if data.version() != T::VERSION {
            return Err(ConfigStatus::BadFileVersion {
                file: fname.to_string_lossy().to_string(),
                found: data.version(),
                expected: T::VERSION,
            }
            .into());
        }

        cfg.inner = data;
        Ok(cfg)
    }

    /// Return the inner configuration
    ///
    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Consume the file and return the configuration
    ///
    pub fn into_inner(self) -> T {
        self.inner
    }
}
