//! Configuration module
//!
//! This is where most of the initialisation code lies.  We read the configuration file, load
//! the station table and build the enrichment options.
//!
//! Version History:
//!
//! - v1 is the initial version with `stations`, `disallowed_source` and `drop_columns`.
//!

use std::path::Path;

use eyre::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use acute_common::{ConfigFile, IntoConfig, Versioned};
use acute_enrich::{EnrichOptions, SharedRegistry, StationRegistry};

use crate::cli::Opts;

/// Config filename
const CONFIG: &str = "process-telemetry.hcl";

/// Current version
const CVERSION: usize = 1;

/// Configuration for the CLI tool
///
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ProcessConfig {
    /// Version number for safety
    pub version: usize,
    /// Station table, embedded one if not set
    pub stations: Option<String>,
    /// Records from this source are dropped
    pub disallowed_source: String,
    /// Columns removed from the output
    pub drop_columns: Vec<String>,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        let opts = EnrichOptions::default();
        ProcessConfig {
            version: CVERSION,
            stations: None,
            disallowed_source: opts.disallowed_source,
            drop_columns: opts.drop_columns,
        }
    }
}

impl Versioned for ProcessConfig {
    fn version(&self) -> usize {
        self.version
    }
}

impl IntoConfig for ProcessConfig {
    const FILENAME: &'static str = CONFIG;
    const VERSION: usize = CVERSION;
}

/// This holds our context, meaning common stuff
///
#[derive(Debug)]
pub struct Context {
    /// Pipeline options
    pub options: EnrichOptions,
    /// Loaded station table
    pub registry: SharedRegistry,
}

impl Context {
    /// Load a station table, the embedded one if `stations` is not set, and make it current.
    ///
    /// Runs holding a snapshot of the previous table keep it.
    ///
    #[tracing::instrument(skip(self))]
    pub fn load_stations(&self, stations: Option<&str>) -> Result<usize> {
        trace!("enter");

        let registry = StationRegistry::load(stations.map(Path::new))?;
        let len = registry.len();
        info!(
            "{} station records loaded from {}",
            len,
            stations.unwrap_or("embedded table")
        );
        self.registry.swap(registry);
        Ok(len)
    }
}

/// Read the configuration and load the station table.
///
#[tracing::instrument]
pub fn init_runtime(opts: &Opts) -> Result<Context> {
    trace!("enter");

    let cfile = ConfigFile::<ProcessConfig>::load(opts.config.as_deref())?;
    let cfg = cfile.into_inner();
    debug!("config={:?}", cfg);

    let ctx = Context {
        options: EnrichOptions {
            disallowed_source: cfg.disallowed_source,
            drop_columns: cfg.drop_columns,
        },
        registry: SharedRegistry::default(),
    };

    // Command-line wins over the configuration file
    //
    let stations = opts.stations.as_ref().or(cfg.stations.as_ref());
    ctx.load_stations(stations.map(|s| s.as_str()))?;
    Ok(ctx)
}
