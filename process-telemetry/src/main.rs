//! Enrich drone telemetry recorded by the ACUTE antennas with the geometry of the station that
//! received each point.
//!

use clap::{crate_version, Parser};
use eyre::Result;
use tracing::trace;

use acute_common::init_logging;

use crate::cli::{Opts, SubCommand};
use crate::cmds::handle_cmds;
use crate::config::init_runtime;

mod cli;
mod cmds;
mod config;

/// Binary name, using a different binary name
pub const NAME: &str = env!("CARGO_BIN_NAME");
/// Binary version
pub const VERSION: &str = crate_version!();

fn main() -> Result<()> {
    let opts = Opts::parse();

    // Initialise logging early
    //
    init_logging(NAME, opts.use_tree, opts.use_file.clone())?;
    trace!("Logging initialised.");

    // No need to load anything for this one.
    //
    if let SubCommand::Version = opts.subcmd {
        println!(
            "{}/{}\n{}\n{}",
            NAME,
            VERSION,
            acute_common::version(),
            acute_enrich::version()
        );
        return Ok(());
    }

    let ctx = init_runtime(&opts)?;

    trace!("Execute commands.");
    handle_cmds(&ctx, &opts)
}
