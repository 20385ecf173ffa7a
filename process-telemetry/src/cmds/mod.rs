//! This is the main driver module for all the different commands.
//!

use eyre::Result;
use tracing::info;

pub use enrich::*;
pub use stations::*;

use crate::cli::{Opts, StationsSubCommand, SubCommand};
use crate::config::Context;

mod enrich;
mod stations;

#[tracing::instrument(skip(ctx))]
pub fn handle_cmds(ctx: &Context, opts: &Opts) -> Result<()> {
    match &opts.subcmd {
        SubCommand::Enrich(eopts) => {
            eprintln!("Enriching {} into {}.", eopts.input, eopts.output);

            let stats = enrich_files(ctx, eopts)?;
            eprintln!("Stats:\n{}", stats);
        }
        SubCommand::Stations(sopts) => match sopts.subcmd {
            StationsSubCommand::List => list_stations(ctx)?,
            StationsSubCommand::Check => check_stations(ctx)?,
        },
        SubCommand::Resolve(ropts) => resolve_station(ctx, ropts)?,
        // Done already.
        //
        SubCommand::Version => (),
    }

    info!("Done.");
    Ok(())
}
