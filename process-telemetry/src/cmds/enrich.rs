use std::path::Path;

use eyre::Result;
use tracing::{info, trace};

use acute_common::Container;
use acute_enrich::io::{read_path, write_batch};
use acute_enrich::{EnrichStats, Enricher, Status};

use crate::cli::EnrichOpts;
use crate::config::Context;

/// Read, enrich and write.
///
#[tracing::instrument(skip(ctx))]
pub fn enrich_files(ctx: &Context, eopts: &EnrichOpts) -> Result<EnrichStats> {
    trace!("enter");

    // Refuse a bad output before reading anything.
    //
    let output = Path::new(&eopts.output);
    if Container::from(output) == Container::Raw {
        return Err(Status::UnsupportedOutput(eopts.output.clone()).into());
    }

    let batch = read_path(Path::new(&eopts.input))?;
    info!("{} records read from {}", batch.len(), eopts.input);

    let enricher = Enricher::new(ctx.registry.current(), ctx.options.clone());
    let (out, stats) = enricher.enrich(batch)?;

    write_batch(output, &out)?;
    Ok(stats)
}
