//! Write enriched telemetry as CSV or Parquet.
//!

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use eyre::Result;
use polars::prelude::{CsvReadOptions, ParquetWriter, SerReader};
use tempfile::Builder;
use tracing::{debug, info, trace};

use acute_common::Container;

use crate::{EnrichedBatch, Status};

/// Write the batch as CSV, header first, unknown values as empty cells.
///
#[tracing::instrument(skip_all)]
pub fn write_csv<W: Write>(w: W, batch: &EnrichedBatch) -> Result<()> {
    trace!("enter");

    let mut wtr = ::csv::Writer::from_writer(w);
    wtr.write_record(batch.header())?;
    batch
        .records
        .iter()
        .try_for_each(|r| wtr.write_record(r.to_row()))?;
    wtr.flush()?;
    Ok(())
}

/// Write the batch into `path`, format from the extension.
///
#[tracing::instrument(skip(batch))]
pub fn write_batch(path: &Path, batch: &EnrichedBatch) -> Result<()> {
    trace!("enter");

    match Container::from(path) {
        Container::CSV => {
            let file = File::create(path)?;
            write_csv(BufWriter::new(file), batch)?;
        }
        Container::Parquet => {
            // Write into temporary file.
            //
            let mut tmpf = Builder::new().suffix(".csv").tempfile()?;
            write_csv(BufWriter::new(tmpf.as_file_mut()), batch)?;
            write_parquet(tmpf.path(), path)?;
        }
        Container::Raw => {
            return Err(Status::UnsupportedOutput(path.to_string_lossy().to_string()).into());
        }
    }
    info!("{} records written to {:?}", batch.len(), path);
    Ok(())
}

/// Convert a CSV file into Parquet through polars.
///
#[tracing::instrument]
fn write_parquet(from: &Path, to: &Path) -> Result<()> {
    // Scan the whole file, a column can be empty for a long time.
    //
    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .try_into_reader_with_file_path(Some(from.to_path_buf()))?
        .finish()?;
    debug!("schema={:?}", df.schema());

    let mut file = File::create(to)?;
    ParquetWriter::new(&mut file).finish(&mut df)?;
    Ok(())
}
