//! Getting telemetry in and out of files.
//!
//! Both CSV and Parquet are supported, the [`Container`] being deduced from the file
//! extension.  Parquet goes through `polars` and a temporary CSV file so that there is only one
//! place where records are parsed and one where they are formatted.
//!
//! [`Container`]: acute_common::Container
//!

pub use read::*;
pub use write::*;

mod read;
mod write;

/// Cell values meaning "no value".
pub(crate) const MISSING: &[&str] = &["", "NaN", "nan", "null"];
