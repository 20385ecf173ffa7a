//! Enrich drone telemetry with the receiving station context.
//!
//! Every record says which antenna heard the drone and when.  We find which installation of
//! that antenna was active at that time ([`StationRegistry::resolve`]), then compute the height
//! of the drone above the station, the great-circle distance, the bearing and the elevation
//! angle ([`geodesic`]).  [`Enricher`] does this over a whole batch.
//!
//! Reading CSV/Parquet files into a [`TelemetryBatch`] and writing an [`EnrichedBatch`] back is
//! done in [`io`].
//!

use clap::{crate_name, crate_version};

pub use error::*;
pub use pipeline::*;
pub use record::*;
pub use shared::*;
pub use station::*;
pub use stats::*;

mod error;
pub mod geodesic;
pub mod io;
mod pipeline;
mod record;
mod shared;
mod station;
mod stats;

const NAME: &str = crate_name!();
const VERSION: &str = crate_version!();

pub fn version() -> String {
    format!("{}/{}", NAME, VERSION)
}
