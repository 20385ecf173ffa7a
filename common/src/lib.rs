//! This library is there to share some common code amongst all ACUTE station tools.
//!

mod config;
mod container;
mod logging;
mod macros;

use clap::{crate_name, crate_version};
pub use config::*;
pub use container::*;
pub use logging::*;

const NAME: &str = crate_name!();
const VERSION: &str = crate_version!();

pub fn version() -> String {
    format!("{}/{}", NAME, VERSION)
}
