//! Define what we consider a "container", that is, a file format.
//!
//! Telemetry comes in and goes out either as CSV or as Parquet, anything else is `Raw` and
//! callers decide whether to skip it or to refuse it.
//!
use std::path::Path;

use serde::{Deserialize, Serialize};
use strum::VariantNames;

/// Supported container formats.
///
/// ```rust
/// use acute_common::Container;
///
/// let container = Container::from("drones-2024-03.parquet");
/// assert_eq!(container, Container::Parquet);
/// assert_eq!("Parquet", container.to_string());
/// ```
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    Deserialize,
    PartialEq,
    strum::Display,
    Serialize,
    VariantNames,
)]
pub enum Container {
    /// Common CSV format.
    CSV,
    /// Apache Parquet
    Parquet,
    /// Anything we can not read or write
    #[default]
    Raw,
}

impl From<&str> for Container {
    fn from(path: &str) -> Self {
        Container::from(Path::new(path))
    }
}

impl From<&Path> for Container {
    fn from(path: &Path) -> Self {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "csv" => Container::CSV,
            "parquet" => Container::Parquet,
            _ => Container::Raw,
        }
    }
}

impl Container {
    /// Names of the formats we can actually handle.
    ///
    pub fn supported() -> Vec<&'static str> {
        Container::VARIANTS
            .iter()
            .copied()
            .filter(|v| *v != "Raw")
            .collect()
    }
}
