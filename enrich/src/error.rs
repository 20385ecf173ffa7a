use thiserror::Error;

use acute_common::Container;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum Status {
    #[error("Bad station file version {0}")]
    BadFileVersion(usize),
    #[error("{file}: missing column {column}")]
    MissingColumn { file: String, column: String },
    #[error("{file}:{line}: bad value {value:?} for {column}")]
    BadValue {
        file: String,
        line: u64,
        column: String,
        value: String,
    },
    #[error("No CSV or Parquet file found in {0}")]
    NoInputFiles(String),
    #[error("Unsupported input file {0}, use one of {formats}", formats = formats())]
    UnsupportedInput(String),
    #[error("Unsupported output file {0}, use one of {formats}", formats = formats())]
    UnsupportedOutput(String),
}

fn formats() -> String {
    Container::supported().join(", ")
}
