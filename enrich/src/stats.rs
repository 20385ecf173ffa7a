//! Statistics of one enrichment run.
//!

use std::fmt::{Display, Formatter};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EnrichStats {
    /// Records read
    pub read: usize,
    /// Records dropped because of their source
    pub dropped_source: usize,
    /// Records dropped because they have no altitude
    pub dropped_altitude: usize,
    /// Records for which no station installation was found
    pub unresolved: usize,
    /// Records without drone or station position
    pub no_position: usize,
    /// Records in the output
    pub written: usize,
    /// Time taken in ms
    pub time: u128,
}

impl EnrichStats {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Display for EnrichStats {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let str = format!(
            "{} records read, {} dropped (source), {} dropped (no altitude), {} written with {} unknown station(s) and {} without position in {} ms.",
            self.read, self.dropped_source, self.dropped_altitude, self.written, self.unresolved, self.no_position, self.time
        );
        write!(f, "{}", str)
    }
}
