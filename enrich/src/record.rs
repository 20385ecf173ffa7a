//! Telemetry records, before and after enrichment.
//!
//! A batch carries the typed columns the pipeline works on plus every other column of the input
//! as raw strings (`extra`), in the order found in the files.  The names of these passthrough
//! columns live once in the batch, each record holding only the values.
//!

use crate::Status;

/// Column names used in input and output
pub const COL_SOURCE: &str = "source";
pub const COL_STATION: &str = "station_id";
pub const COL_TIME: &str = "time";
pub const COL_ALTITUDE: &str = "altitude";
pub const COL_LATITUDE: &str = "latitude";
pub const COL_LONGITUDE: &str = "longitude";
pub const COL_STATION_LATITUDE: &str = "station_latitude";
pub const COL_STATION_LONGITUDE: &str = "station_longitude";

/// Older exports name the antenna column `station_name`.
pub const COL_STATION_ALIAS: &str = "station_name";

/// Columns computed by the pipeline, an input column with one of these names is not passed
/// through.
pub const COMPUTED_COLUMNS: &[&str] = &[
    "station_elevation",
    "relative_altitude",
    "distance_km",
    "azimuth_deg",
    "elevation_angle_deg",
];

/// One drone observation.
///
/// Every typed value may be missing, the feeds have gaps.  A value that is present but can not
/// be parsed is kept in `invalid` and only reported if the record survives the filter.
///
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TelemetryRecord {
    /// Feed the point comes from
    pub source: String,
    /// Antenna that received it
    pub station_id: String,
    /// Epoch seconds
    pub time: Option<i64>,
    /// Absolute altitude of the drone in meters, if reported
    pub altitude: Option<f64>,
    /// Drone latitude
    pub latitude: Option<f64>,
    /// Drone longitude
    pub longitude: Option<f64>,
    /// Antenna latitude as reported by the feed
    pub station_latitude: Option<f64>,
    /// Antenna longitude as reported by the feed
    pub station_longitude: Option<f64>,
    /// Passthrough values, aligned with `TelemetryBatch::extra_columns`
    pub extra: Vec<String>,
    /// First unparsable value of the line
    pub invalid: Option<Status>,
}

/// Input batch.
///
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TelemetryBatch {
    /// Names of the passthrough columns
    pub extra_columns: Vec<String>,
    pub records: Vec<TelemetryRecord>,
}

impl From<Vec<TelemetryRecord>> for TelemetryBatch {
    /// Batch without passthrough columns
    ///
    fn from(records: Vec<TelemetryRecord>) -> Self {
        TelemetryBatch {
            extra_columns: vec![],
            records,
        }
    }
}

impl TelemetryBatch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Concatenate batches read from different files.
    ///
    /// The passthrough columns are the union of all batches, in order of first appearance.  A
    /// record whose file did not have a column gets an empty value.  No deduplication.
    ///
    #[tracing::instrument(skip(batches))]
    pub fn concat(batches: Vec<TelemetryBatch>) -> TelemetryBatch {
        let mut extra_columns: Vec<String> = vec![];
        for b in &batches {
            for col in &b.extra_columns {
                if !extra_columns.contains(col) {
                    extra_columns.push(col.clone());
                }
            }
        }

        let total = batches.iter().map(|b| b.len()).sum();
        let mut records = Vec::with_capacity(total);
        for b in batches {
            // where each of our columns is in this batch
            let map: Vec<Option<usize>> = extra_columns
                .iter()
                .map(|c| b.extra_columns.iter().position(|x| x == c))
                .collect();

            records.extend(b.records.into_iter().map(|mut r| {
                let extra = map
                    .iter()
                    .map(|pos| match pos {
                        Some(i) => r.extra.get(*i).cloned().unwrap_or_default(),
                        None => String::new(),
                    })
                    .collect();
                r.extra = extra;
                r
            }));
        }
        TelemetryBatch {
            extra_columns,
            records,
        }
    }
}

/// One observation with the station geometry added.
///
/// `None` means the value can not be known, because it was missing from the input, because no
/// installation matched or because it depends on one that is unknown.  It is never zero in
/// disguise.
///
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EnrichedRecord {
    /// Kept only if `source` is not among the dropped columns
    pub source: Option<String>,
    pub station_id: String,
    pub time: Option<i64>,
    pub altitude: f64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub station_latitude: Option<f64>,
    pub station_longitude: Option<f64>,
    /// Passthrough values left after projection, aligned with `EnrichedBatch::extra_columns`
    pub extra: Vec<String>,
    /// Ground elevation of the active installation
    pub station_elevation: Option<f64>,
    /// Height of the drone above the station
    pub relative_altitude: Option<f64>,
    /// Great-circle distance
    pub distance_km: Option<f64>,
    /// Integer degrees in `[0, 360)`
    pub azimuth_deg: Option<u16>,
    /// Tenths of a degree, `15` is 1.5°
    pub elevation_angle_deg: Option<i32>,
}

/// Output batch.
///
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EnrichedBatch {
    /// Whether the `source` column is part of the output
    pub with_source: bool,
    /// Names of the remaining passthrough columns
    pub extra_columns: Vec<String>,
    pub records: Vec<EnrichedRecord>,
}

impl EnrichedBatch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Full header of the output, passthrough columns first.
    ///
    pub fn header(&self) -> Vec<String> {
        let mut header = self.extra_columns.clone();
        if self.with_source {
            header.push(COL_SOURCE.to_string());
        }
        header.extend(
            [
                COL_STATION,
                COL_TIME,
                COL_ALTITUDE,
                COL_LATITUDE,
                COL_LONGITUDE,
                COL_STATION_LATITUDE,
                COL_STATION_LONGITUDE,
            ]
            .iter()
            .chain(COMPUTED_COLUMNS)
            .map(|s| s.to_string()),
        );
        header
    }
}

impl EnrichedRecord {
    /// Values in the same order as `EnrichedBatch::header()`, missing values are empty.
    ///
    pub fn to_row(&self) -> Vec<String> {
        let mut row = self.extra.clone();
        if let Some(source) = &self.source {
            row.push(source.clone());
        }
        row.extend([
            self.station_id.clone(),
            opt_to_string(self.time),
            self.altitude.to_string(),
            opt_to_string(self.latitude),
            opt_to_string(self.longitude),
            opt_to_string(self.station_latitude),
            opt_to_string(self.station_longitude),
            opt_to_string(self.station_elevation),
            opt_to_string(self.relative_altitude),
            opt_to_string(self.distance_km),
            opt_to_string(self.azimuth_deg),
            opt_to_string(self.elevation_angle_deg),
        ]);
        row
    }
}

#[inline]
fn opt_to_string<T: ToString>(v: Option<T>) -> String {
    v.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(station: &str, extra: &[&str]) -> TelemetryRecord {
        TelemetryRecord {
            station_id: station.to_string(),
            extra: extra.iter().map(|s| s.to_string()).collect(),
            ..TelemetryRecord::default()
        }
    }

    #[test]
    fn test_concat_union_columns() {
        let a = TelemetryBatch {
            extra_columns: vec!["journey".to_string(), "model".to_string()],
            records: vec![rec("A", &["1", "mavic"]), rec("B", &["2", "mini"])],
        };
        let b = TelemetryBatch {
            extra_columns: vec!["model".to_string(), "rssi".to_string()],
            records: vec![rec("C", &["air", "-70"])],
        };

        let all = TelemetryBatch::concat(vec![a, b]);
        assert_eq!(vec!["journey", "model", "rssi"], all.extra_columns);
        assert_eq!(3, all.len());
        assert_eq!(vec!["1", "mavic", ""], all.records[0].extra);
        assert_eq!(vec!["", "air", "-70"], all.records[2].extra);

        let order: Vec<_> = all.records.iter().map(|r| r.station_id.as_str()).collect();
        assert_eq!(vec!["A", "B", "C"], order);
    }

    #[test]
    fn test_concat_keeps_duplicates() {
        let a = TelemetryBatch::from(vec![rec("A", &[])]);
        let all = TelemetryBatch::concat(vec![a.clone(), a]);
        assert_eq!(2, all.len());
    }

    #[test]
    fn test_header_and_row_align() {
        let batch = EnrichedBatch {
            with_source: true,
            extra_columns: vec!["model".to_string()],
            records: vec![EnrichedRecord {
                source: Some("as".to_string()),
                station_id: "A".to_string(),
                time: Some(1500),
                altitude: 589.,
                extra: vec!["mavic".to_string()],
                station_elevation: None,
                relative_altitude: None,
                distance_km: Some(1.5),
                azimuth_deg: Some(12),
                elevation_angle_deg: None,
                ..EnrichedRecord::default()
            }],
        };
        let header = batch.header();
        let row = batch.records[0].to_row();
        assert_eq!(header.len(), row.len());
        assert_eq!("model", header[0]);
        assert_eq!("source", header[1]);
        assert_eq!("as", row[1]);
        assert_eq!("1500", row[3]);
        assert_eq!("", row[9]);
        assert_eq!("12", row[12]);
        assert_eq!("", row[13]);
        assert_eq!("elevation_angle_deg", header[13]);
    }

    #[test]
    fn test_row_without_position() {
        let r = EnrichedRecord {
            station_id: "A".to_string(),
            time: Some(1500),
            altitude: 589.,
            latitude: None,
            station_elevation: Some(89.),
            relative_altitude: Some(500.),
            ..EnrichedRecord::default()
        };
        let row = r.to_row();
        assert_eq!("", row[3]);
        assert_eq!("89", row[7]);
        assert_eq!(vec!["", "", ""], row[9..].to_vec());
    }
}
