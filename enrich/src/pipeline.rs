//! The enrichment pipeline.
//!
//! 1. filter: drop records from the disallowed source and records without altitude,
//! 2. project: drop the passthrough columns nobody downstream wants,
//! 3. resolve the station installation of each record,
//! 4. compute the geometry.
//!
//! Order of the records is kept.  Dropped records are counted, not reported as errors, whatever
//! else they hold.  A kept record with an unparsable value fails the whole batch.
//!

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use eyre::Result;
use rayon::prelude::*;
use tracing::{debug, info, trace};

use crate::geodesic::{batch_geometry, Position, Sample};
use crate::{
    EnrichStats, EnrichedBatch, EnrichedRecord, StationRegistry, Status, TelemetryBatch,
    TelemetryRecord, COL_SOURCE,
};

/// Source whose points never make it into the output
pub const DISALLOWED_SOURCE: &str = "wi";

/// Passthrough columns removed from the output
pub const DROP_COLUMNS: &[&str] = &[
    "journey",
    "ident",
    "model",
    "source",
    "location",
    "timestamp",
    "gps",
    "rssi",
    "home_lat",
    "home_lon",
    "home_height",
    "speed",
    "heading",
    "year",
    "month",
];

#[derive(Clone, Debug, PartialEq)]
pub struct EnrichOptions {
    /// Records with this source are dropped
    pub disallowed_source: String,
    /// Columns removed from the output, `source` included
    pub drop_columns: Vec<String>,
}

impl Default for EnrichOptions {
    fn default() -> Self {
        EnrichOptions {
            disallowed_source: DISALLOWED_SOURCE.to_string(),
            drop_columns: DROP_COLUMNS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Runs the pipeline against one registry snapshot.
///
#[derive(Clone, Debug)]
pub struct Enricher {
    registry: Arc<StationRegistry>,
    opts: EnrichOptions,
}

/// A record that went through the filter, altitude known.
///
struct Kept {
    record: TelemetryRecord,
    altitude: f64,
}

impl Enricher {
    pub fn new(registry: Arc<StationRegistry>, opts: EnrichOptions) -> Self {
        Enricher { registry, opts }
    }

    /// Drop what we do not want, keeping the order.
    ///
    fn filter(
        &self,
        records: Vec<TelemetryRecord>,
        stats: &mut EnrichStats,
    ) -> Result<Vec<Kept>, Status> {
        let mut kept = Vec::with_capacity(records.len());
        for mut record in records {
            if record.source == self.opts.disallowed_source {
                stats.dropped_source += 1;
                continue;
            }
            if let Some(err) = record.invalid.take() {
                return Err(err);
            }
            match record.altitude {
                Some(altitude) => kept.push(Kept { record, altitude }),
                None => stats.dropped_altitude += 1,
            }
        }
        Ok(kept)
    }

    /// Enrich a whole batch.
    ///
    #[tracing::instrument(skip_all, fields(records = batch.len()))]
    pub fn enrich(&self, batch: TelemetryBatch) -> Result<(EnrichedBatch, EnrichStats)> {
        trace!("enter");

        let start = Instant::now();
        let mut stats = EnrichStats::new();
        stats.read = batch.len();

        let kept = self.filter(batch.records, &mut stats)?;
        debug!("{} records left after filtering", kept.len());

        // Projection
        //
        let dropped: HashSet<&str> = self.opts.drop_columns.iter().map(|s| s.as_str()).collect();
        let with_source = !dropped.contains(COL_SOURCE);
        let keep: Vec<usize> = batch
            .extra_columns
            .iter()
            .enumerate()
            .filter(|(_, c)| !dropped.contains(c.as_str()))
            .map(|(i, _)| i)
            .collect();
        let extra_columns = keep.iter().map(|&i| batch.extra_columns[i].clone()).collect();

        // Station resolution
        //
        let registry = &self.registry;
        let samples: Vec<Sample> = kept
            .par_iter()
            .map(|k| {
                let r = &k.record;
                Sample {
                    drone: Position::from_opt(r.latitude, r.longitude),
                    altitude: k.altitude,
                    station: Position::from_opt(r.station_latitude, r.station_longitude),
                    ground_elevation: r
                        .time
                        .and_then(|t| registry.resolve(&r.station_id, t))
                        .map(|s| s.ground_elevation),
                }
            })
            .collect();
        stats.unresolved = samples.iter().filter(|s| s.ground_elevation.is_none()).count();
        stats.no_position = samples
            .iter()
            .filter(|s| s.drone.is_none() || s.station.is_none())
            .count();

        // Geometry
        //
        let geometry = batch_geometry(&samples);

        let records: Vec<EnrichedRecord> = kept
            .into_par_iter()
            .zip(samples.into_par_iter().zip(geometry.into_par_iter()))
            .map(|(k, (s, g))| {
                let r = k.record;
                EnrichedRecord {
                    source: with_source.then_some(r.source),
                    station_id: r.station_id,
                    time: r.time,
                    altitude: k.altitude,
                    latitude: r.latitude,
                    longitude: r.longitude,
                    station_latitude: r.station_latitude,
                    station_longitude: r.station_longitude,
                    extra: keep
                        .iter()
                        .map(|&i| r.extra.get(i).cloned().unwrap_or_default())
                        .collect(),
                    station_elevation: s.ground_elevation,
                    relative_altitude: g.relative_altitude,
                    distance_km: g.distance_km,
                    azimuth_deg: g.azimuth_deg,
                    elevation_angle_deg: g.elevation_angle_deg,
                }
            })
            .collect();

        stats.written = records.len();
        stats.time = start.elapsed().as_millis();
        info!("{}", stats);

        Ok((
            EnrichedBatch {
                with_source,
                extra_columns,
                records,
            },
            stats,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StationRecord;

    fn registry() -> Arc<StationRegistry> {
        Arc::new(StationRegistry::new(vec![StationRecord {
            station_id: "A".to_string(),
            valid_from: 1000,
            valid_until: Some(2000),
            latitude: 48.6,
            longitude: 2.35,
            ground_elevation: 89.,
            display_name: "EIH".to_string(),
        }]))
    }

    fn rec(source: &str, time: i64, altitude: Option<f64>) -> TelemetryRecord {
        TelemetryRecord {
            source: source.to_string(),
            station_id: "A".to_string(),
            time: Some(time),
            altitude,
            latitude: Some(48.6),
            longitude: Some(2.35),
            station_latitude: Some(48.6),
            station_longitude: Some(2.35),
            extra: vec![],
            invalid: None,
        }
    }

    fn bad(column: &str) -> Status {
        Status::BadValue {
            file: "drones.csv".to_string(),
            line: 2,
            column: column.to_string(),
            value: "north".to_string(),
        }
    }

    #[test_pretty_log::test]
    fn test_enrich_above_station() {
        let e = Enricher::new(registry(), EnrichOptions::default());
        let (out, stats) = e.enrich(vec![rec("as", 1500, Some(589.))].into()).unwrap();

        assert_eq!(1, out.len());
        let r = &out.records[0];
        assert_eq!(Some(89.), r.station_elevation);
        assert_eq!(Some(500.), r.relative_altitude);
        assert_eq!(Some(0.), r.distance_km);
        assert_eq!(Some(0), r.azimuth_deg);
        assert_eq!(Some(900), r.elevation_angle_deg);
        assert_eq!(0, stats.unresolved);
    }

    #[test]
    fn test_enrich_outside_interval() {
        let e = Enricher::new(registry(), EnrichOptions::default());
        let mut r = rec("as", 2500, Some(589.));
        r.latitude = Some(48.7);
        let (out, stats) = e.enrich(vec![r].into()).unwrap();

        let r = &out.records[0];
        assert_eq!(None, r.station_elevation);
        assert_eq!(None, r.relative_altitude);
        assert_eq!(None, r.elevation_angle_deg);
        assert!(r.distance_km.is_some_and(|d| d > 11. && d < 11.2));
        assert_eq!(Some(180), r.azimuth_deg);
        assert_eq!(1, stats.unresolved);
    }

    #[test]
    fn test_enrich_filters() {
        let e = Enricher::new(registry(), EnrichOptions::default());
        let batch = vec![
            rec("wi", 1500, Some(589.)),
            rec("as", 1500, None),
            rec("as", 1600, Some(100.)),
            rec("wi", 1700, None),
        ];
        let (out, stats) = e.enrich(batch.into()).unwrap();

        assert_eq!(1, out.len());
        assert_eq!(Some(1600), out.records[0].time);
        assert_eq!(4, stats.read);
        assert_eq!(2, stats.dropped_source);
        assert_eq!(1, stats.dropped_altitude);
        assert_eq!(1, stats.written);
    }

    #[test]
    fn test_enrich_custom_source() {
        let opts = EnrichOptions {
            disallowed_source: "as".to_string(),
            ..EnrichOptions::default()
        };
        let e = Enricher::new(registry(), opts);
        let (out, _) = e
            .enrich(vec![rec("wi", 1500, Some(1.)), rec("as", 1500, Some(1.))].into())
            .unwrap();
        assert_eq!(1, out.len());
    }

    #[test]
    fn test_enrich_keeps_order() {
        let e = Enricher::new(registry(), EnrichOptions::default());
        let batch: Vec<_> = (0..5000).map(|i| rec("as", i, Some(i as f64))).collect();
        let (out, _) = e.enrich(batch.into()).unwrap();

        assert_eq!(5000, out.len());
        out.records
            .iter()
            .enumerate()
            .for_each(|(i, r)| assert_eq!(Some(i as i64), r.time));
    }

    #[test]
    fn test_enrich_filter_order_independent() {
        let e = Enricher::new(registry(), EnrichOptions::default());
        let batch = vec![
            rec("wi", 1, Some(1.)),
            rec("as", 2, Some(2.)),
            rec("as", 3, None),
            rec("fa", 4, Some(4.)),
        ];
        let mut reversed = batch.clone();
        reversed.reverse();

        let (a, _) = e.enrich(batch.into()).unwrap();
        let (b, _) = e.enrich(reversed.into()).unwrap();

        let mut ta: Vec<_> = a.records.iter().map(|r| r.time).collect();
        let tb: Vec<_> = b.records.iter().map(|r| r.time).collect();
        assert_eq!(vec![Some(4), Some(2)], tb);
        ta.sort();
        let mut tb = tb;
        tb.sort();
        assert_eq!(ta, tb);
    }

    #[test]
    fn test_enrich_projection() {
        let e = Enricher::new(registry(), EnrichOptions::default());
        let mut r = rec("as", 1500, Some(589.));
        r.extra = vec!["12".into(), "mavic".into(), "-70".into(), "EIH".into()];
        let batch = TelemetryBatch {
            extra_columns: vec!["journey".into(), "model".into(), "rssi".into(), "site".into()],
            records: vec![r],
        };
        let (out, _) = e.enrich(batch).unwrap();

        assert!(!out.with_source);
        assert_eq!(vec!["site"], out.extra_columns);
        assert_eq!(None, out.records[0].source);
        assert_eq!(vec!["EIH"], out.records[0].extra);
    }

    #[test]
    fn test_enrich_keep_source() {
        let opts = EnrichOptions {
            drop_columns: vec!["rssi".to_string()],
            ..EnrichOptions::default()
        };
        let e = Enricher::new(registry(), opts);
        let (out, _) = e.enrich(vec![rec("as", 1500, Some(589.))].into()).unwrap();

        assert!(out.with_source);
        assert_eq!(Some("as".to_string()), out.records[0].source);
    }

    #[test]
    fn test_enrich_empty() {
        let e = Enricher::new(registry(), EnrichOptions::default());
        let (out, stats) = e.enrich(TelemetryBatch::default()).unwrap();
        assert!(out.is_empty());
        assert_eq!(0, stats.read);
    }

    #[test]
    fn test_enrich_without_position() {
        let e = Enricher::new(registry(), EnrichOptions::default());
        let mut no_fix = rec("as", 1500, Some(589.));
        no_fix.latitude = None;
        let mut no_antenna = rec("as", 1600, Some(589.));
        no_antenna.station_longitude = None;
        let (out, stats) = e
            .enrich(vec![no_fix, no_antenna, rec("as", 1700, Some(589.))].into())
            .unwrap();

        assert_eq!(3, out.len());
        for r in &out.records[..2] {
            assert_eq!(Some(89.), r.station_elevation);
            assert_eq!(Some(500.), r.relative_altitude);
            assert_eq!(None, r.distance_km);
            assert_eq!(None, r.azimuth_deg);
            assert_eq!(None, r.elevation_angle_deg);
        }
        assert_eq!(Some(900), out.records[2].elevation_angle_deg);
        assert_eq!(2, stats.no_position);
        assert_eq!(3, stats.written);
    }

    #[test]
    fn test_enrich_without_time() {
        let e = Enricher::new(registry(), EnrichOptions::default());
        let mut r = rec("as", 1500, Some(589.));
        r.time = None;
        let (out, stats) = e.enrich(vec![r].into()).unwrap();

        assert_eq!(None, out.records[0].station_elevation);
        assert_eq!(Some(0.), out.records[0].distance_km);
        assert_eq!(1, stats.unresolved);
    }

    #[test]
    fn test_enrich_dropped_rows_never_fail() {
        let e = Enricher::new(registry(), EnrichOptions::default());
        let mut wi = rec("wi", 1500, Some(589.));
        wi.invalid = Some(bad("latitude"));
        let (out, stats) = e.enrich(vec![wi, rec("as", 1600, Some(589.))].into()).unwrap();

        assert_eq!(1, out.len());
        assert_eq!(1, stats.dropped_source);
    }

    #[test]
    fn test_enrich_kept_row_invalid() {
        let e = Enricher::new(registry(), EnrichOptions::default());
        let mut r = rec("as", 1500, Some(589.));
        r.invalid = Some(bad("latitude"));
        let err = e.enrich(vec![rec("as", 1400, Some(1.)), r].into()).unwrap_err();
        assert_eq!(Some(&bad("latitude")), err.downcast_ref::<Status>());
    }

    #[test]
    fn test_enrich_invalid_altitude() {
        let e = Enricher::new(registry(), EnrichOptions::default());
        let mut r = rec("as", 1500, None);
        r.invalid = Some(bad("altitude"));
        assert!(e.enrich(vec![r].into()).is_err());
    }
}
