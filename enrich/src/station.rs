//! Station registry and temporal resolver.
//!
//! An antenna (`station_id`) moves from site to site over time so a telemetry record is only
//! tied to a physical station through its timestamp.  Each [`StationRecord`] is one
//! installation with its validity interval `[valid_from, valid_until]`, `valid_until` being open
//! while the antenna is still there.
//!
//! The registry keeps the records in their original order and indexes them by `station_id` so
//! that resolving is a hash lookup plus a scan of the few installations of that antenna.  When
//! several installations contain the timestamp, the first one in registry order wins.
//!
//! Overlaps are a data-quality problem of the station table, [`StationRegistry::overlaps`] lists
//! them.
//!
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::DateTime;
use eyre::Result;
use serde::{Deserialize, Serialize};
use tabled::builder::Builder;
use tabled::settings::Style;
use tracing::{debug, trace, warn};

use crate::Status;

/// Current station file version
const STATION_FILE_VER: usize = 1;

/// One installation of an antenna on a site.
///
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct StationRecord {
    /// Antenna identifier as found in telemetry
    #[serde(rename = "id")]
    pub station_id: String,
    /// Start of validity (epoch seconds, inclusive)
    pub valid_from: i64,
    /// End of validity (epoch seconds, inclusive), `None` is still active
    #[serde(default)]
    pub valid_until: Option<i64>,
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// Ground elevation in meters
    #[serde(rename = "elevation")]
    pub ground_elevation: f64,
    /// Site short name
    #[serde(rename = "name")]
    pub display_name: String,
}

impl StationRecord {
    /// Is `timestamp` inside `[valid_from, valid_until]`?
    ///
    #[inline]
    pub fn contains(&self, timestamp: i64) -> bool {
        self.valid_from <= timestamp && self.valid_until.is_none_or(|end| end >= timestamp)
    }

    /// Do both validity intervals share at least one instant?
    ///
    pub fn overlaps(&self, other: &StationRecord) -> bool {
        let before_other_ends = other.valid_until.is_none_or(|end| self.valid_from <= end);
        let other_before_we_end = self.valid_until.is_none_or(|end| other.valid_from <= end);
        before_other_ends && other_before_we_end
    }
}

/// Two installations of the same antenna active at the same time, as positions in the registry.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Overlap {
    /// Earlier entry, the one `resolve()` will return
    pub first: usize,
    /// Later entry, shadowed during the overlap
    pub second: usize,
}

/// On-disk structure for the station file
///
#[derive(Debug, Deserialize)]
struct StationsFile {
    /// Version number for safety
    pub version: usize,
    /// List of installations, order matters
    pub stations: Vec<StationRecord>,
}

/// Immutable set of station records, indexed by `station_id`.
///
#[derive(Clone, Debug, Default)]
pub struct StationRegistry {
    /// All records in their original order
    records: Vec<StationRecord>,
    /// `station_id` to positions in `records`, in ascending order
    index: HashMap<String, Vec<usize>>,
}

impl StationRegistry {
    /// Build the registry and its index.
    ///
    pub fn new(records: Vec<StationRecord>) -> Self {
        let mut index: HashMap<String, Vec<usize>> = HashMap::new();
        records.iter().enumerate().for_each(|(i, r)| {
            index.entry(r.station_id.clone()).or_default().push(i);
        });
        StationRegistry { records, index }
    }

    /// Load the station table from an HCL file or use the embedded one.
    ///
    #[tracing::instrument]
    pub fn load(fname: Option<&Path>) -> Result<Self> {
        trace!("enter");

        let data = match fname {
            Some(fname) => fs::read_to_string(fname)?,
            None => include_str!("stations.hcl").to_owned(),
        };
        let reg = Self::from_hcl(&data)?;

        let overlaps = reg.overlaps();
        if !overlaps.is_empty() {
            warn!("{} overlapping installation(s) in station table", overlaps.len());
        }
        Ok(reg)
    }

    /// Parse an HCL station table.
    ///
    pub fn from_hcl(data: &str) -> Result<Self> {
        let file: StationsFile = hcl::from_str(data)?;
        if file.version != STATION_FILE_VER {
            return Err(Status::BadFileVersion(file.version).into());
        }
        debug!("{} station records", file.stations.len());
        Ok(Self::new(file.stations))
    }

    /// Find the installation of `station_id` active at `timestamp`.
    ///
    /// First match in registry order, `None` if there is none.
    ///
    pub fn resolve(&self, station_id: &str, timestamp: i64) -> Option<&StationRecord> {
        self.index
            .get(station_id)?
            .iter()
            .map(|&i| &self.records[i])
            .find(|r| r.contains(timestamp))
    }

    /// List all pairs of installations of the same antenna whose intervals intersect.
    ///
    pub fn overlaps(&self) -> Vec<Overlap> {
        let mut res: Vec<Overlap> = self
            .index
            .values()
            .flat_map(|pos| {
                pos.iter().enumerate().flat_map(move |(n, &first)| {
                    pos[n + 1..]
                        .iter()
                        .filter(move |&&second| self.records[first].overlaps(&self.records[second]))
                        .map(move |&second| Overlap { first, second })
                })
            })
            .collect();
        res.sort_by_key(|o| (o.first, o.second));
        res
    }

    /// Access a record by its position.
    ///
    pub fn get(&self, pos: usize) -> Option<&StationRecord> {
        self.records.get(pos)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StationRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// List loaded stations as a table.
    ///
    #[tracing::instrument(skip(self))]
    pub fn list(&self) -> String {
        trace!("enter");
        let header = vec!["Antenna", "Site", "From", "Until", "Lat/Lon", "Elevation"];

        let mut builder = Builder::default();
        builder.push_record(header);

        self.records.iter().for_each(|r| {
            let until = r.valid_until.map(fmt_time).unwrap_or("open".to_string());
            builder.push_record(vec![
                r.station_id.clone(),
                r.display_name.clone(),
                fmt_time(r.valid_from),
                until,
                format!("{:.2}, {:.2}", r.latitude, r.longitude),
                format!("{} m", r.ground_elevation),
            ]);
        });

        let allf = builder.build().with(Style::modern()).to_string();
        format!("List all stations ({}):\n{allf}", self.len())
    }
}

/// Display an epoch as an UTC date, the raw number if out of range.
///
fn fmt_time(ts: i64) -> String {
    match DateTime::from_timestamp(ts, 0) {
        Some(t) => t.format("%Y-%m-%d %H:%M").to_string(),
        None => ts.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn station(id: &str, name: &str, from: i64, until: Option<i64>) -> StationRecord {
        StationRecord {
            station_id: id.to_string(),
            valid_from: from,
            valid_until: until,
            latitude: 48.6,
            longitude: 2.35,
            ground_elevation: 89.,
            display_name: name.to_string(),
        }
    }

    #[rstest]
    #[case(999, false)]
    #[case(1000, true)]
    #[case(1500, true)]
    #[case(2000, true)]
    #[case(2001, false)]
    fn test_contains_closed(#[case] ts: i64, #[case] want: bool) {
        let s = station("A", "EIH", 1000, Some(2000));
        assert_eq!(want, s.contains(ts));
    }

    #[test]
    fn test_contains_open() {
        let s = station("A", "LON", 1000, None);
        assert!(!s.contains(999));
        assert!(s.contains(1000));
        assert!(s.contains(i64::MAX));
    }

    #[rstest]
    #[case((1000, Some(2000)), (2000, Some(3000)), true)]
    #[case((1000, Some(2000)), (2001, Some(3000)), false)]
    #[case((1000, None), (5000, Some(6000)), true)]
    #[case((5000, None), (1000, Some(4999)), false)]
    #[case((1000, None), (2000, None), true)]
    fn test_overlaps(
        #[case] a: (i64, Option<i64>),
        #[case] b: (i64, Option<i64>),
        #[case] want: bool,
    ) {
        let a = station("A", "a", a.0, a.1);
        let b = station("A", "b", b.0, b.1);
        assert_eq!(want, a.overlaps(&b));
        assert_eq!(want, b.overlaps(&a));
    }

    #[test]
    fn test_resolve_found() {
        let reg = StationRegistry::new(vec![station("A", "EIH", 1000, Some(2000))]);
        let s = reg.resolve("A", 1500);
        assert!(s.is_some());
        assert_eq!("EIH", s.unwrap().display_name);
    }

    #[test]
    fn test_resolve_outside_interval() {
        let reg = StationRegistry::new(vec![station("A", "EIH", 1000, Some(2000))]);
        assert!(reg.resolve("A", 2500).is_none());
        assert!(reg.resolve("A", 500).is_none());
    }

    #[test]
    fn test_resolve_unknown_station() {
        let reg = StationRegistry::new(vec![station("A", "EIH", 1000, Some(2000))]);
        assert!(reg.resolve("B", 1500).is_none());
    }

    #[test]
    fn test_resolve_first_match_wins() {
        let reg = StationRegistry::new(vec![
            station("B", "XXX", 0, None),
            station("A", "BDX", 1000, Some(3000)),
            station("A", "CDG", 500, Some(2500)),
            station("A", "AUS", 1200, None),
        ]);
        assert_eq!("BDX", reg.resolve("A", 1500).unwrap().display_name);
        assert_eq!("CDG", reg.resolve("A", 700).unwrap().display_name);
        assert_eq!("AUS", reg.resolve("A", 3500).unwrap().display_name);
    }

    #[test]
    fn test_resolve_idempotent() {
        let reg = StationRegistry::load(None).unwrap();
        let a = reg.resolve("0QRDKC2R038370", 1_693_000_000).cloned();
        let b = reg.resolve("0QRDKC2R038370", 1_693_000_000).cloned();
        assert_eq!(a, b);
    }

    #[test_pretty_log::test]
    fn test_load_embedded() -> Result<()> {
        let reg = StationRegistry::load(None)?;
        assert_eq!(11, reg.len());

        // LON is open-ended
        let lon = reg.resolve("0QRDE8F0010496", 1_800_000_000).unwrap();
        assert_eq!("LON", lon.display_name);
        assert_eq!(6., lon.ground_elevation);
        assert!(lon.valid_until.is_none());

        // between EIH and BEL nothing is installed
        assert!(reg.resolve("0QRDE8F0010496", 1_683_000_000).is_none());
        Ok(())
    }

    #[test]
    fn test_embedded_overlap_bdx_cdg() -> Result<()> {
        let reg = StationRegistry::load(None)?;
        let ov = reg.overlaps();
        assert_eq!(1, ov.len());

        let first = reg.get(ov[0].first).unwrap();
        let second = reg.get(ov[0].second).unwrap();
        assert_eq!("BDX", first.display_name);
        assert_eq!("CDG", second.display_name);

        // BDX is before CDG in the table so it wins during the overlap
        let s = reg.resolve("0QRDKC2R038370", 1_693_000_000).unwrap();
        assert_eq!("BDX", s.display_name);
        assert_eq!(49., s.ground_elevation);
        Ok(())
    }

    #[test]
    fn test_from_hcl_bad_version() {
        let data = r##"
version = 2
stations = []
"##;
        assert!(StationRegistry::from_hcl(data).is_err());
    }

    #[test]
    fn test_from_hcl() -> Result<()> {
        let data = r##"
version = 1
stations = [
  { id = "A", name = "EIH", valid_from = 1000, valid_until = 2000, latitude = 48.6, longitude = 2.35, elevation = 89 },
  { id = "A", name = "LON", valid_from = 2001, latitude = 51.52, longitude = -0.05, elevation = 6.5 },
]
"##;
        let reg = StationRegistry::from_hcl(data)?;
        assert_eq!(2, reg.len());
        assert!(reg.overlaps().is_empty());
        assert_eq!(6.5, reg.resolve("A", 2001).unwrap().ground_elevation);
        Ok(())
    }

    #[test]
    fn test_list() -> Result<()> {
        let reg = StationRegistry::load(None)?;
        let str = reg.list();
        assert!(str.contains("List all stations (11)"));
        assert!(str.contains("BUC"));
        assert!(str.contains("open"));
        Ok(())
    }

    #[test]
    fn test_fmt_time() {
        assert_eq!("2021-07-20 00:00", fmt_time(1_626_739_200));
    }
}
