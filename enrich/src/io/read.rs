//! Read telemetry from CSV and Parquet files.
//!
//! Columns are found by their header name, in any order.  Everything that is not one of the
//! typed columns is kept as a passthrough column, except columns named like the ones we compute.
//!
//! Reading never fails on a value.  A record without altitude is not parsed further, anything
//! else that does not parse is recorded in `TelemetryRecord::invalid` and left to the pipeline,
//! which only cares for the records it keeps.
//!

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use ::csv::{ReaderBuilder, StringRecord, Trim};
use eyre::Result;
use polars::prelude::{CsvWriter, ParquetReader, SerReader, SerWriter};
use rayon::prelude::*;
use tempfile::Builder;
use tracing::{debug, info, trace, warn};

use acute_common::Container;

use crate::io::MISSING;
use crate::{
    Status, TelemetryBatch, TelemetryRecord, COL_ALTITUDE, COL_LATITUDE, COL_LONGITUDE,
    COL_SOURCE, COL_STATION, COL_STATION_ALIAS, COL_STATION_LATITUDE, COL_STATION_LONGITUDE,
    COL_TIME, COMPUTED_COLUMNS,
};

/// Where each column lives in a given file.
///
#[derive(Debug)]
struct Layout {
    source: Option<usize>,
    station: usize,
    time: usize,
    altitude: usize,
    latitude: usize,
    longitude: usize,
    station_latitude: usize,
    station_longitude: usize,
    extra: Vec<usize>,
}

impl Layout {
    fn new(headers: &StringRecord, origin: &str) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h == name);
        let need = |name: &str| {
            find(name).ok_or_else(|| Status::MissingColumn {
                file: origin.to_string(),
                column: name.to_string(),
            })
        };

        let station = match find(COL_STATION) {
            Some(i) => i,
            None => need(COL_STATION_ALIAS).map_err(|_| Status::MissingColumn {
                file: origin.to_string(),
                column: COL_STATION.to_string(),
            })?,
        };
        let mut layout = Layout {
            source: find(COL_SOURCE),
            station,
            time: need(COL_TIME)?,
            altitude: need(COL_ALTITUDE)?,
            latitude: need(COL_LATITUDE)?,
            longitude: need(COL_LONGITUDE)?,
            station_latitude: need(COL_STATION_LATITUDE)?,
            station_longitude: need(COL_STATION_LONGITUDE)?,
            extra: vec![],
        };
        let typed = layout.typed();
        layout.extra = (0..headers.len())
            .filter(|i| !typed.contains(i))
            .filter(|&i| {
                let name = headers.get(i).unwrap_or_default();
                if COMPUTED_COLUMNS.iter().any(|c| *c == name) {
                    warn!("{}: column {} will be computed again", origin, name);
                    return false;
                }
                true
            })
            .collect();
        Ok(layout)
    }

    fn typed(&self) -> Vec<usize> {
        let mut typed = vec![
            self.station,
            self.time,
            self.altitude,
            self.latitude,
            self.longitude,
            self.station_latitude,
            self.station_longitude,
        ];
        typed.extend(self.source);
        typed
    }
}

/// Parse one line according to `layout`.
///
struct LineParser<'a> {
    origin: &'a str,
    headers: &'a StringRecord,
    record: &'a StringRecord,
}

impl LineParser<'_> {
    fn value(&self, i: usize) -> Option<&str> {
        self.record.get(i).filter(|v| !MISSING.contains(v))
    }

    fn bad(&self, i: usize) -> Status {
        Status::BadValue {
            file: self.origin.to_string(),
            line: self.record.position().map(|p| p.line()).unwrap_or_default(),
            column: self.headers.get(i).unwrap_or_default().to_string(),
            value: self.record.get(i).unwrap_or_default().to_string(),
        }
    }

    fn text(&self, i: usize) -> String {
        self.value(i).unwrap_or_default().to_string()
    }

    /// Finite numbers only, `inf` is as bad as `north`.
    ///
    fn float(&self, i: usize) -> Result<Option<f64>, Status> {
        match self.value(i) {
            Some(v) => match v.parse::<f64>() {
                Ok(f) if f.is_finite() => Ok(Some(f)),
                _ => Err(self.bad(i)),
            },
            None => Ok(None),
        }
    }

    /// Epoch seconds, `1500.0` is fine but `1500.5` is not.
    ///
    fn time(&self, i: usize) -> Result<Option<i64>, Status> {
        let Some(v) = self.value(i) else {
            return Ok(None);
        };
        if let Ok(t) = v.parse::<i64>() {
            return Ok(Some(t));
        }
        match v.parse::<f64>() {
            Ok(t) if t.is_finite() && t.fract() == 0. => Ok(Some(t as i64)),
            _ => Err(self.bad(i)),
        }
    }

    fn parse(&self, layout: &Layout) -> TelemetryRecord {
        let mut record = TelemetryRecord {
            source: layout.source.map(|i| self.text(i)).unwrap_or_default(),
            station_id: self.text(layout.station),
            extra: layout
                .extra
                .iter()
                .map(|&i| self.record.get(i).unwrap_or_default().to_string())
                .collect(),
            ..TelemetryRecord::default()
        };

        // No altitude means the record is dropped, do not look further.
        //
        match self.float(layout.altitude) {
            Ok(Some(altitude)) => record.altitude = Some(altitude),
            Ok(None) => return record,
            Err(e) => {
                record.invalid = Some(e);
                return record;
            }
        }

        let mut invalid = None;
        record.time = keep_first(self.time(layout.time), &mut invalid);
        record.latitude = keep_first(self.float(layout.latitude), &mut invalid);
        record.longitude = keep_first(self.float(layout.longitude), &mut invalid);
        record.station_latitude = keep_first(self.float(layout.station_latitude), &mut invalid);
        record.station_longitude = keep_first(self.float(layout.station_longitude), &mut invalid);
        record.invalid = invalid;
        record
    }
}

/// Value if any, otherwise remember the first error.
///
fn keep_first<T>(value: Result<Option<T>, Status>, invalid: &mut Option<Status>) -> Option<T> {
    match value {
        Ok(v) => v,
        Err(e) => {
            invalid.get_or_insert(e);
            None
        }
    }
}

/// Read CSV telemetry, `origin` is used in error messages.
///
#[tracing::instrument(skip(rdr))]
pub fn read_csv<R: Read>(rdr: R, origin: &str) -> Result<TelemetryBatch> {
    trace!("enter");

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(rdr);

    let headers = rdr.headers()?.clone();
    let layout = Layout::new(&headers, origin)?;
    debug!("layout={:?}", layout);

    let mut records = vec![];
    for record in rdr.records() {
        let record = record?;
        let line = LineParser {
            origin,
            headers: &headers,
            record: &record,
        };
        records.push(line.parse(&layout));
    }
    let invalid = records.iter().filter(|r| r.invalid.is_some()).count();
    if invalid > 0 {
        debug!("{} records with unparsable values in {}", invalid, origin);
    }

    let extra_columns = layout
        .extra
        .iter()
        .map(|&i| headers.get(i).unwrap_or_default().to_string())
        .collect();
    Ok(TelemetryBatch {
        extra_columns,
        records,
    })
}

/// Read a Parquet file.
///
/// The dataframe is dumped as CSV into a temporary file then read back by [`read_csv`].
///
#[tracing::instrument]
pub fn read_parquet(path: &Path) -> Result<TelemetryBatch> {
    trace!("enter");

    let file = File::open(path)?;
    let mut df = ParquetReader::new(file).finish()?;
    debug!("{} rows in {:?}", df.height(), path);

    let mut tmpf = Builder::new().suffix(".csv").tempfile()?;
    CsvWriter::new(tmpf.as_file_mut())
        .include_header(true)
        .finish(&mut df)?;

    read_csv(tmpf.reopen()?, &path.to_string_lossy())
}

/// Read one file, according to its extension.
///
#[tracing::instrument]
pub fn read_file(path: &Path) -> Result<TelemetryBatch> {
    match Container::from(path) {
        Container::CSV => read_csv(File::open(path)?, &path.to_string_lossy()),
        Container::Parquet => read_parquet(path),
        Container::Raw => Err(Status::UnsupportedInput(path.to_string_lossy().to_string()).into()),
    }
}

/// Read a file or every CSV and Parquet file of a directory, in file name order.
///
/// Sub-directories are not visited and other files are skipped.  Records are concatenated as
/// they come, duplicates included.
///
#[tracing::instrument]
pub fn read_path(path: &Path) -> Result<TelemetryBatch> {
    trace!("enter");

    if !path.is_dir() {
        return read_file(path);
    }

    let mut files = fs::read_dir(path)?
        .map(|e| e.map(|e| e.path()))
        .collect::<Result<Vec<PathBuf>, _>>()?;
    files.retain(|p| p.is_file());
    files.sort();

    let files: Vec<PathBuf> = files
        .into_iter()
        .filter(|p| match Container::from(p.as_path()) {
            Container::Raw => {
                warn!("skipping {:?}", p);
                false
            }
            _ => true,
        })
        .collect();

    if files.is_empty() {
        return Err(Status::NoInputFiles(path.to_string_lossy().to_string()).into());
    }
    info!("reading {} files from {:?}", files.len(), path);

    let batches = files
        .par_iter()
        .map(|p| read_file(p))
        .collect::<Result<Vec<_>>>()?;
    Ok(TelemetryBatch::concat(batches))
}
