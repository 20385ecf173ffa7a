//! Spherical-earth geometry between a drone and a ground station.
//!
//! Everything here is pure.  Distances use the haversine formula on a sphere of radius
//! [`EARTH_RADIUS_KM`], angles are rounded half-to-even.
//!
//! The batch form [`batch_geometry`] runs over a slice with `rayon`, results in input order.
//!

use rayon::prelude::*;

/// Mean earth radius in kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A point on the sphere, in degrees.
///
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
    pub lat: f64,
    pub lon: f64,
}

impl Position {
    pub fn new(lat: f64, lon: f64) -> Self {
        Position { lat, lon }
    }

    /// Only a point if both coordinates are known.
    ///
    pub fn from_opt(lat: Option<f64>, lon: Option<f64>) -> Option<Self> {
        Some(Position::new(lat?, lon?))
    }
}

/// Drone altitude minus station ground elevation, unknown if the station is.
///
#[inline]
pub fn relative_altitude(altitude: f64, ground_elevation: Option<f64>) -> Option<f64> {
    ground_elevation.map(|ground| altitude - ground)
}

/// Great-circle distance in kilometers.
///
pub fn haversine_km(from: Position, to: Position) -> f64 {
    let (lat1, lat2) = (from.lat.to_radians(), to.lat.to_radians());
    let d_lat = lat2 - lat1;
    let d_lon = to.lon.to_radians() - from.lon.to_radians();

    let a = (d_lat / 2.).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.).sin().powi(2);
    // rounding can push `a` a hair above 1 near the antipodes
    let a = if a > 1. { 1. } else { a };
    let c = 2. * a.sqrt().atan2((1. - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Initial bearing from `from` toward `to`, degrees clockwise from north in `[0, 360)`.
///
pub fn initial_bearing(from: Position, to: Position) -> f64 {
    let (lat1, lat2) = (from.lat.to_radians(), to.lat.to_radians());
    let d_lon = to.lon.to_radians() - from.lon.to_radians();

    let x = d_lon.sin() * lat2.cos();
    let y = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();
    (x.atan2(y).to_degrees() + 360.) % 360.
}

/// Initial bearing rounded to the degree.
///
/// A bearing of 359.5° or more rounds to 360 which is folded back to 0.
///
pub fn azimuth_deg(from: Position, to: Position) -> u16 {
    let az = initial_bearing(from, to).round_ties_even();
    if az >= 360. {
        0
    } else {
        az as u16
    }
}

/// Elevation angle of the drone seen from the station, in tenths of a degree.
///
/// `atan2(relative_altitude, distance)` so a drone right above the station is at 900, right
/// below at -900.
///
pub fn elevation_angle(relative_altitude: Option<f64>, distance_km: f64) -> Option<i32> {
    relative_altitude.map(|h| (h.atan2(distance_km * 1000.).to_degrees() * 10.).round_ties_even() as i32)
}

/// What we know about one observation.
///
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Sample {
    /// Drone position, unknown without a GPS fix
    pub drone: Option<Position>,
    /// Drone absolute altitude (m)
    pub altitude: f64,
    /// Station position
    pub station: Option<Position>,
    /// Station ground elevation (m) if the station is known
    pub ground_elevation: Option<f64>,
}

/// Everything derived from a `Sample`.
///
/// Distance and azimuth need both positions, the elevation angle needs the distance and the
/// station elevation.
///
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Geometry {
    pub relative_altitude: Option<f64>,
    pub distance_km: Option<f64>,
    pub azimuth_deg: Option<u16>,
    pub elevation_angle_deg: Option<i32>,
}

impl From<&Sample> for Geometry {
    fn from(s: &Sample) -> Self {
        let relative_altitude = relative_altitude(s.altitude, s.ground_elevation);
        let (distance_km, azimuth_deg) = match (s.drone, s.station) {
            (Some(drone), Some(station)) => (
                Some(haversine_km(drone, station)),
                Some(azimuth_deg(drone, station)),
            ),
            _ => (None, None),
        };
        Geometry {
            relative_altitude,
            distance_km,
            azimuth_deg,
            elevation_angle_deg: distance_km.and_then(|d| elevation_angle(relative_altitude, d)),
        }
    }
}

/// Compute the geometry of every sample, in parallel, keeping the order.
///
#[tracing::instrument(skip(samples))]
pub fn batch_geometry(samples: &[Sample]) -> Vec<Geometry> {
    samples.par_iter().map(Geometry::from).collect()
}
