use chrono::DateTime;
use eyre::Result;
use tracing::trace;

use acute_enrich::StationRecord;

use crate::cli::ResolveOpts;
use crate::config::Context;

#[tracing::instrument(skip(ctx))]
pub fn list_stations(ctx: &Context) -> Result<()> {
    trace!("enter");
    println!("{}", ctx.registry.current().list());
    Ok(())
}

/// Report overlapping installations, the first one listed is the one used.
///
#[tracing::instrument(skip(ctx))]
pub fn check_stations(ctx: &Context) -> Result<()> {
    trace!("enter");

    let registry = ctx.registry.current();
    let overlaps = registry.overlaps();
    if overlaps.is_empty() {
        println!("No overlapping installations in {} records.", registry.len());
        return Ok(());
    }

    println!("{} overlapping installation(s):", overlaps.len());
    for o in overlaps {
        if let (Some(first), Some(second)) = (registry.get(o.first), registry.get(o.second)) {
            println!(
                "  {}: {} (#{}) shadows {} (#{})",
                first.station_id,
                describe(first),
                o.first,
                describe(second),
                o.second
            );
        }
    }
    Ok(())
}

#[tracing::instrument(skip(ctx))]
pub fn resolve_station(ctx: &Context, ropts: &ResolveOpts) -> Result<()> {
    trace!("enter");

    let registry = ctx.registry.current();
    match registry.resolve(&ropts.station_id, ropts.timestamp) {
        Some(s) => println!(
            "{} at {}: {} ({}, {}) elevation {} m",
            s.station_id,
            ropts.timestamp,
            describe(s),
            s.latitude,
            s.longitude,
            s.ground_elevation
        ),
        None => println!(
            "{} at {}: no installation",
            ropts.station_id, ropts.timestamp
        ),
    }
    Ok(())
}

fn describe(s: &StationRecord) -> String {
    let until = match s.valid_until {
        Some(t) => date(t),
        None => "now".to_string(),
    };
    format!("{} [{} - {}]", s.display_name, date(s.valid_from), until)
}

fn date(ts: i64) -> String {
    match DateTime::from_timestamp(ts, 0) {
        Some(t) => t.format("%Y-%m-%d").to_string(),
        None => ts.to_string(),
    }
}
