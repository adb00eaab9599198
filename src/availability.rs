// Availability window stamped onto every record of the car data file.
//
// Works on raw JSON values so fields this crate does not model survive a
// rewrite untouched.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

use crate::models::Availability;

pub fn availability_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, 12, 30).unwrap_or(NaiveDate::MAX)
}

pub fn availability_window(today: NaiveDate) -> Availability {
    Availability {
        start_date: today,
        end_date: availability_end(),
        is_available: true,
    }
}

/// Overwrite the `availability` field of every object in `cars`.
/// Returns how many records were stamped; non-objects are skipped.
pub fn stamp_availability(cars: &mut [Value], window: &Availability) -> Result<usize> {
    let stamp = serde_json::to_value(window).context("Failed to encode availability window")?;
    let mut stamped = 0;
    for car in cars.iter_mut() {
        match car.as_object_mut() {
            Some(fields) => {
                fields.insert("availability".to_string(), stamp.clone());
                stamped += 1;
            }
            None => tracing::warn!("Skipping non-object entry in car data"),
        }
    }
    Ok(stamped)
}

/// Read the data file, stamp it and write it back with two-space indentation.
pub fn refresh_file(path: &Path, today: NaiveDate) -> Result<usize> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let mut cars: Vec<Value> =
        serde_json::from_str(&raw).with_context(|| format!("{} is not a JSON array", path.display()))?;

    let stamped = stamp_availability(&mut cars, &availability_window(today))?;

    let mut out = Vec::with_capacity(raw.len());
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"  ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    cars.serialize(&mut serializer)
        .context("Failed to encode car data")?;
    std::fs::write(path, out).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(stamped)
}
