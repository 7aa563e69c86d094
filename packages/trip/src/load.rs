//! Trip-history CSV loading.
//!
//! The whole file is read once. Rows with a missing or unparseable required
//! field are dropped and counted rather than reported as errors.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use bikeshare_trip_models::{TripField, TripRecord, month_of};
use chrono::{DateTime, Datelike as _, NaiveDate, NaiveDateTime};
use serde::Deserialize;

use crate::TripError;
use crate::progress::ProgressCallback;

/// A trip row exactly as it appears in the file, before validation.
#[derive(Debug, Deserialize)]
struct RawTripRow {
    #[serde(rename = "tripduration")]
    trip_duration: Option<String>,
    #[serde(rename = "starttime")]
    start_time: Option<String>,
    #[serde(rename = "stoptime")]
    stop_time: Option<String>,
    #[serde(rename = "start station name")]
    start_station_name: Option<String>,
    #[serde(rename = "start station latitude")]
    start_station_latitude: Option<String>,
    #[serde(rename = "start station longitude")]
    start_station_longitude: Option<String>,
    #[serde(rename = "end station name")]
    end_station_name: Option<String>,
    #[serde(rename = "end station latitude")]
    end_station_latitude: Option<String>,
    #[serde(rename = "end station longitude")]
    end_station_longitude: Option<String>,
    #[serde(rename = "usertype")]
    user_type: Option<String>,
}

impl RawTripRow {
    /// Validates every required field. Returns `None` if any is missing.
    fn into_record(self) -> Option<TripRecord> {
        let start_time = parse_timestamp(non_empty(self.start_time.as_deref())?)?;
        let stop_time = parse_timestamp(non_empty(self.stop_time.as_deref())?)?;

        Some(TripRecord {
            trip_duration: parse_number(self.trip_duration.as_deref())?,
            start_time,
            stop_time,
            start_station_name: non_empty(self.start_station_name.as_deref())?.to_string(),
            start_station_latitude: parse_number(self.start_station_latitude.as_deref())?,
            start_station_longitude: parse_number(self.start_station_longitude.as_deref())?,
            end_station_name: non_empty(self.end_station_name.as_deref())?.to_string(),
            end_station_latitude: parse_number(self.end_station_latitude.as_deref())?,
            end_station_longitude: parse_number(self.end_station_longitude.as_deref())?,
            user_type: non_empty(self.user_type.as_deref())?.to_string(),
            year: start_time.year(),
            month: month_of(&start_time),
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn parse_number(value: Option<&str>) -> Option<f64> {
    non_empty(value)?
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

const TIMESTAMP_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parses a trip timestamp.
///
/// Accepts `2022-08-01 00:00:19.1800` (with or without fractional
/// seconds), the same with a `T` separator, RFC 3339, and a bare
/// `2022-08-01` which resolves to midnight.
///
/// Timestamps are local wall-clock times. An RFC 3339 offset is dropped
/// rather than applied, so `2022-08-01T08:00:00-04:00` sorts and filters
/// alongside a naive `2022-08-01 08:00:00` from the same system.
#[must_use]
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    for fmt in TIMESTAMP_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Reads trips from any CSV source.
///
/// Progress advances by the number of bytes consumed.
///
/// # Errors
///
/// * [`TripError::MissingColumn`] if the header lacks a required column
/// * [`TripError::Csv`] / [`TripError::Io`] if the underlying reader fails
pub fn read_trips<R: Read>(
    reader: R,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<Vec<TripRecord>, TripError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    for field in TripField::REQUIRED {
        if !headers.iter().any(|h| h == field.as_ref()) {
            return Err(TripError::MissingColumn {
                column: field.to_string(),
            });
        }
    }

    let mut trips = Vec::new();
    let mut dropped = 0u64;
    let mut record = csv::StringRecord::new();
    let mut consumed = 0u64;

    loop {
        match rdr.read_record(&mut record) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                log::debug!("Dropping unreadable trip row: {e}");
                dropped += 1;
                continue;
            }
        }

        let position = rdr.position().byte();
        progress.inc(position.saturating_sub(consumed));
        consumed = position;

        let raw = match record.deserialize::<RawTripRow>(Some(&headers)) {
            Ok(raw) => raw,
            Err(e) => {
                log::debug!("Dropping malformed trip row: {e}");
                dropped += 1;
                continue;
            }
        };

        if let Some(trip) = raw.into_record() {
            trips.push(trip);
        } else {
            dropped += 1;
        }
    }

    log::info!(
        "Loaded {} trips ({dropped} rows dropped for missing fields)",
        trips.len()
    );

    Ok(trips)
}

/// Loads the trip-history file at `path`.
///
/// # Errors
///
/// Returns [`TripError`] if the file cannot be opened or read, or if its
/// header is missing a required column.
pub fn load_trips(
    path: &Path,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<Vec<TripRecord>, TripError> {
    log::info!("Reading trips from {}", path.display());
    progress.set_message(format!("Reading {}", path.display()));

    let file = File::open(path)?;
    progress.set_total(file.metadata()?.len());
    let trips = read_trips(file, progress)?;

    progress.finish(format!("Loaded {} trips", trips.len()));
    Ok(trips)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::null_progress;
    use chrono::Month;

    const HEADER: &str = "\"tripduration\",\"starttime\",\"stoptime\",\"start station id\",\
\"start station name\",\"start station latitude\",\"start station longitude\",\
\"end station id\",\"end station name\",\"end station latitude\",\"end station longitude\",\
\"bikeid\",\"usertype\",\"postal code\"";

    fn csv(rows: &[&str]) -> String {
        let mut out = HEADER.to_string();
        for row in rows {
            out.push('\n');
            out.push_str(row);
        }
        out
    }

    #[test]
    fn loads_complete_rows_and_derives_calendar_fields() {
        let data = csv(&[
            "597,\"2022-08-01 00:00:19.1800\",\"2022-08-01 00:10:16.6140\",67,\
\"MIT at Mass Ave / Amherst St\",42.3581,-71.0936,179,\"MIT Vassar St\",42.3562,-71.1040,\
5478,\"Subscriber\",\"02139\"",
        ]);
        let trips = read_trips(data.as_bytes(), &null_progress()).unwrap();

        assert_eq!(trips.len(), 1);
        let trip = &trips[0];
        assert!((trip.trip_duration - 597.0).abs() < f64::EPSILON);
        assert_eq!(trip.start_station_name, "MIT at Mass Ave / Amherst St");
        assert_eq!(trip.end_station_name, "MIT Vassar St");
        assert_eq!(trip.user_type, "Subscriber");
        assert_eq!(trip.year, 2022);
        assert_eq!(trip.month, Month::August);
    }

    #[test]
    fn drops_rows_with_missing_fields() {
        let data = csv(&[
            "597,2022-08-01 00:00:19,2022-08-01 00:10:16,67,A,42.35,-71.09,179,B,42.35,-71.10,1,Subscriber,02139",
            "600,2022-08-01 01:00:00,2022-08-01 01:10:00,67,A,42.35,-71.09,179,,42.35,-71.10,1,Customer,02139",
            "600,not-a-time,2022-08-01 01:10:00,67,A,42.35,-71.09,179,B,42.35,-71.10,1,Customer,02139",
            "abc,2022-08-01 01:00:00,2022-08-01 01:10:00,67,A,42.35,-71.09,179,B,42.35,-71.10,1,Customer,02139",
            "600,2022-08-01 01:00:00,2022-08-01 01:10:00,67,A,42.35",
        ]);
        let trips = read_trips(data.as_bytes(), &null_progress()).unwrap();
        assert_eq!(trips.len(), 1);
        assert_eq!(trips[0].user_type, "Subscriber");
    }

    #[test]
    fn rejects_missing_required_column() {
        let data = "tripduration,starttime\n1,2022-08-01 00:00:00";
        let err = read_trips(data.as_bytes(), &null_progress()).unwrap_err();
        assert!(
            matches!(err, TripError::MissingColumn { ref column } if column == "stoptime"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn parses_supported_timestamp_formats() {
        let expected = NaiveDate::from_ymd_opt(2022, 8, 1)
            .unwrap()
            .and_hms_opt(0, 0, 19)
            .unwrap();
        assert_eq!(parse_timestamp("2022-08-01 00:00:19"), Some(expected));
        assert_eq!(parse_timestamp("2022-08-01T00:00:19"), Some(expected));
        assert_eq!(parse_timestamp("2022-08-01T00:00:19Z"), Some(expected));
        assert_eq!(
            parse_timestamp("2022-08-01"),
            NaiveDate::from_ymd_opt(2022, 8, 1).unwrap().and_hms_opt(0, 0, 0)
        );
        assert!(parse_timestamp("08/01/2022").is_none());
    }

    #[test]
    fn offset_timestamps_keep_wall_clock_time() {
        let eight_am = NaiveDate::from_ymd_opt(2022, 8, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        assert_eq!(parse_timestamp("2022-08-01T08:00:00-04:00"), Some(eight_am));
        assert_eq!(parse_timestamp("2022-08-01T08:00:00+02:00"), Some(eight_am));
        assert_eq!(
            parse_timestamp("2022-08-01T08:00:00-04:00"),
            parse_timestamp("2022-08-01 08:00:00")
        );
    }
}
