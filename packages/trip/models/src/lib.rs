#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Trip record and station-visit event types.
//!
//! A [`TripRecord`] is one bike rental as read from the trip-history file.
//! A [`StationEvent`] is one end of a trip (the start or the stop) under a
//! shared schema, so that start and stop visits can be counted together.
//!
//! Both types expose their fields by column name through [`Columnar`], which
//! is how the aggregation code addresses arbitrary columns without knowing
//! the concrete row type.

use std::fmt;

use chrono::{Datelike as _, Month, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Display format used for timestamps rendered as cell labels.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single cell borrowed from a row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellValue<'a> {
    /// Categorical or free text.
    Text(&'a str),
    /// Whole number (e.g. a derived year).
    Integer(i64),
    /// Floating-point measurement (coordinates, durations).
    Number(f64),
    /// Wall-clock timestamp.
    Time(NaiveDateTime),
}

impl CellValue<'_> {
    /// Numeric view of the cell, if it holds a number.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(v) => Some(*v as f64),
            Self::Number(v) => Some(*v),
            Self::Text(_) | Self::Time(_) => None,
        }
    }

    /// Timestamp view of the cell, if it holds a time.
    #[must_use]
    pub const fn as_time(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Time(t) => Some(*t),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Number(v) => write!(f, "{v}"),
            Self::Time(t) => write!(f, "{}", t.format(TIMESTAMP_FORMAT)),
        }
    }
}

/// Rows whose fields can be looked up by column name.
pub trait Columnar {
    /// Returns the cell for `column`, or `None` if the row has no such column.
    fn cell(&self, column: &str) -> Option<CellValue<'_>>;
}

impl<T: Columnar + ?Sized> Columnar for &T {
    fn cell(&self, column: &str) -> Option<CellValue<'_>> {
        (**self).cell(column)
    }
}

/// The shape of value a column holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Text value.
    Text,
    /// Whole number.
    Integer,
    /// Floating-point number.
    Number,
    /// Timestamp.
    Time,
}

/// Columns of the trip-history table, named as they appear in the source
/// file header.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum TripField {
    /// Trip duration in seconds.
    #[serde(rename = "tripduration")]
    #[strum(serialize = "tripduration")]
    TripDuration,
    /// When the bike was undocked.
    #[serde(rename = "starttime")]
    #[strum(serialize = "starttime")]
    StartTime,
    /// When the bike was docked.
    #[serde(rename = "stoptime")]
    #[strum(serialize = "stoptime")]
    StopTime,
    /// Name of the origin station.
    #[serde(rename = "start station name")]
    #[strum(serialize = "start station name")]
    StartStationName,
    /// Latitude of the origin station.
    #[serde(rename = "start station latitude")]
    #[strum(serialize = "start station latitude")]
    StartStationLatitude,
    /// Longitude of the origin station.
    #[serde(rename = "start station longitude")]
    #[strum(serialize = "start station longitude")]
    StartStationLongitude,
    /// Name of the destination station.
    #[serde(rename = "end station name")]
    #[strum(serialize = "end station name")]
    EndStationName,
    /// Latitude of the destination station.
    #[serde(rename = "end station latitude")]
    #[strum(serialize = "end station latitude")]
    EndStationLatitude,
    /// Longitude of the destination station.
    #[serde(rename = "end station longitude")]
    #[strum(serialize = "end station longitude")]
    EndStationLongitude,
    /// Rider category (e.g. "Subscriber", "Customer").
    #[serde(rename = "usertype")]
    #[strum(serialize = "usertype")]
    UserType,
    /// Calendar year of the start time (derived).
    #[serde(rename = "year")]
    #[strum(serialize = "year")]
    Year,
    /// Calendar month name of the start time (derived).
    #[serde(rename = "month")]
    #[strum(serialize = "month")]
    Month,
}

impl TripField {
    /// Columns that must be present in the source file header.
    pub const REQUIRED: &[Self] = &[
        Self::TripDuration,
        Self::StartTime,
        Self::StopTime,
        Self::StartStationName,
        Self::StartStationLatitude,
        Self::StartStationLongitude,
        Self::EndStationName,
        Self::EndStationLatitude,
        Self::EndStationLongitude,
        Self::UserType,
    ];

    /// Returns the kind of value stored in this column.
    #[must_use]
    pub const fn kind(self) -> FieldKind {
        match self {
            Self::StartStationName | Self::EndStationName | Self::UserType | Self::Month => {
                FieldKind::Text
            }
            Self::TripDuration
            | Self::StartStationLatitude
            | Self::StartStationLongitude
            | Self::EndStationLatitude
            | Self::EndStationLongitude => FieldKind::Number,
            Self::StartTime | Self::StopTime => FieldKind::Time,
            Self::Year => FieldKind::Integer,
        }
    }
}

/// Columns of the station-visit event table.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum EventField {
    /// Station name.
    #[serde(rename = "station name")]
    #[strum(serialize = "station name")]
    StationName,
    /// Station longitude.
    #[serde(rename = "station longitude")]
    #[strum(serialize = "station longitude")]
    StationLongitude,
    /// Station latitude.
    #[serde(rename = "station latitude")]
    #[strum(serialize = "station latitude")]
    StationLatitude,
    /// When the visit happened.
    #[serde(rename = "time")]
    #[strum(serialize = "time")]
    Time,
}

impl EventField {
    /// Every column of the event schema.
    pub const ALL: &[Self] = &[
        Self::StationName,
        Self::StationLongitude,
        Self::StationLatitude,
        Self::Time,
    ];

    /// Returns the kind of value stored in this column.
    #[must_use]
    pub const fn kind(self) -> FieldKind {
        match self {
            Self::StationName => FieldKind::Text,
            Self::StationLongitude | Self::StationLatitude => FieldKind::Number,
            Self::Time => FieldKind::Time,
        }
    }
}

/// One bike rental.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripRecord {
    /// Trip duration in seconds.
    pub trip_duration: f64,
    /// Undock time.
    pub start_time: NaiveDateTime,
    /// Dock time.
    pub stop_time: NaiveDateTime,
    /// Origin station name.
    pub start_station_name: String,
    /// Origin station latitude.
    pub start_station_latitude: f64,
    /// Origin station longitude.
    pub start_station_longitude: f64,
    /// Destination station name.
    pub end_station_name: String,
    /// Destination station latitude.
    pub end_station_latitude: f64,
    /// Destination station longitude.
    pub end_station_longitude: f64,
    /// Rider category.
    pub user_type: String,
    /// Year of `start_time`.
    pub year: i32,
    /// Month of `start_time`.
    pub month: Month,
}

impl TripRecord {
    /// Returns the cell for a typed column.
    #[must_use]
    pub fn field(&self, field: TripField) -> CellValue<'_> {
        match field {
            TripField::TripDuration => CellValue::Number(self.trip_duration),
            TripField::StartTime => CellValue::Time(self.start_time),
            TripField::StopTime => CellValue::Time(self.stop_time),
            TripField::StartStationName => CellValue::Text(&self.start_station_name),
            TripField::StartStationLatitude => CellValue::Number(self.start_station_latitude),
            TripField::StartStationLongitude => CellValue::Number(self.start_station_longitude),
            TripField::EndStationName => CellValue::Text(&self.end_station_name),
            TripField::EndStationLatitude => CellValue::Number(self.end_station_latitude),
            TripField::EndStationLongitude => CellValue::Number(self.end_station_longitude),
            TripField::UserType => CellValue::Text(&self.user_type),
            TripField::Year => CellValue::Integer(i64::from(self.year)),
            TripField::Month => CellValue::Text(self.month.name()),
        }
    }
}

impl Columnar for TripRecord {
    fn cell(&self, column: &str) -> Option<CellValue<'_>> {
        column.parse::<TripField>().ok().map(|f| self.field(f))
    }
}

/// One end of a trip under the shared station schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationEvent {
    /// Station name.
    pub station_name: String,
    /// Station longitude.
    pub station_longitude: f64,
    /// Station latitude.
    pub station_latitude: f64,
    /// Undock time for start events, dock time for stop events.
    pub time: NaiveDateTime,
}

impl StationEvent {
    /// Returns the cell for a typed column.
    #[must_use]
    pub fn field(&self, field: EventField) -> CellValue<'_> {
        match field {
            EventField::StationName => CellValue::Text(&self.station_name),
            EventField::StationLongitude => CellValue::Number(self.station_longitude),
            EventField::StationLatitude => CellValue::Number(self.station_latitude),
            EventField::Time => CellValue::Time(self.time),
        }
    }
}

impl Columnar for StationEvent {
    fn cell(&self, column: &str) -> Option<CellValue<'_>> {
        column.parse::<EventField>().ok().map(|f| self.field(f))
    }
}

const MONTHS: [Month; 12] = [
    Month::January,
    Month::February,
    Month::March,
    Month::April,
    Month::May,
    Month::June,
    Month::July,
    Month::August,
    Month::September,
    Month::October,
    Month::November,
    Month::December,
];

/// Returns the calendar month of a timestamp.
#[must_use]
pub fn month_of(time: &NaiveDateTime) -> Month {
    MONTHS[time.month0() as usize]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap()
    }

    fn trip() -> TripRecord {
        TripRecord {
            trip_duration: 600.0,
            start_time: at(2022, 8, 1),
            stop_time: at(2022, 8, 1),
            start_station_name: "Ruggles T Stop".to_string(),
            start_station_latitude: 42.336,
            start_station_longitude: -71.089,
            end_station_name: "Copley Square".to_string(),
            end_station_latitude: 42.349,
            end_station_longitude: -71.077,
            user_type: "Subscriber".to_string(),
            year: 2022,
            month: Month::August,
        }
    }

    #[test]
    fn trip_fields_resolve_by_header_name() {
        let t = trip();
        assert_eq!(t.cell("usertype"), Some(CellValue::Text("Subscriber")));
        assert_eq!(t.cell("month"), Some(CellValue::Text("August")));
        assert_eq!(t.cell("year"), Some(CellValue::Integer(2022)));
        assert_eq!(t.cell("tripduration"), Some(CellValue::Number(600.0)));
        assert!(t.cell("bikeid").is_none());
    }

    #[test]
    fn field_names_roundtrip_through_strum() {
        for field in TripField::REQUIRED {
            let parsed: TripField = field.as_ref().parse().unwrap();
            assert_eq!(parsed, *field);
        }
        for field in EventField::ALL {
            let parsed: EventField = field.to_string().parse().unwrap();
            assert_eq!(parsed, *field);
        }
    }

    #[test]
    fn event_cells_match_kinds() {
        let event = StationEvent {
            station_name: "Ruggles T Stop".to_string(),
            station_longitude: -71.089,
            station_latitude: 42.336,
            time: at(2022, 8, 1),
        };
        for field in EventField::ALL {
            let kind = match event.field(*field) {
                CellValue::Text(_) => FieldKind::Text,
                CellValue::Integer(_) => FieldKind::Integer,
                CellValue::Number(_) => FieldKind::Number,
                CellValue::Time(_) => FieldKind::Time,
            };
            assert_eq!(kind, field.kind(), "{field} has the wrong kind");
        }
    }

    #[test]
    fn month_of_covers_every_month() {
        for m in 1..=12u32 {
            assert_eq!(month_of(&at(2023, m, 15)).number_from_month(), m);
        }
    }

    #[test]
    fn cell_labels_render_for_grouping() {
        assert_eq!(CellValue::Integer(2022).to_string(), "2022");
        assert_eq!(
            CellValue::Time(at(2022, 8, 1)).to_string(),
            "2022-08-01 08:30:00"
        );
        assert_eq!(CellValue::Integer(3).as_f64(), Some(3.0));
        assert_eq!(CellValue::Text("x").as_f64(), None);
    }
}
