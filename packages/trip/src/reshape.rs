//! Start/stop reshaping of trips into station-visit events.
//!
//! Every trip contributes one event built from its start-side columns and
//! one built from its stop-side columns, both renamed onto the
//! [`EventField`] schema. The output holds all start events followed by all
//! stop events; callers must not depend on that order.

use std::collections::{BTreeMap, BTreeSet};

use bikeshare_trip_models::{CellValue, EventField, StationEvent, TripField, TripRecord};
use serde::{Deserialize, Serialize};

use crate::TripError;

/// Which trip columns make up each side of a trip, and what each one is
/// called in the event schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReshapeSpec {
    /// Trip column -> event column renaming.
    pub mapping: BTreeMap<TripField, EventField>,
    /// Columns describing where and when the trip started.
    pub start: Vec<TripField>,
    /// Columns describing where and when the trip ended.
    pub stop: Vec<TripField>,
}

impl Default for ReshapeSpec {
    fn default() -> Self {
        let mapping = BTreeMap::from([
            (
                TripField::StartStationLongitude,
                EventField::StationLongitude,
            ),
            (TripField::StartStationLatitude, EventField::StationLatitude),
            (TripField::StartTime, EventField::Time),
            (TripField::StartStationName, EventField::StationName),
            (TripField::EndStationLongitude, EventField::StationLongitude),
            (TripField::EndStationLatitude, EventField::StationLatitude),
            (TripField::StopTime, EventField::Time),
            (TripField::EndStationName, EventField::StationName),
        ]);

        Self {
            mapping,
            start: vec![
                TripField::StartStationLongitude,
                TripField::StartStationLatitude,
                TripField::StartTime,
                TripField::StartStationName,
            ],
            stop: vec![
                TripField::EndStationLongitude,
                TripField::EndStationLatitude,
                TripField::StopTime,
                TripField::EndStationName,
            ],
        }
    }
}

impl ReshapeSpec {
    /// Resolves one column group against the mapping.
    ///
    /// The group must map onto every event column exactly once, with
    /// matching value kinds.
    fn resolve(
        &self,
        side: &str,
        group: &[TripField],
    ) -> Result<Vec<(TripField, EventField)>, TripError> {
        let mut covered = BTreeSet::new();
        let mut resolved = Vec::with_capacity(group.len());

        for &from in group {
            let Some(&to) = self.mapping.get(&from) else {
                return Err(TripError::Mapping {
                    message: format!("{side} column '{from}' has no target column"),
                });
            };
            if from.kind() != to.kind() {
                return Err(TripError::Mapping {
                    message: format!("{side} column '{from}' cannot be stored in '{to}'"),
                });
            }
            if !covered.insert(to) {
                return Err(TripError::Mapping {
                    message: format!("{side} columns map onto '{to}' more than once"),
                });
            }
            resolved.push((from, to));
        }

        if let Some(missing) = EventField::ALL.iter().find(|f| !covered.contains(*f)) {
            return Err(TripError::Mapping {
                message: format!("{side} columns do not provide '{missing}'"),
            });
        }

        Ok(resolved)
    }
}

/// Builds one event from a trip using already-validated column pairs.
fn project(trip: &TripRecord, columns: &[(TripField, EventField)]) -> StationEvent {
    let mut event = StationEvent {
        station_name: String::new(),
        station_longitude: f64::NAN,
        station_latitude: f64::NAN,
        time: trip.start_time,
    };

    for &(from, to) in columns {
        let cell = trip.field(from);
        match to {
            EventField::StationName => {
                if let CellValue::Text(name) = cell {
                    event.station_name = name.to_string();
                }
            }
            EventField::StationLongitude => {
                event.station_longitude = cell.as_f64().unwrap_or(f64::NAN);
            }
            EventField::StationLatitude => {
                event.station_latitude = cell.as_f64().unwrap_or(f64::NAN);
            }
            EventField::Time => {
                if let Some(time) = cell.as_time() {
                    event.time = time;
                }
            }
        }
    }

    event
}

/// Reshapes trips into station-visit events, two per trip.
///
/// # Errors
///
/// Returns [`TripError::Mapping`] if the start and stop groups overlap, or
/// if either group does not map onto the complete event schema.
pub fn reshape(trips: &[TripRecord], spec: &ReshapeSpec) -> Result<Vec<StationEvent>, TripError> {
    if let Some(shared) = spec.start.iter().find(|f| spec.stop.contains(*f)) {
        return Err(TripError::Mapping {
            message: format!("column '{shared}' is in both the start and stop groups"),
        });
    }

    let start = spec.resolve("start", &spec.start)?;
    let stop = spec.resolve("stop", &spec.stop)?;

    let mut events = Vec::with_capacity(trips.len() * 2);
    events.extend(trips.iter().map(|t| project(t, &start)));
    events.extend(trips.iter().map(|t| project(t, &stop)));

    log::debug!(
        "Reshaped {} trips into {} station events",
        trips.len(),
        events.len()
    );

    Ok(events)
}
