//! Average trip duration between two stations.

use bikeshare_analytics_models::DurationLookup;
use bikeshare_trip_models::TripRecord;

/// Mean duration of trips from `start` to `end`.
///
/// Identical stations short-circuit to [`DurationLookup::SameStation`]
/// without scanning the trips.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn average_duration(trips: &[TripRecord], start: &str, end: &str) -> DurationLookup {
    if start == end {
        return DurationLookup::SameStation;
    }

    let (total, count) = trips
        .iter()
        .filter(|t| t.start_station_name == start && t.end_station_name == end)
        .fold((0.0_f64, 0_u64), |(total, count), t| {
            (total + t.trip_duration, count + 1)
        });

    if count == 0 {
        return DurationLookup::NoTrips;
    }

    DurationLookup::Average {
        seconds: total / count as f64,
        trips: count,
    }
}
