//! Station-usage counts for the neighborhood map.

use std::collections::BTreeMap;

use bikeshare_analytics_models::{MapCenter, StationUsage};
use bikeshare_trip_models::StationEvent;

/// Counts visits per station.
///
/// Stations are keyed by (name, latitude, longitude), so a station that
/// moved shows up once per position. Output is sorted by that key.
pub fn station_usage<'a, I>(events: I) -> Vec<StationUsage>
where
    I: IntoIterator<Item = &'a StationEvent>,
{
    let mut counts: BTreeMap<(&str, u64, u64), u64> = BTreeMap::new();
    for event in events {
        let key = (
            event.station_name.as_str(),
            event.station_latitude.to_bits(),
            event.station_longitude.to_bits(),
        );
        *counts.entry(key).or_default() += 1;
    }

    let mut usage: Vec<StationUsage> = counts
        .into_iter()
        .map(|((name, lat, lon), usage_count)| StationUsage {
            station_name: name.to_string(),
            latitude: f64::from_bits(lat),
            longitude: f64::from_bits(lon),
            usage_count,
        })
        .collect();
    usage.sort_by(|a, b| {
        a.station_name
            .cmp(&b.station_name)
            .then(a.latitude.total_cmp(&b.latitude))
            .then(a.longitude.total_cmp(&b.longitude))
    });
    usage
}

/// Mean station position, or `None` for an empty map.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn map_center(stations: &[StationUsage]) -> Option<MapCenter> {
    if stations.is_empty() {
        return None;
    }
    let n = stations.len() as f64;
    Some(MapCenter {
        latitude: stations.iter().map(|s| s.latitude).sum::<f64>() / n,
        longitude: stations.iter().map(|s| s.longitude).sum::<f64>() / n,
    })
}
