//! The dashboard's visualization queries.
//!
//! Each function reads the shared [`DashboardState`] and recomputes its
//! result from scratch; nothing is cached between calls.

use std::collections::BTreeSet;
use std::path::Path;

use bikeshare_analytics::{
    average_duration, filter_in_set, filter_time_window, make_flow, map_center, station_usage,
    top_counts,
};
use bikeshare_analytics_models::{
    DurationLookup, FlowDiagram, RankedCounts, Selection, StationMap,
};
use bikeshare_spatial::BoundarySet;
use bikeshare_spatial::join::NEIGHBORHOOD_COLUMN;
use bikeshare_trip::load::parse_timestamp;
use bikeshare_trip_models::{EventField, TripField};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::DashboardError;
use crate::config::DashboardConfig;
use crate::state::{DashboardState, DateBounds};

/// Matched station events for one boundary polygon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NeighborhoodCoverage {
    /// Neighborhood name.
    pub neighborhood: String,
    /// Station events inside the polygon; zero for empty neighborhoods.
    pub events: usize,
}

/// Values the dashboard controls can offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOptions {
    /// Distinct trip years, ascending.
    pub years: Vec<i32>,
    /// Neighborhoods with at least one station event, sorted.
    pub neighborhoods: Vec<String>,
    /// Event count of every boundary polygon, in file order.
    pub coverage: Vec<NeighborhoodCoverage>,
    /// Distinct start station names, sorted.
    pub stations: Vec<String>,
    /// Start-time range of the trips.
    pub trip_dates: Option<DateBounds>,
    /// Time range of the neighborhood-joined station events.
    pub event_dates: Option<DateBounds>,
}

/// Parses a date or timestamp bound.
///
/// A bare date means midnight at the start of that day.
///
/// # Errors
///
/// Returns [`DashboardError::InvalidDate`] if `s` is not a supported
/// timestamp format.
pub fn parse_date_bound(s: &str) -> Result<NaiveDateTime, DashboardError> {
    parse_timestamp(s).ok_or_else(|| DashboardError::InvalidDate {
        value: s.to_string(),
    })
}

/// Resolves optional window bounds, falling back to `bounds` (or the widest
/// possible window when the table is empty).
///
/// # Errors
///
/// Returns [`DashboardError::InvalidDate`] if a given bound does not parse.
pub fn resolve_window(
    from: Option<&str>,
    to: Option<&str>,
    bounds: Option<DateBounds>,
) -> Result<(NaiveDateTime, NaiveDateTime), DashboardError> {
    let from = match from {
        Some(s) => parse_date_bound(s)?,
        None => bounds.map_or(NaiveDateTime::MIN, |b| b.min),
    };
    let to = match to {
        Some(s) => parse_date_bound(s)?,
        None => bounds.map_or(NaiveDateTime::MAX, |b| b.max),
    };
    Ok((from, to))
}

/// Parses a comma-separated year list, defaulting to the earliest year in
/// the data.
#[must_use]
pub fn resolve_years(state: &DashboardState, years: Option<&str>) -> Selection {
    match years {
        Some(years) => Selection::from_csv(years),
        None => Selection::Many(
            state
                .trips()
                .iter()
                .map(|t| t.year)
                .min()
                .map(|y| y.to_string())
                .into_iter()
                .collect(),
        ),
    }
}

/// Flow diagram over the trips of the selected years.
///
/// # Errors
///
/// Returns [`DashboardError::Analytics`] if the configured flow columns are
/// fewer than two, unknown, or the value column is not numeric.
pub fn flow_for_years(
    state: &DashboardState,
    years: &Selection,
) -> Result<FlowDiagram, DashboardError> {
    let config = state.config();
    let trips = filter_in_set(state.trips(), TripField::Year.as_ref(), years)?;
    log::debug!(
        "Flow over {} trips for years {:?}",
        trips.len(),
        years.to_set()
    );
    Ok(make_flow(&trips, &config.flow_columns, &config.flow)?)
}

/// Most frequent start stations among trips started in `[from, to]`.
///
/// # Errors
///
/// Returns [`DashboardError::Analytics`] if a trip column cannot be read.
pub fn top_start_stations(
    state: &DashboardState,
    from: NaiveDateTime,
    to: NaiveDateTime,
) -> Result<RankedCounts, DashboardError> {
    let config = state.config();
    let trips = filter_time_window(state.trips(), TripField::StartTime.as_ref(), from, to)?;
    Ok(top_counts(
        &trips,
        TripField::StartStationName.as_ref(),
        &config.count_label,
        config.top_stations,
    )?)
}

/// Per-station visit counts inside one neighborhood during `[from, to]`.
///
/// An unknown neighborhood yields an empty map.
///
/// # Errors
///
/// Returns [`DashboardError::Analytics`] if an event column cannot be read.
pub fn station_map(
    state: &DashboardState,
    neighborhood: &str,
    from: NaiveDateTime,
    to: NaiveDateTime,
) -> Result<StationMap, DashboardError> {
    let geo = state.geo();
    let selected = Selection::from(neighborhood);
    let in_neighborhood = filter_in_set(geo.events(), NEIGHBORHOOD_COLUMN, &selected)?;
    let properties = in_neighborhood
        .first()
        .and_then(|e| geo.boundary_of(e))
        .map(|b| b.properties.clone())
        .unwrap_or_default();
    let in_window = filter_time_window(&in_neighborhood, EventField::Time.as_ref(), from, to)?;

    let stations = station_usage(in_window.into_iter().map(|e| &e.event));
    let center = map_center(&stations);

    Ok(StationMap {
        neighborhood: neighborhood.to_string(),
        properties,
        stations,
        center,
    })
}

/// Average duration of trips from `start` to `end`.
#[must_use]
pub fn trip_duration(state: &DashboardState, start: &str, end: &str) -> DurationLookup {
    average_duration(state.trips(), start, end)
}

/// Values for the dashboard's selection controls.
#[must_use]
pub fn options(state: &DashboardState) -> DashboardOptions {
    let trips = state.trips();

    DashboardOptions {
        years: trips
            .iter()
            .map(|t| t.year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect(),
        neighborhoods: state
            .geo()
            .neighborhoods()
            .into_iter()
            .map(str::to_string)
            .collect(),
        coverage: state
            .geo()
            .matches_per_boundary()
            .into_iter()
            .map(|(name, events)| NeighborhoodCoverage {
                neighborhood: name.to_string(),
                events,
            })
            .collect(),
        stations: trips
            .iter()
            .map(|t| t.start_station_name.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect(),
        trip_dates: state.trip_dates(),
        event_dates: state.event_dates(),
    }
}

/// Reprojects the configured boundary file to the configured target CRS
/// and writes it to `output`.
///
/// # Errors
///
/// Returns [`DashboardError::Spatial`] if the boundary file cannot be read
/// or reprojected, or the output cannot be written.
pub fn reproject_boundaries(
    config: &DashboardConfig,
    output: &Path,
) -> Result<BoundarySet, DashboardError> {
    let boundaries = BoundarySet::load(
        &config.boundaries_path,
        &config.neighborhood_property,
        config.boundaries_crs,
    )?;
    let reprojected = boundaries.to_crs(config.target_crs)?;
    reprojected.write(output)?;
    Ok(reprojected)
}
