//! The immutable in-memory tables every query runs against.

use std::sync::Arc;

use bikeshare_spatial::{BoundarySet, GeoJoin, join_neighborhoods};
use bikeshare_trip::progress::ProgressCallback;
use bikeshare_trip::{load_trips, reshape};
use bikeshare_trip_models::TripRecord;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::DashboardError;
use crate::config::DashboardConfig;

/// Earliest and latest timestamp in a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateBounds {
    /// Earliest timestamp.
    pub min: NaiveDateTime,
    /// Latest timestamp.
    pub max: NaiveDateTime,
}

impl DateBounds {
    /// Bounds of `times`, or `None` when there are none.
    pub fn of(times: impl IntoIterator<Item = NaiveDateTime>) -> Option<Self> {
        times.into_iter().fold(None, |bounds, t| match bounds {
            None => Some(Self { min: t, max: t }),
            Some(Self { min, max }) => Some(Self {
                min: min.min(t),
                max: max.max(t),
            }),
        })
    }
}

/// Trips and neighborhood-joined station events, loaded once.
#[derive(Debug, Clone)]
pub struct DashboardState {
    config: DashboardConfig,
    trips: Vec<TripRecord>,
    geo: GeoJoin,
    trip_dates: Option<DateBounds>,
    event_dates: Option<DateBounds>,
}

impl DashboardState {
    /// Loads the trip and boundary files named by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError`] if either file cannot be read or parsed,
    /// or if the configured reshape mapping is invalid.
    pub fn load(
        config: DashboardConfig,
        progress: &Arc<dyn ProgressCallback>,
    ) -> Result<Self, DashboardError> {
        let trips = load_trips(&config.trips_path, progress)?;
        let boundaries = BoundarySet::load(
            &config.boundaries_path,
            &config.neighborhood_property,
            config.boundaries_crs,
        )?;
        Self::from_parts(config, trips, &boundaries)
    }

    /// Builds the state from already-loaded trips and boundaries.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Trip`] if the configured reshape mapping
    /// is invalid, or [`DashboardError::Spatial`] if the boundaries cannot
    /// be reprojected into the target CRS.
    pub fn from_parts(
        config: DashboardConfig,
        trips: Vec<TripRecord>,
        boundaries: &BoundarySet,
    ) -> Result<Self, DashboardError> {
        let events = reshape(&trips, &config.reshape)?;
        let geo = join_neighborhoods(&events, boundaries, config.target_crs)?;
        let trip_dates = DateBounds::of(trips.iter().map(|t| t.start_time));
        let event_dates = DateBounds::of(geo.events().iter().map(|e| e.event.time));

        log::info!(
            "Dashboard ready: {} trips, {} station events in {} neighborhoods",
            trips.len(),
            geo.events().len(),
            geo.neighborhoods().len()
        );

        Ok(Self {
            config,
            trips,
            geo,
            trip_dates,
            event_dates,
        })
    }

    /// The configuration the state was loaded with.
    #[must_use]
    pub const fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Every cleaned trip.
    #[must_use]
    pub fn trips(&self) -> &[TripRecord] {
        &self.trips
    }

    /// Station events joined to their neighborhoods.
    #[must_use]
    pub const fn geo(&self) -> &GeoJoin {
        &self.geo
    }

    /// Start-time range of the trips.
    #[must_use]
    pub const fn trip_dates(&self) -> Option<DateBounds> {
        self.trip_dates
    }

    /// Time range of the neighborhood-joined station events.
    #[must_use]
    pub const fn event_dates(&self) -> Option<DateBounds> {
        self.event_dates
    }
}
