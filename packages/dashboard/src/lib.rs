#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! The bike-share dashboard core.
//!
//! Loads the trip history and neighborhood boundaries once into an
//! immutable [`DashboardState`], then answers the four visualization
//! queries (flow diagram, top start stations, neighborhood station map,
//! and trip duration) as pure functions over that state.

pub mod config;
pub mod queries;
pub mod state;

#[cfg(test)]
mod fixtures;

use thiserror::Error;

pub use config::DashboardConfig;
pub use queries::{
    DashboardOptions, NeighborhoodCoverage, flow_for_years, options, parse_date_bound,
    reproject_boundaries, resolve_window, resolve_years, station_map, top_start_stations,
    trip_duration,
};
pub use state::{DashboardState, DateBounds};

/// Errors that can occur while loading or querying the dashboard.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// Loading or reshaping trips failed.
    #[error("Trip error: {0}")]
    Trip(#[from] bikeshare_trip::TripError),

    /// Loading, reprojecting, or writing boundaries failed.
    #[error("Spatial error: {0}")]
    Spatial(#[from] bikeshare_spatial::SpatialError),

    /// An aggregation rejected its input.
    #[error("Analytics error: {0}")]
    Analytics(#[from] bikeshare_analytics::AnalyticsError),

    /// Reading the configuration file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid TOML for [`DashboardConfig`].
    #[error("Config error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A date bound could not be parsed.
    #[error("Invalid date '{value}'")]
    InvalidDate {
        /// The value as given.
        value: String,
    },
}
