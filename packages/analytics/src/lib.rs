#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregations behind the dashboard visualizations.
//!
//! Every function here is a pure transformation over in-memory rows. Rows
//! are addressed by column name through
//! [`bikeshare_trip_models::Columnar`], so the same code serves trips,
//! station events, and neighborhood-joined events.

pub mod codes;
pub mod duration;
pub mod filters;
pub mod flow;
pub mod ranked;
pub mod usage;

use thiserror::Error;

pub use codes::{LabelCodes, code_edges};
pub use duration::average_duration;
pub use filters::{filter_in_set, filter_time_window};
pub use flow::{make_flow, stack_columns};
pub use ranked::top_counts;
pub use usage::{map_center, station_usage};

/// Errors that can occur during aggregation.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// A flow diagram needs at least two columns.
    #[error("A flow diagram needs at least 2 columns, got {given}")]
    Arity {
        /// Number of columns supplied.
        given: usize,
    },

    /// A row is missing a column or holds the wrong kind of value.
    #[error("Data error: {message}")]
    Data {
        /// Description of what went wrong.
        message: String,
    },
}
