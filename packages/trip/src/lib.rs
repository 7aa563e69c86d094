#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Trip-history loading and reshaping.
//!
//! Reads the trip CSV once into memory, drops rows with missing or
//! unparseable fields, derives the year and month of each trip, and
//! reshapes trips into start/stop station-visit events.

pub mod load;
pub mod progress;
pub mod reshape;

use thiserror::Error;

pub use load::{load_trips, read_trips};
pub use reshape::{ReshapeSpec, reshape};

/// Errors that can occur while loading or reshaping trips.
#[derive(Debug, Error)]
pub enum TripError {
    /// Reading the trip file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The CSV reader failed (bad quoting, invalid UTF-8 header, etc.).
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is absent from the file header.
    #[error("Missing required column '{column}'")]
    MissingColumn {
        /// Header name that was expected.
        column: String,
    },

    /// A reshape mapping does not produce a complete event schema.
    #[error("Invalid column mapping: {message}")]
    Mapping {
        /// Description of what went wrong.
        message: String,
    },
}
