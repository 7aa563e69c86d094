#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Neighborhood boundaries and spatial attribution of station events.
//!
//! Loads neighborhood polygons from a `GeoJSON` file or an ESRI shapefile,
//! reprojects them to a target coordinate reference system, builds an
//! R-tree over their envelopes, and assigns every station event to the
//! polygon containing it. Events outside every polygon are dropped.

pub mod boundary;
pub mod crs;
pub mod index;
pub mod join;

use thiserror::Error;

pub use boundary::{BoundarySet, NeighborhoodBoundary};
pub use crs::{Crs, Transformer};
pub use index::BoundaryIndex;
pub use join::{GeoJoin, NeighborhoodEvent, join_neighborhoods};

/// Errors that can occur while loading boundaries or joining against them.
#[derive(Debug, Error)]
pub enum SpatialError {
    /// Reading or writing a boundary file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The boundary file is not valid `GeoJSON`.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// The shapefile or its attribute table could not be read.
    #[error("Shapefile error: {0}")]
    Shapefile(#[from] shapefile::Error),

    /// The boundary file parsed but has an unusable structure.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of what went wrong.
        message: String,
    },

    /// The boundary file contains no usable polygons.
    #[error("No neighborhood polygons found in {source_name}")]
    NoPolygons {
        /// Where the boundaries came from.
        source_name: String,
    },

    /// A coordinate could not be reprojected.
    #[error("Projection error: {message}")]
    Projection {
        /// Description of what went wrong.
        message: String,
    },

    /// No projection definition is known for the coordinate reference system.
    #[error("Unsupported coordinate reference system '{crs}'")]
    UnsupportedCrs {
        /// Identifier as given.
        crs: String,
    },
}
