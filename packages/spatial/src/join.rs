//! Spatial containment join of station events against neighborhoods.

use std::collections::{BTreeMap, BTreeSet};

use bikeshare_trip_models::{CellValue, Columnar, StationEvent};
use geo::Coord;

use crate::SpatialError;
use crate::boundary::{BoundarySet, NeighborhoodBoundary};
use crate::crs::Crs;
use crate::index::BoundaryIndex;

/// Column name under which the containing neighborhood is exposed.
pub const NEIGHBORHOOD_COLUMN: &str = "neighborhood";

/// A station event annotated with the neighborhood containing it.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborhoodEvent {
    /// The underlying station visit.
    pub event: StationEvent,
    /// Name of the containing neighborhood.
    pub neighborhood: String,
    /// Position of the containing boundary in the joined [`BoundarySet`].
    pub boundary: usize,
}

impl Columnar for NeighborhoodEvent {
    fn cell(&self, column: &str) -> Option<CellValue<'_>> {
        if column == NEIGHBORHOOD_COLUMN {
            Some(CellValue::Text(&self.neighborhood))
        } else {
            self.event.cell(column)
        }
    }
}

/// Result of joining station events to neighborhoods.
///
/// Holds the boundaries in the join's target CRS so that each event's
/// neighborhood attributes can be looked up by position.
#[derive(Debug, Clone)]
pub struct GeoJoin {
    boundaries: BoundarySet,
    events: Vec<NeighborhoodEvent>,
}

impl GeoJoin {
    /// Boundaries, reprojected to the join's target CRS.
    #[must_use]
    pub const fn boundaries(&self) -> &BoundarySet {
        &self.boundaries
    }

    /// Every matched event.
    #[must_use]
    pub fn events(&self) -> &[NeighborhoodEvent] {
        &self.events
    }

    /// The boundary an event was matched to.
    #[must_use]
    pub fn boundary_of(&self, event: &NeighborhoodEvent) -> Option<&NeighborhoodBoundary> {
        self.boundaries.get(event.boundary)
    }

    /// Distinct names of neighborhoods with at least one matched event,
    /// sorted.
    #[must_use]
    pub fn neighborhoods(&self) -> Vec<&str> {
        self.events
            .iter()
            .map(|e| e.neighborhood.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Matched event count for every boundary, including those with none,
    /// in file order.
    #[must_use]
    pub fn matches_per_boundary(&self) -> Vec<(&str, usize)> {
        let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
        for event in &self.events {
            *counts.entry(event.boundary).or_default() += 1;
        }
        self.boundaries
            .boundaries()
            .iter()
            .enumerate()
            .map(|(i, b)| (b.name.as_str(), counts.get(&i).copied().unwrap_or(0)))
            .collect()
    }
}

/// Assigns each event to the neighborhood polygon strictly containing it.
///
/// The boundaries are reprojected into `target`. Event coordinates are
/// WGS84 longitude/latitude and are converted into `target` before the
/// containment test. Events with an empty station name, a coordinate that
/// cannot be placed in `target`, or no containing polygon are dropped.
///
/// # Errors
///
/// Returns [`SpatialError::Projection`] if the boundaries cannot be
/// reprojected into `target`.
pub fn join_neighborhoods(
    events: &[StationEvent],
    boundaries: &BoundarySet,
    target: Crs,
) -> Result<GeoJoin, SpatialError> {
    let boundaries = boundaries.to_crs(target)?;
    let index = BoundaryIndex::build(&boundaries);
    let to_target = Crs::WGS84.transformer_to(target)?;

    let mut incomplete = 0usize;
    let mut unmatched = 0usize;

    let joined: Vec<NeighborhoodEvent> = events
        .iter()
        .filter_map(|event| {
            if event.station_name.is_empty()
                || !event.station_longitude.is_finite()
                || !event.station_latitude.is_finite()
            {
                incomplete += 1;
                return None;
            }

            let Ok(point) = to_target.transform(Coord {
                x: event.station_longitude,
                y: event.station_latitude,
            }) else {
                incomplete += 1;
                return None;
            };

            let Some(position) = index.lookup(point.x, point.y) else {
                unmatched += 1;
                return None;
            };

            let neighborhood = boundaries.get(position)?.name.clone();

            Some(NeighborhoodEvent {
                event: event.clone(),
                neighborhood,
                boundary: position,
            })
        })
        .collect();

    log::info!(
        "Joined {} of {} station events to {} neighborhoods ({unmatched} outside every \
         polygon, {incomplete} incomplete)",
        joined.len(),
        events.len(),
        index.size()
    );

    Ok(GeoJoin {
        boundaries,
        events: joined,
    })
}
