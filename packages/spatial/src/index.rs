//! In-memory R-tree over neighborhood polygons.
//!
//! Candidate polygons are found by envelope intersection, then confirmed
//! with an exact containment test.

use geo::{Area as _, BoundingRect as _, Contains as _, MultiPolygon, Point};
use rstar::{AABB, RTree, RTreeObject};

use crate::boundary::BoundarySet;

/// A boundary polygon stored in the R-tree with its metadata.
struct BoundaryEntry {
    position: usize,
    area: f64,
    envelope: AABB<[f64; 2]>,
    polygon: MultiPolygon<f64>,
}

impl RTreeObject for BoundaryEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Point-in-polygon index over a [`BoundarySet`].
///
/// Coordinates passed to [`Self::lookup`] must be in the CRS of the set the
/// index was built from.
pub struct BoundaryIndex {
    tree: RTree<BoundaryEntry>,
}

impl BoundaryIndex {
    /// Builds the index.
    #[must_use]
    pub fn build(boundaries: &BoundarySet) -> Self {
        let entries: Vec<BoundaryEntry> = boundaries
            .boundaries()
            .iter()
            .enumerate()
            .filter_map(|(position, b)| {
                let Some(envelope) = compute_envelope(&b.polygon) else {
                    log::warn!("Boundary '{}' has an empty polygon; skipping", b.name);
                    return None;
                };
                Some(BoundaryEntry {
                    position,
                    area: b.polygon.unsigned_area(),
                    envelope,
                    polygon: b.polygon.clone(),
                })
            })
            .collect();

        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Number of indexed polygons.
    #[must_use]
    pub fn size(&self) -> usize {
        self.tree.size()
    }

    /// Position of the boundary strictly containing `(x, y)`.
    ///
    /// Points on a polygon edge are not contained. When polygons overlap
    /// the smallest area wins, and equal areas fall back to file order.
    #[must_use]
    pub fn lookup(&self, x: f64, y: f64) -> Option<usize> {
        let point = Point::new(x, y);
        let query_env = AABB::from_point([x, y]);

        let mut best: Option<&BoundaryEntry> = None;

        for entry in self.tree.locate_in_envelope_intersecting(&query_env) {
            if !entry.polygon.contains(&point) {
                continue;
            }
            best = match best {
                Some(current)
                    if (current.area, current.position) <= (entry.area, entry.position) =>
                {
                    Some(current)
                }
                _ => Some(entry),
            };
        }

        best.map(|e| e.position)
    }
}

/// Compute the bounding box envelope for a [`MultiPolygon`].
fn compute_envelope(mp: &MultiPolygon<f64>) -> Option<AABB<[f64; 2]>> {
    mp.bounding_rect()
        .map(|rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]))
}
