//! Neighborhood boundary loading, reprojection, and writing.
//!
//! Boundaries come from a `GeoJSON` `FeatureCollection` or an ESRI
//! shapefile. A `GeoJSON` file's projection is read from the legacy
//! top-level `crs` member
//! (`{"type": "name", "properties": {"name": "EPSG:3857"}}`); files without
//! one are WGS84 per RFC 7946. A shapefile's projection comes from the
//! `.prj` file next to it.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use geo::MultiPolygon;
use geojson::{Feature, FeatureCollection, GeoJson, JsonObject};
use shapefile::dbase::{FieldValue, Record};

use crate::SpatialError;
use crate::crs::Crs;

/// A named neighborhood polygon and its string properties.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborhoodBoundary {
    /// Neighborhood name, taken from the configured name property.
    pub name: String,
    /// Every non-null feature property, stringified.
    pub properties: BTreeMap<String, String>,
    /// Polygon geometry in the owning [`BoundarySet`]'s CRS.
    pub polygon: MultiPolygon<f64>,
}

/// A non-empty set of boundaries sharing one CRS.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundarySet {
    crs: Crs,
    boundaries: Vec<NeighborhoodBoundary>,
}

impl BoundarySet {
    /// Wraps already-built boundaries.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::NoPolygons`] if `boundaries` is empty.
    pub fn new(crs: Crs, boundaries: Vec<NeighborhoodBoundary>) -> Result<Self, SpatialError> {
        if boundaries.is_empty() {
            return Err(SpatialError::NoPolygons {
                source_name: "boundary set".to_string(),
            });
        }
        Ok(Self { crs, boundaries })
    }

    /// Parses boundaries from `GeoJSON` text.
    ///
    /// Features without a polygon geometry or without a value for
    /// `name_property` are skipped with a warning.
    ///
    /// # Errors
    ///
    /// * [`SpatialError::GeoJson`] if the text is not `GeoJSON`
    /// * [`SpatialError::Parse`] if it is a bare geometry with no properties
    /// * [`SpatialError::UnsupportedCrs`] if the declared CRS is unknown
    /// * [`SpatialError::NoPolygons`] if no feature yields a boundary
    pub fn from_geojson_str(geojson_str: &str, name_property: &str) -> Result<Self, SpatialError> {
        let geojson: GeoJson = geojson_str.parse()?;

        let (features, foreign_members) = match geojson {
            GeoJson::FeatureCollection(fc) => (fc.features, fc.foreign_members),
            GeoJson::Feature(feature) => (vec![feature], None),
            GeoJson::Geometry(_) => {
                return Err(SpatialError::Parse {
                    message: "expected a Feature or FeatureCollection, found a bare geometry"
                        .to_string(),
                });
            }
        };

        let crs = declared_crs(foreign_members.as_ref())?;

        let boundaries: Vec<NeighborhoodBoundary> = features
            .into_iter()
            .enumerate()
            .filter_map(|(i, feature)| parse_feature(i, feature, name_property))
            .collect();

        if boundaries.is_empty() {
            return Err(SpatialError::NoPolygons {
                source_name: "GeoJSON input".to_string(),
            });
        }

        log::debug!(
            "Parsed {} neighborhood boundaries ({crs})",
            boundaries.len()
        );

        Ok(Self { crs, boundaries })
    }

    /// Parses boundaries from a shapefile and its attribute table.
    ///
    /// Records without a polygon shape or without a value for
    /// `name_property` are skipped with a warning.
    ///
    /// # Errors
    ///
    /// * [`SpatialError::Shapefile`] if the `.shp` or `.dbf` cannot be read
    /// * [`SpatialError::NoPolygons`] if no record yields a boundary
    pub fn from_shapefile(
        path: &Path,
        crs: Crs,
        name_property: &str,
    ) -> Result<Self, SpatialError> {
        let mut reader = shapefile::Reader::from_path(path)?;

        let mut boundaries = Vec::new();
        for (position, item) in reader.iter_shapes_and_records().enumerate() {
            let (shape, record) = item?;
            let geometry = geo::Geometry::<f64>::try_from(shape).ok();
            if let Some(boundary) =
                build_boundary(position, record_properties(record), geometry, name_property)
            {
                boundaries.push(boundary);
            }
        }

        if boundaries.is_empty() {
            return Err(SpatialError::NoPolygons {
                source_name: path.display().to_string(),
            });
        }

        Ok(Self { crs, boundaries })
    }

    /// Loads boundaries from a `.shp` shapefile or a `GeoJSON` file.
    ///
    /// `declared` overrides the projection the file states, for files whose
    /// `.prj` carries no EPSG code.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::Io`] if the file cannot be read, plus every
    /// error [`Self::from_geojson_str`] or [`Self::from_shapefile`] can
    /// return. An empty result is reported against the file path.
    pub fn load(
        path: &Path,
        name_property: &str,
        declared: Option<Crs>,
    ) -> Result<Self, SpatialError> {
        log::info!("Loading neighborhood boundaries from {}", path.display());

        let is_shapefile = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("shp"));

        let set = if is_shapefile {
            let crs = match declared {
                Some(crs) => crs,
                None => prj_crs(path)?,
            };
            Self::from_shapefile(path, crs, name_property)?
        } else {
            let text = std::fs::read_to_string(path)?;
            let mut set = Self::from_geojson_str(&text, name_property).map_err(|e| match e {
                SpatialError::NoPolygons { .. } => SpatialError::NoPolygons {
                    source_name: path.display().to_string(),
                },
                other => other,
            })?;
            if let Some(crs) = declared {
                set.crs = crs;
            }
            set
        };

        log::info!(
            "Loaded {} neighborhood boundaries ({})",
            set.boundaries.len(),
            set.crs
        );
        Ok(set)
    }

    /// The CRS every boundary's coordinates are expressed in.
    #[must_use]
    pub const fn crs(&self) -> Crs {
        self.crs
    }

    /// All boundaries, in file order.
    #[must_use]
    pub fn boundaries(&self) -> &[NeighborhoodBoundary] {
        &self.boundaries
    }

    /// Boundary at `position` in file order.
    #[must_use]
    pub fn get(&self, position: usize) -> Option<&NeighborhoodBoundary> {
        self.boundaries.get(position)
    }

    /// Number of boundaries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.boundaries.len()
    }

    /// Always `false`; a set holds at least one boundary.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boundaries.is_empty()
    }

    /// Returns a copy with every polygon reprojected into `target`.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::Projection`] if a vertex cannot be
    /// represented in `target`.
    pub fn to_crs(&self, target: Crs) -> Result<Self, SpatialError> {
        if target == self.crs {
            return Ok(self.clone());
        }

        log::debug!(
            "Reprojecting {} boundaries from {} to {target}",
            self.boundaries.len(),
            self.crs
        );

        let transformer = self.crs.transformer_to(target)?;
        let boundaries = self
            .boundaries
            .iter()
            .map(|b| {
                transformer
                    .reproject(&b.polygon)
                    .map(|polygon| NeighborhoodBoundary {
                        name: b.name.clone(),
                        properties: b.properties.clone(),
                        polygon,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            crs: target,
            boundaries,
        })
    }

    /// Serializes the set as a `GeoJSON` `FeatureCollection` with a `crs`
    /// member, readable again by [`Self::from_geojson_str`].
    #[must_use]
    pub fn to_geojson_string(&self) -> String {
        let features = self
            .boundaries
            .iter()
            .map(|b| {
                let properties: JsonObject = b
                    .properties
                    .iter()
                    .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                    .collect();
                Feature {
                    bbox: None,
                    geometry: Some(geojson::Geometry::new(geojson::Value::from(&b.polygon))),
                    id: None,
                    properties: Some(properties),
                    foreign_members: None,
                }
            })
            .collect();

        let mut foreign = JsonObject::new();
        foreign.insert(
            "crs".to_string(),
            serde_json::json!({
                "type": "name",
                "properties": { "name": self.crs.code() },
            }),
        );

        GeoJson::from(FeatureCollection {
            bbox: None,
            features,
            foreign_members: Some(foreign),
        })
        .to_string()
    }

    /// Writes the set to `path` as `GeoJSON`.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::Io`] if the file cannot be written.
    pub fn write(&self, path: &Path) -> Result<(), SpatialError> {
        std::fs::write(path, self.to_geojson_string())?;
        log::info!(
            "Wrote {} boundaries ({}) to {}",
            self.boundaries.len(),
            self.crs,
            path.display()
        );
        Ok(())
    }
}

/// Reads the legacy `crs` member, defaulting to WGS84 when absent.
fn declared_crs(foreign_members: Option<&JsonObject>) -> Result<Crs, SpatialError> {
    let Some(crs) = foreign_members.and_then(|m| m.get("crs")) else {
        return Ok(Crs::WGS84);
    };

    let name = crs
        .get("properties")
        .and_then(|p| p.get("name"))
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| SpatialError::Parse {
            message: format!("unrecognized crs member: {crs}"),
        })?;

    name.parse()
}

/// Reads the EPSG code of a shapefile's `.prj` sidecar.
fn prj_crs(path: &Path) -> Result<Crs, SpatialError> {
    let prj = path.with_extension("prj");
    let wkt = std::fs::read_to_string(&prj)?;
    crs_from_wkt(&wkt).ok_or_else(|| SpatialError::Parse {
        message: format!(
            "{}: projection has no EPSG code; declare the boundary CRS explicitly",
            prj.display()
        ),
    })
}

/// Identifies the CRS described by a WKT projection string.
///
/// Uses the top-level `AUTHORITY`/`ID` when present, otherwise the ESRI
/// name of a few common systems.
fn crs_from_wkt(wkt: &str) -> Option<Crs> {
    for marker in ["AUTHORITY[\"EPSG\",", "ID[\"EPSG\","] {
        let top_level = wkt.match_indices(marker).find(|(at, _)| {
            let before = &wkt[..*at];
            before.matches('[').count().checked_sub(before.matches(']').count()) == Some(1)
        });
        if let Some((at, _)) = top_level {
            let code: String = wkt[at + marker.len()..]
                .trim_start_matches(['"', ' '])
                .chars()
                .take_while(char::is_ascii_digit)
                .collect();
            if let Some(crs) = code.parse().ok().and_then(|c| Crs::from_epsg(c).ok()) {
                return Some(crs);
            }
        }
    }

    let name = wkt.split('"').nth(1)?;
    let epsg = match name {
        "GCS_WGS_1984" | "WGS 84" => 4326,
        "WGS_1984_Web_Mercator_Auxiliary_Sphere" | "WGS 84 / Pseudo-Mercator" => 3857,
        "NAD_1983_StatePlane_Massachusetts_Mainland_FIPS_2001_Feet" => 2249,
        "NAD_1983_StatePlane_Massachusetts_Mainland_FIPS_2001" => 26986,
        _ => return None,
    };
    Crs::from_epsg(epsg).ok()
}

/// Stringifies a shapefile attribute record, dropping null fields.
fn record_properties(record: Record) -> BTreeMap<String, String> {
    HashMap::<String, FieldValue>::from(record)
        .into_iter()
        .filter_map(|(k, v)| {
            let value = match v {
                FieldValue::Character(Some(s)) => s.trim().to_string(),
                FieldValue::Numeric(Some(n)) => n.to_string(),
                FieldValue::Float(Some(f)) => f.to_string(),
                FieldValue::Double(d) => d.to_string(),
                FieldValue::Integer(i) => i.to_string(),
                FieldValue::Logical(Some(b)) => b.to_string(),
                _ => return None,
            };
            Some((k, value))
        })
        .collect()
}

/// Stringifies `GeoJSON` feature properties, dropping nulls.
fn json_properties(properties: Option<JsonObject>) -> BTreeMap<String, String> {
    properties
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(k, v)| match v {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some((k, s)),
            other => Some((k, other.to_string())),
        })
        .collect()
}

/// Converts one feature into a boundary, or `None` if it is unusable.
fn parse_feature(
    position: usize,
    feature: Feature,
    name_property: &str,
) -> Option<NeighborhoodBoundary> {
    let geometry = feature.geometry.and_then(|g| g.try_into().ok());
    build_boundary(
        position,
        json_properties(feature.properties),
        geometry,
        name_property,
    )
}

fn build_boundary(
    position: usize,
    properties: BTreeMap<String, String>,
    geometry: Option<geo::Geometry<f64>>,
    name_property: &str,
) -> Option<NeighborhoodBoundary> {
    let Some(name) = properties
        .get(name_property)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
    else {
        log::warn!("Skipping boundary feature {position}: no '{name_property}' property");
        return None;
    };

    let Some(polygon) = geometry.and_then(to_multipolygon) else {
        log::warn!("Skipping boundary '{name}': missing or non-polygon geometry");
        return None;
    };

    Some(NeighborhoodBoundary {
        name,
        properties,
        polygon,
    })
}

/// Keeps `Polygon` and non-empty `MultiPolygon` geometries.
fn to_multipolygon(geometry: geo::Geometry<f64>) -> Option<MultiPolygon<f64>> {
    match geometry {
        geo::Geometry::MultiPolygon(mp) if !mp.0.is_empty() => Some(mp),
        geo::Geometry::Polygon(p) => Some(MultiPolygon(vec![p])),
        _ => None,
    }
}
