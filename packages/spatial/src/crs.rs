//! Coordinate reference systems and reprojection.
//!
//! A [`Crs`] is an EPSG code with a known PROJ.4 definition. Reprojection
//! runs through `proj4rs`, so boundary files published in any projected
//! system (state plane, UTM, Web Mercator) can be brought to WGS84
//! longitude/latitude or any other supported target.

use std::fmt;
use std::str::FromStr;

use geo::{Coord, MapCoords as _, MultiPolygon};
use proj4rs::proj::Proj;
use serde::{Deserialize, Serialize};

use crate::SpatialError;

/// A coordinate reference system identified by its EPSG code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Crs {
    epsg: u16,
}

impl Crs {
    /// WGS84 geographic coordinates, x = longitude, y = latitude (degrees).
    pub const WGS84: Self = Self { epsg: 4326 };

    /// Spherical Web Mercator, x/y in meters.
    pub const WEB_MERCATOR: Self = Self { epsg: 3857 };

    /// Looks up an EPSG code.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::UnsupportedCrs`] if no projection definition
    /// is known for `epsg`.
    pub fn from_epsg(epsg: u16) -> Result<Self, SpatialError> {
        if crs_definitions::from_code(epsg).is_none() {
            return Err(SpatialError::UnsupportedCrs {
                crs: format!("EPSG:{epsg}"),
            });
        }
        Ok(Self { epsg })
    }

    /// The numeric EPSG code.
    #[must_use]
    pub const fn epsg(self) -> u16 {
        self.epsg
    }

    /// Canonical `EPSG:` identifier.
    #[must_use]
    pub fn code(self) -> String {
        format!("EPSG:{}", self.epsg)
    }

    fn proj4(self) -> Result<&'static str, SpatialError> {
        crs_definitions::from_code(self.epsg)
            .map(|def| def.proj4)
            .ok_or_else(|| SpatialError::UnsupportedCrs { crs: self.code() })
    }

    /// Whether coordinates are longitude/latitude degrees rather than
    /// projected units.
    #[must_use]
    pub fn is_geographic(self) -> bool {
        self.proj4()
            .is_ok_and(|def| def.contains("+proj=longlat") || def.contains("+proj=latlong"))
    }

    /// Builds a reusable transformer from this system into `target`.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::Projection`] if either definition is
    /// rejected by the projection engine.
    pub fn transformer_to(self, target: Self) -> Result<Transformer, SpatialError> {
        if self == target {
            return Ok(Transformer {
                source: self,
                target,
                projs: None,
            });
        }

        let from = Proj::from_proj_string(self.proj4()?).map_err(|e| projection(self, &e))?;
        let to = Proj::from_proj_string(target.proj4()?).map_err(|e| projection(target, &e))?;

        Ok(Transformer {
            source: self,
            target,
            projs: Some((from, to)),
        })
    }

    /// Converts a single coordinate from this system into `target`.
    ///
    /// # Errors
    ///
    /// See [`Self::transformer_to`] and [`Transformer::transform`].
    pub fn transform(self, target: Self, c: Coord<f64>) -> Result<Coord<f64>, SpatialError> {
        self.transformer_to(target)?.transform(c)
    }

    /// Reprojects every vertex of a polygon set into `target`.
    ///
    /// # Errors
    ///
    /// See [`Self::transformer_to`] and [`Transformer::transform`].
    pub fn reproject(
        self,
        target: Self,
        polygon: &MultiPolygon<f64>,
    ) -> Result<MultiPolygon<f64>, SpatialError> {
        self.transformer_to(target)?.reproject(polygon)
    }
}

impl Default for Crs {
    fn default() -> Self {
        Self::WGS84
    }
}

fn projection(crs: Crs, err: &impl fmt::Display) -> SpatialError {
    SpatialError::Projection {
        message: format!("{crs}: {err}"),
    }
}

/// Converts coordinates between two fixed systems.
///
/// Geographic coordinates go in and come out as degrees.
pub struct Transformer {
    source: Crs,
    target: Crs,
    projs: Option<(Proj, Proj)>,
}

impl Transformer {
    /// Source system.
    #[must_use]
    pub const fn source(&self) -> Crs {
        self.source
    }

    /// Target system.
    #[must_use]
    pub const fn target(&self) -> Crs {
        self.target
    }

    /// Converts one coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::Projection`] if the coordinate cannot be
    /// represented in the target system.
    pub fn transform(&self, c: Coord<f64>) -> Result<Coord<f64>, SpatialError> {
        let Some((from, to)) = &self.projs else {
            return Ok(c);
        };

        let mut point = if self.source.is_geographic() {
            (c.x.to_radians(), c.y.to_radians(), 0.0)
        } else {
            (c.x, c.y, 0.0)
        };

        proj4rs::transform::transform(from, to, &mut point)
            .map_err(|e| projection(self.target, &e))?;

        let (x, y, _) = point;
        if !x.is_finite() || !y.is_finite() {
            return Err(SpatialError::Projection {
                message: format!(
                    "({}, {}) has no finite position in {}",
                    c.x, c.y, self.target
                ),
            });
        }

        Ok(if self.target.is_geographic() {
            Coord {
                x: x.to_degrees(),
                y: y.to_degrees(),
            }
        } else {
            Coord { x, y }
        })
    }

    /// Converts every vertex of a polygon set.
    ///
    /// # Errors
    ///
    /// Fails on the first vertex [`Self::transform`] rejects.
    pub fn reproject(
        &self,
        polygon: &MultiPolygon<f64>,
    ) -> Result<MultiPolygon<f64>, SpatialError> {
        if self.projs.is_none() {
            return Ok(polygon.clone());
        }
        polygon.try_map_coords(|c| self.transform(c))
    }
}

impl fmt::Debug for Transformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transformer")
            .field("source", &self.source)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg)
    }
}

/// Extracts the EPSG code from the common spellings of a CRS identifier.
fn epsg_code(s: &str) -> Option<u16> {
    let upper = s.trim().to_ascii_uppercase();
    match upper.as_str() {
        "WGS84"
        | "CRS84"
        | "OGC:CRS84"
        | "URN:OGC:DEF:CRS:OGC:1.3:CRS84"
        | "URN:OGC:DEF:CRS:OGC::CRS84" => return Some(4326),
        "EPSG:900913" | "EPSG:102100" | "EPSG:102113" => return Some(3857),
        _ => {}
    }

    let rest = upper
        .strip_prefix("EPSG:")
        .or_else(|| upper.strip_prefix("URN:OGC:DEF:CRS:EPSG:"))?;
    rest.rsplit(':').next()?.parse().ok()
}

impl FromStr for Crs {
    type Err = SpatialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        epsg_code(s)
            .and_then(|epsg| Self::from_epsg(epsg).ok())
            .ok_or_else(|| SpatialError::UnsupportedCrs { crs: s.to_string() })
    }
}

impl TryFrom<String> for Crs {
    type Error = SpatialError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Crs> for String {
    fn from(crs: Crs) -> Self {
        crs.code()
    }
}
