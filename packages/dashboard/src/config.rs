//! Dashboard configuration, read from a TOML file.
//!
//! Every field has a default, so an empty file (or no file at all) yields
//! a working configuration pointed at `data/`.

use std::path::{Path, PathBuf};

use bikeshare_analytics_models::{DEFAULT_TOP_K, FlowConfig};
use bikeshare_spatial::Crs;
use bikeshare_trip::ReshapeSpec;
use serde::{Deserialize, Serialize};

use crate::DashboardError;

/// Where the data lives and how the visualizations are built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Trip-history CSV.
    pub trips_path: PathBuf,
    /// Neighborhood boundary `GeoJSON` or `.shp` shapefile.
    pub boundaries_path: PathBuf,
    /// Projection of the boundary file, when it does not declare one.
    pub boundaries_crs: Option<Crs>,
    /// CRS the spatial join runs in.
    pub target_crs: Crs,
    /// Boundary feature property holding the neighborhood name.
    pub neighborhood_property: String,
    /// Trip columns making up the flow diagram's stages, in order.
    pub flow_columns: Vec<String>,
    /// How many stations the top-stations chart shows.
    pub top_stations: usize,
    /// Label of the top-stations count column.
    pub count_label: String,
    /// Flow diagram weighting and threshold.
    pub flow: FlowConfig,
    /// Start/stop column groups for the station-visit reshape.
    pub reshape: ReshapeSpec,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            trips_path: PathBuf::from("data/tripdata.csv"),
            boundaries_path: PathBuf::from("data/neighborhoods.geojson"),
            boundaries_crs: None,
            target_crs: Crs::WGS84,
            neighborhood_property: "BlockGr202".to_string(),
            flow_columns: vec!["usertype".to_string(), "month".to_string()],
            top_stations: DEFAULT_TOP_K,
            count_label: "number of trips".to_string(),
            flow: FlowConfig::default(),
            reshape: ReshapeSpec::default(),
        }
    }
}

impl DashboardConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Toml`] if the text is not valid TOML or a
    /// field has the wrong shape (including a CRS with no known projection).
    pub fn from_toml_str(s: &str) -> Result<Self, DashboardError> {
        Ok(toml::from_str(s)?)
    }

    /// Reads the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Io`] if the file cannot be read, or
    /// [`DashboardError::Toml`] if it cannot be parsed.
    pub fn load(path: &Path) -> Result<Self, DashboardError> {
        log::info!("Reading config from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bikeshare_trip_models::TripField;

    #[test]
    fn empty_file_gives_defaults() {
        let config = DashboardConfig::from_toml_str("").unwrap();
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.top_stations, 10);
        assert_eq!(config.flow_columns, ["usertype", "month"]);
    }

    #[test]
    fn overrides_nested_fields() {
        let config = DashboardConfig::from_toml_str(
            r#"
            trips_path = "/srv/bluebikes/202208.csv"
            target_crs = "EPSG:3857"
            flow_columns = ["usertype", "month", "year"]

            [flow]
            threshold = 25.0
            "#,
        )
        .unwrap();
        assert_eq!(
            config.trips_path,
            PathBuf::from("/srv/bluebikes/202208.csv")
        );
        assert_eq!(config.target_crs, Crs::WEB_MERCATOR);
        assert_eq!(config.flow_columns.len(), 3);
        assert!((config.flow.threshold - 25.0).abs() < f64::EPSILON);
        assert_eq!(config.flow.node_thickness, 50);
        assert_eq!(config.count_label, "number of trips");
    }

    #[test]
    fn rejects_unsupported_crs() {
        let err = DashboardConfig::from_toml_str(r#"target_crs = "EPSG:1""#).unwrap_err();
        assert!(matches!(err, DashboardError::Toml(_)));
    }

    #[test]
    fn accepts_projected_boundary_crs() {
        let config = DashboardConfig::from_toml_str(
            r#"
            boundaries_path = "data/Boston_Neighborhoods.shp"
            boundaries_crs = "EPSG:2249"
            "#,
        )
        .unwrap();
        assert_eq!(config.boundaries_crs.map(Crs::epsg), Some(2249));
        assert_eq!(config.target_crs, Crs::WGS84);
    }

    #[test]
    fn reshape_groups_are_configurable() {
        let config = DashboardConfig::from_toml_str(
            r#"
            [reshape]
            start = ["start station name", "starttime", "start station latitude", "start station longitude"]
            stop = ["end station name", "stoptime", "end station latitude", "end station longitude"]

            [reshape.mapping]
            "start station name" = "station name"
            "starttime" = "time"
            "start station latitude" = "station latitude"
            "start station longitude" = "station longitude"
            "end station name" = "station name"
            "stoptime" = "time"
            "end station latitude" = "station latitude"
            "end station longitude" = "station longitude"
            "#,
        )
        .unwrap();
        assert_eq!(config.reshape.start[0], TripField::StartStationName);
        assert_eq!(config.reshape.mapping.len(), 8);
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.toml");
        std::fs::write(&path, "top_stations = 5\n").unwrap();
        let config = DashboardConfig::load(&path).unwrap();
        assert_eq!(config.top_stations, 5);
    }
}
