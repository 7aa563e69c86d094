#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Result and configuration types for the dashboard aggregations.
//!
//! Each visualization consumes one of these shapes: [`FlowDiagram`] for
//! the flow chart, [`RankedCounts`] for the bar chart, [`StationMap`] for
//! the scatter map, and [`DurationLookup`] for the trip-duration readout.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Default thickness of flow-diagram nodes.
pub const DEFAULT_NODE_THICKNESS: u32 = 50;

/// Default number of rows kept by a ranked count.
pub const DEFAULT_TOP_K: usize = 10;

/// Options for building a flow diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FlowConfig {
    /// Column holding each record's weight. `None` weights every record 1.
    pub value_column: Option<String>,
    /// Edges whose summed weight is below this are dropped.
    pub threshold: f64,
    /// Node thickness handed to the renderer.
    pub node_thickness: u32,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            value_column: None,
            threshold: 0.0,
            node_thickness: DEFAULT_NODE_THICKNESS,
        }
    }
}

/// An aggregated flow between two labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowEdge {
    /// Upstream label.
    pub source: String,
    /// Downstream label.
    pub target: String,
    /// Summed weight.
    pub value: f64,
}

/// A flow edge with both ends replaced by label codes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodedEdge {
    /// Code of the upstream label.
    pub source: usize,
    /// Code of the downstream label.
    pub target: usize,
    /// Summed weight.
    pub value: f64,
}

/// Renderer-ready flow diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowDiagram {
    /// Node labels; a label's position is its code.
    pub labels: Vec<String>,
    /// Coded links.
    pub links: Vec<CodedEdge>,
    /// Node thickness for the renderer.
    pub node_thickness: u32,
}

impl FlowDiagram {
    /// Sum of every link's value.
    #[must_use]
    pub fn total_value(&self) -> f64 {
        self.links.iter().map(|l| l.value).sum()
    }
}

/// Occurrence count of one value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedCount {
    /// The counted value.
    pub value: String,
    /// Number of occurrences.
    pub count: u64,
}

/// Top values of a column by occurrence count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedCounts {
    /// Name of the counted column.
    pub column: String,
    /// Caller-supplied label for the count column.
    pub count_label: String,
    /// Rows, highest count first.
    pub rows: Vec<RankedCount>,
}

/// Visit count of one station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationUsage {
    /// Station name.
    pub station_name: String,
    /// Station latitude.
    pub latitude: f64,
    /// Station longitude.
    pub longitude: f64,
    /// Number of visits in the filtered window.
    pub usage_count: u64,
}

/// Mean position of the plotted stations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapCenter {
    /// Mean latitude.
    pub latitude: f64,
    /// Mean longitude.
    pub longitude: f64,
}

/// Station usage within one neighborhood.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationMap {
    /// The selected neighborhood.
    pub neighborhood: String,
    /// Attributes of the neighborhood's boundary feature; empty when no
    /// station falls inside it.
    pub properties: BTreeMap<String, String>,
    /// Per-station usage counts.
    pub stations: Vec<StationUsage>,
    /// Where to center the map; `None` when there are no stations.
    pub center: Option<MapCenter>,
}

/// Result of an average trip-duration lookup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DurationLookup {
    /// Start and end station are the same; nothing was queried.
    SameStation,
    /// No trip goes from the start station to the end station.
    NoTrips,
    /// Mean duration of the matching trips.
    #[serde(rename_all = "camelCase")]
    Average {
        /// Mean duration in seconds.
        seconds: f64,
        /// Number of trips averaged.
        trips: u64,
    },
}

impl fmt::Display for DurationLookup {
    #[allow(clippy::cast_possible_truncation)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SameStation => f.write_str("Start and End station cannot be the same"),
            Self::NoTrips => f.write_str("Sorry no trips of that type!"),
            Self::Average { seconds, .. } => {
                let hours = (seconds / 3600.0).floor();
                let minutes = ((seconds - 3600.0 * hours) / 60.0).floor();
                let secs = seconds.rem_euclid(60.0).floor();
                write!(
                    f,
                    "{} hrs, {} mins, {} secs",
                    hours as i64, minutes as i64, secs as i64
                )
            }
        }
    }
}

/// A single selected value or several.
///
/// A single value behaves exactly like a one-element set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Selection {
    /// One selected value.
    One(String),
    /// Any number of selected values.
    Many(Vec<String>),
}

impl Selection {
    /// The selected values as a set.
    #[must_use]
    pub fn to_set(&self) -> BTreeSet<&str> {
        match self {
            Self::One(v) => BTreeSet::from([v.as_str()]),
            Self::Many(vs) => vs.iter().map(String::as_str).collect(),
        }
    }

    /// Parses a comma-separated list, trimming whitespace and dropping
    /// empty entries.
    #[must_use]
    pub fn from_csv(s: &str) -> Self {
        let values: Vec<String> = s
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect();
        match <[String; 1]>::try_from(values) {
            Ok([one]) => Self::One(one),
            Err(values) => Self::Many(values),
        }
    }
}

impl From<&str> for Selection {
    fn from(value: &str) -> Self {
        Self::One(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flow_config_defaults() {
        let config = FlowConfig::default();
        assert_eq!(config.value_column, None);
        assert!(config.threshold.abs() < f64::EPSILON);
        assert_eq!(config.node_thickness, 50);
    }

    #[test]
    fn flow_config_fills_missing_fields_from_defaults() {
        let config: FlowConfig = toml::from_str("threshold = 5.0").unwrap();
        assert!((config.threshold - 5.0).abs() < f64::EPSILON);
        assert_eq!(config.node_thickness, DEFAULT_NODE_THICKNESS);
    }

    #[test]
    fn formats_average_duration() {
        let lookup = DurationLookup::Average {
            seconds: 3_725.9,
            trips: 2,
        };
        assert_eq!(lookup.to_string(), "1 hrs, 2 mins, 5 secs");

        let lookup = DurationLookup::Average {
            seconds: 200.0,
            trips: 2,
        };
        assert_eq!(lookup.to_string(), "0 hrs, 3 mins, 20 secs");
    }

    #[test]
    fn sentinels_render_as_messages() {
        assert_eq!(
            DurationLookup::SameStation.to_string(),
            "Start and End station cannot be the same"
        );
        assert_eq!(
            DurationLookup::NoTrips.to_string(),
            "Sorry no trips of that type!"
        );
    }

    #[test]
    fn single_selection_is_a_one_element_set() {
        let one = Selection::from("2022");
        let many = Selection::Many(vec!["2022".to_string()]);
        assert_eq!(one.to_set(), many.to_set());
    }

    #[test]
    fn selection_from_csv() {
        assert_eq!(
            Selection::from_csv("2022"),
            Selection::One("2022".to_string())
        );
        assert_eq!(
            Selection::from_csv("2022, 2023,"),
            Selection::Many(vec!["2022".to_string(), "2023".to_string()])
        );
        assert!(Selection::from_csv("").to_set().is_empty());
    }

    #[test]
    fn selection_deserializes_scalar_or_list() {
        let one: Selection = serde_json::from_str("\"2022\"").unwrap();
        let many: Selection = serde_json::from_str("[\"2022\", \"2023\"]").unwrap();
        assert_eq!(one, Selection::One("2022".to_string()));
        assert_eq!(many.to_set().len(), 2);
    }
}
