#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the bike-share dashboard server.
//!
//! Query parameters arrive as raw strings and are validated by the
//! handlers, so a malformed value becomes a 400 with an [`ApiError`] body
//! rather than an extractor rejection.

use bikeshare_analytics_models::DurationLookup;
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// Error body for 4xx/5xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Human-readable description.
    pub error: String,
}

impl ApiError {
    /// Wraps any displayable error.
    pub fn new(error: impl ToString) -> Self {
        Self {
            error: error.to_string(),
        }
    }
}

/// Query parameters for the flow endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowQueryParams {
    /// Comma-separated years. Defaults to the earliest year in the data.
    pub years: Option<String>,
}

/// Query parameters for endpoints filtered by a date range.
///
/// Either bound may be omitted, in which case the data's own bound is used.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeParams {
    /// Inclusive lower bound, `YYYY-MM-DD` or a full timestamp.
    pub from: Option<String>,
    /// Inclusive upper bound, `YYYY-MM-DD` or a full timestamp.
    pub to: Option<String>,
}

/// Query parameters for the station-usage endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationUsageParams {
    /// Neighborhood to map.
    pub neighborhood: String,
    /// Inclusive lower bound.
    pub from: Option<String>,
    /// Inclusive upper bound.
    pub to: Option<String>,
}

/// Query parameters for the duration endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DurationParams {
    /// Start station name.
    pub start: String,
    /// End station name.
    pub end: String,
}

/// Duration lookup with its display text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDuration {
    /// Start station name.
    pub start: String,
    /// End station name.
    pub end: String,
    /// The lookup result.
    pub result: DurationLookup,
    /// Formatted duration or sentinel message.
    pub message: String,
}

impl ApiDuration {
    /// Pairs a lookup with its formatted message.
    #[must_use]
    pub fn new(start: &str, end: &str, result: DurationLookup) -> Self {
        Self {
            start: start.to_string(),
            end: end.to_string(),
            message: result.to_string(),
            result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_carries_formatted_message() {
        let api = ApiDuration::new(
            "A",
            "B",
            DurationLookup::Average {
                seconds: 200.0,
                trips: 2,
            },
        );
        let json = serde_json::to_value(&api).unwrap();
        assert_eq!(json["message"], "0 hrs, 3 mins, 20 secs");
        assert_eq!(json["result"]["kind"], "average");
        assert_eq!(json["result"]["seconds"], 200.0);
    }

    #[test]
    fn sentinel_serializes_with_kind_only() {
        let api = ApiDuration::new("A", "A", DurationLookup::SameStation);
        let json = serde_json::to_value(&api).unwrap();
        assert_eq!(json["result"]["kind"], "sameStation");
        assert_eq!(json["message"], "Start and End station cannot be the same");
    }

    #[test]
    fn optional_range_bounds() {
        let params: DateRangeParams = serde_json::from_str(r#"{"from": "2022-08-01"}"#).unwrap();
        assert_eq!(params.from.as_deref(), Some("2022-08-01"));
        assert!(params.to.is_none());
    }
}
