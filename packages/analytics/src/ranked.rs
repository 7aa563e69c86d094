//! Top-K occurrence counts of a single column.

use std::collections::BTreeMap;

use bikeshare_analytics_models::{RankedCount, RankedCounts};
use bikeshare_trip_models::Columnar;

use crate::AnalyticsError;

/// Counts each distinct value of `column` and keeps the `threshold` most
/// frequent.
///
/// Rows are ordered by count descending, then by value ascending.
///
/// # Errors
///
/// Returns [`AnalyticsError::Data`] if a row has no such column.
pub fn top_counts<R: Columnar>(
    rows: &[R],
    column: &str,
    count_label: &str,
    threshold: usize,
) -> Result<RankedCounts, AnalyticsError> {
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();

    for row in rows {
        let cell = row.cell(column).ok_or_else(|| AnalyticsError::Data {
            message: format!("unknown column '{column}'"),
        })?;
        *counts.entry(cell.to_string()).or_default() += 1;
    }

    let mut ranked: Vec<RankedCount> = counts
        .into_iter()
        .map(|(value, count)| RankedCount { value, count })
        .collect();
    // BTreeMap iteration already orders values, so a stable sort on count
    // keeps ties in ascending value order.
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(threshold);

    Ok(RankedCounts {
        column: column.to_string(),
        count_label: count_label.to_string(),
        rows: ranked,
    })
}
