//! Flow-diagram aggregation over sequential categorical columns.

use std::collections::BTreeMap;

use bikeshare_analytics_models::{FlowConfig, FlowDiagram, FlowEdge};
use bikeshare_trip_models::Columnar;

use crate::AnalyticsError;
use crate::codes::code_edges;

fn label_of<R: Columnar>(row: &R, column: &str) -> Result<String, AnalyticsError> {
    row.cell(column)
        .map(|cell| cell.to_string())
        .ok_or_else(|| AnalyticsError::Data {
            message: format!("unknown column '{column}'"),
        })
}

fn weight_of<R: Columnar>(row: &R, value_column: Option<&str>) -> Result<f64, AnalyticsError> {
    let Some(column) = value_column else {
        return Ok(1.0);
    };
    let cell = row.cell(column).ok_or_else(|| AnalyticsError::Data {
        message: format!("unknown value column '{column}'"),
    })?;
    cell.as_f64().ok_or_else(|| AnalyticsError::Data {
        message: format!("value column '{column}' holds non-numeric value '{cell}'"),
    })
}

/// Stacks every adjacent column pair into one source/target edge list and
/// sums the weight of each distinct pair.
///
/// Each row contributes `columns.len() - 1` projections. Edges come out
/// ordered by (source, target).
///
/// # Errors
///
/// * [`AnalyticsError::Arity`] if fewer than two columns are given
/// * [`AnalyticsError::Data`] if a column is unknown or the value column
///   is not numeric
pub fn stack_columns<R: Columnar, S: AsRef<str>>(
    rows: &[R],
    columns: &[S],
    value_column: Option<&str>,
) -> Result<Vec<FlowEdge>, AnalyticsError> {
    if columns.len() < 2 {
        return Err(AnalyticsError::Arity {
            given: columns.len(),
        });
    }

    let mut sums: BTreeMap<(String, String), f64> = BTreeMap::new();

    for row in rows {
        let weight = weight_of(row, value_column)?;
        for pair in columns.windows(2) {
            let source = label_of(row, pair[0].as_ref())?;
            let target = label_of(row, pair[1].as_ref())?;
            *sums.entry((source, target)).or_default() += weight;
        }
    }

    Ok(sums
        .into_iter()
        .map(|((source, target), value)| FlowEdge {
            source,
            target,
            value,
        })
        .collect())
}

/// Builds a renderer-ready flow diagram.
///
/// Edges whose summed weight is below `config.threshold` are dropped before
/// the labels are coded, so only labels on surviving edges get a code.
///
/// # Errors
///
/// See [`stack_columns`].
pub fn make_flow<R: Columnar, S: AsRef<str>>(
    rows: &[R],
    columns: &[S],
    config: &FlowConfig,
) -> Result<FlowDiagram, AnalyticsError> {
    let mut edges = stack_columns(rows, columns, config.value_column.as_deref())?;
    let before = edges.len();
    edges.retain(|e| e.value >= config.threshold);

    log::debug!(
        "Flow over {} rows: {} edges, {} below threshold {}",
        rows.len(),
        edges.len(),
        before - edges.len(),
        config.threshold
    );

    let (links, codes) = code_edges(&edges);
    log::debug!("Flow diagram has {} nodes", codes.len());

    Ok(FlowDiagram {
        labels: codes.into_labels(),
        links,
        node_thickness: config.node_thickness,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bikeshare_trip_models::CellValue;

    struct Row {
        user: &'static str,
        month: &'static str,
        weight: f64,
    }

    impl Columnar for Row {
        fn cell(&self, column: &str) -> Option<CellValue<'_>> {
            match column {
                "usertype" => Some(CellValue::Text(self.user)),
                "month" => Some(CellValue::Text(self.month)),
                "weight" => Some(CellValue::Number(self.weight)),
                _ => None,
            }
        }
    }

    const fn row(user: &'static str, month: &'static str, weight: f64) -> Row {
        Row {
            user,
            month,
            weight,
        }
    }

    fn rows() -> Vec<Row> {
        vec![
            row("Subscriber", "August", 2.0),
            row("Subscriber", "August", 3.0),
            row("Customer", "August", 1.0),
            row("Subscriber", "July", 4.0),
            row("Customer", "July", 0.5),
        ]
    }

    #[test]
    fn rejects_fewer_than_two_columns() {
        let err = make_flow(&rows(), &["usertype"], &FlowConfig::default()).unwrap_err();
        assert!(matches!(err, AnalyticsError::Arity { given: 1 }));
        let none: [&str; 0] = [];
        assert!(matches!(
            make_flow(&rows(), &none, &FlowConfig::default()),
            Err(AnalyticsError::Arity { given: 0 })
        ));
    }

    #[test]
    fn counts_rows_without_value_column() {
        let edges = stack_columns(&rows(), &["usertype", "month"], None).unwrap();
        let find = |s: &str, t: &str| {
            edges
                .iter()
                .find(|e| e.source == s && e.target == t)
                .map(|e| e.value)
        };
        assert_eq!(edges.len(), 4);
        assert_eq!(find("Subscriber", "August"), Some(2.0));
        assert_eq!(find("Customer", "July"), Some(1.0));
    }

    #[test]
    fn conserves_weight_at_zero_threshold() {
        let columns = ["usertype", "month", "usertype"];
        let config = FlowConfig {
            value_column: Some("weight".to_string()),
            ..FlowConfig::default()
        };
        let diagram = make_flow(&rows(), &columns, &config).unwrap();
        let total: f64 = rows().iter().map(|r| r.weight).sum();
        // Two adjacent pairs, so every row is counted twice.
        let expected = total * 2.0;
        assert!((diagram.total_value() - expected).abs() < 1e-9);
    }

    #[test]
    fn drops_edges_below_threshold() {
        let config = FlowConfig {
            value_column: Some("weight".to_string()),
            threshold: 4.0,
            node_thickness: 20,
        };
        let diagram = make_flow(&rows(), &["usertype", "month"], &config).unwrap();
        assert!(diagram.links.iter().all(|l| l.value >= 4.0));
        assert_eq!(diagram.links.len(), 2);
        assert_eq!(diagram.labels, ["August", "July", "Subscriber"]);
        assert_eq!(diagram.node_thickness, 20);
    }

    #[test]
    fn links_decode_to_column_values() {
        let diagram = make_flow(&rows(), &["usertype", "month"], &FlowConfig::default()).unwrap();
        for link in &diagram.links {
            let source = diagram.labels[link.source].as_str();
            let target = diagram.labels[link.target].as_str();
            assert!(["Customer", "Subscriber"].contains(&source));
            assert!(["August", "July"].contains(&target));
        }
    }

    #[test]
    fn empty_rows_give_empty_diagram() {
        let diagram = make_flow::<Row, _>(&[], &["usertype", "month"], &FlowConfig::default())
            .unwrap();
        assert!(diagram.labels.is_empty());
        assert!(diagram.links.is_empty());
    }

    #[test]
    fn unknown_and_non_numeric_columns_are_data_errors() {
        assert!(matches!(
            stack_columns(&rows(), &["usertype", "bikeid"], None),
            Err(AnalyticsError::Data { .. })
        ));
        let err = stack_columns(&rows(), &["usertype", "month"], Some("month")).unwrap_err();
        assert!(err.to_string().contains("month"), "{err}");
    }
}
