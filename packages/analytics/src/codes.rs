//! Dense integer coding of categorical labels.
//!
//! Flow-diagram renderers address nodes by integer, so every distinct label
//! across the source and target columns gets a code in `0..n`.

use std::collections::{BTreeMap, BTreeSet};

use bikeshare_analytics_models::{CodedEdge, FlowEdge};

/// Bijection between labels and the codes `0..len()`.
///
/// Codes follow lexical label order, so the same label set always produces
/// the same table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelCodes {
    labels: Vec<String>,
    codes: BTreeMap<String, usize>,
}

impl LabelCodes {
    /// Builds the table from any labels, ignoring duplicates.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let distinct: BTreeSet<String> = labels
            .into_iter()
            .map(|l| l.as_ref().to_string())
            .collect();
        let labels: Vec<String> = distinct.into_iter().collect();
        let codes = labels
            .iter()
            .enumerate()
            .map(|(code, label)| (label.clone(), code))
            .collect();
        Self { labels, codes }
    }

    /// Code for `label`.
    #[must_use]
    pub fn code(&self, label: &str) -> Option<usize> {
        self.codes.get(label).copied()
    }

    /// Label for `code`.
    #[must_use]
    pub fn label(&self, code: usize) -> Option<&str> {
        self.labels.get(code).map(String::as_str)
    }

    /// Consumes the table, returning labels in code order.
    #[must_use]
    pub fn into_labels(self) -> Vec<String> {
        self.labels
    }

    /// Number of distinct labels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the table has no labels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Replaces the labels of every edge with their codes.
///
/// A label gets the same code whether it appears as a source or a target.
/// Edge order is preserved.
#[must_use]
pub fn code_edges(edges: &[FlowEdge]) -> (Vec<CodedEdge>, LabelCodes) {
    let codes = LabelCodes::from_labels(
        edges
            .iter()
            .flat_map(|e| [e.source.as_str(), e.target.as_str()]),
    );

    let coded = edges
        .iter()
        .filter_map(|e| {
            Some(CodedEdge {
                source: codes.code(&e.source)?,
                target: codes.code(&e.target)?,
                value: e.value,
            })
        })
        .collect();

    (coded, codes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(source: &str, target: &str, value: f64) -> FlowEdge {
        FlowEdge {
            source: source.to_string(),
            target: target.to_string(),
            value,
        }
    }

    #[test]
    fn empty_input_gives_empty_table() {
        let (coded, codes) = code_edges(&[]);
        assert!(coded.is_empty());
        assert!(codes.is_empty());
    }

    #[test]
    fn codes_are_contiguous_from_zero() {
        let edges = vec![
            edge("Subscriber", "August", 3.0),
            edge("Customer", "August", 1.0),
            edge("Subscriber", "July", 2.0),
        ];
        let (_, codes) = code_edges(&edges);
        assert_eq!(codes.len(), 4);
        for code in 0..codes.len() {
            let label = codes.label(code).unwrap();
            assert_eq!(codes.code(label), Some(code));
        }
        assert_eq!(codes.label(codes.len()), None);
    }

    #[test]
    fn decoding_restores_original_edges() {
        let edges = vec![
            edge("Subscriber", "August", 3.0),
            edge("August", "Subscriber", 1.0),
            edge("Customer", "Customer", 2.0),
        ];
        let (coded, codes) = code_edges(&edges);
        assert_eq!(coded.len(), edges.len());

        let decoded: Vec<FlowEdge> = coded
            .iter()
            .map(|c| {
                let source = codes.label(c.source).unwrap();
                edge(source, codes.label(c.target).unwrap(), c.value)
            })
            .collect();
        assert_eq!(decoded, edges);
    }

    #[test]
    fn same_label_same_code_on_both_sides() {
        let edges = vec![edge("A", "B", 1.0), edge("B", "C", 1.0)];
        let (coded, _) = code_edges(&edges);
        assert_eq!(coded[0].target, coded[1].source);
    }

    #[test]
    fn mapping_is_deterministic() {
        let a = LabelCodes::from_labels(["July", "August", "Customer", "August"]);
        let b = LabelCodes::from_labels(["Customer", "July", "August"]);
        assert_eq!(a, b);
        assert_eq!(a.into_labels(), ["August", "Customer", "July"]);
    }
}
