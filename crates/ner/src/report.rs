use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;

use crate::aggregate::AggregationResult;
use crate::schema::{Entity, RowEntities};

/// Attachment name for the plain-text report.
pub const SUMMARY_FILENAME: &str = "ner_summary.txt";

/// JSON body for a single-text request.
#[derive(Debug, Serialize)]
pub struct EntitySummary {
    pub entity_summary: BTreeMap<String, usize>,
    pub entities: Vec<Entity>,
}

impl EntitySummary {
    pub fn new(summary: &AggregationResult, entities: Vec<Entity>) -> Self {
        Self {
            entity_summary: summary.counts(),
            entities,
        }
    }
}

/// JSON body for a CSV request.
#[derive(Debug, Serialize)]
pub struct RowsReport {
    pub result: Vec<RowEntities>,
}

/// Render the human-readable summary offered as a download.
///
/// ```text
/// Summary Report:
/// ORG: 2 occurrence(s)
///   Entities: apple, google
/// ```
pub fn render_text(summary: &AggregationResult) -> String {
    let mut out = String::from("Summary Report:\n");

    for label in summary.labels() {
        let entities: Vec<&str> = label.entities.iter().map(String::as_str).collect();
        // Writing to a String cannot fail
        let _ = writeln!(out, "{}: {} occurrence(s)", label.label, label.count);
        let _ = writeln!(out, "  Entities: {}", entities.join(", "));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Aggregator;

    #[test]
    fn test_text_report() {
        let mut aggregator = Aggregator::new();
        aggregator.record(&[Entity::new("google", "ORG"), Entity::new("apple", "ORG")]);
        let report = render_text(&aggregator.finish());

        assert_eq!(
            report,
            "Summary Report:\nORG: 2 occurrence(s)\n  Entities: apple, google\n"
        );
    }

    #[test]
    fn test_text_report_label_order() {
        let mut aggregator = Aggregator::new();
        aggregator.record(&[Entity::new("paris", "GPE")]);
        aggregator.record(&[Entity::new("acme", "ORG"), Entity::new("lyon", "GPE")]);
        let report = render_text(&aggregator.finish());

        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines[1], "GPE: 2 occurrence(s)");
        assert_eq!(lines[2], "  Entities: lyon, paris");
        assert_eq!(lines[3], "ORG: 1 occurrence(s)");
    }

    #[test]
    fn test_empty_report_has_header_only() {
        assert_eq!(render_text(&AggregationResult::default()), "Summary Report:\n");
    }

    #[test]
    fn test_json_shapes() {
        let entities = vec![Entity::new("apple", "ORG"), Entity::new("apple", "ORG")];
        let mut aggregator = Aggregator::new();
        aggregator.record(&entities);

        let body = serde_json::to_value(EntitySummary::new(&aggregator.finish(), entities)).unwrap();
        assert_eq!(body["entity_summary"]["ORG"], 2);
        assert_eq!(body["entities"][1]["text"], "apple");

        let rows = RowsReport {
            result: vec![RowEntities {
                row: 0,
                original_text: "Paris is lovely.".to_string(),
                entities: vec![Entity::new("paris", "GPE")],
            }],
        };
        let body = serde_json::to_value(rows).unwrap();
        assert_eq!(body["result"][0]["row"], 0);
        assert_eq!(body["result"][0]["original_text"], "Paris is lovely.");
        assert_eq!(body["result"][0]["entities"][0]["label"], "GPE");
    }
}
