use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::schema::Entity;

/// Occurrences of one label across every processed text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelSummary {
    pub label: String,
    pub count: usize,
    /// Unique entity texts, sorted ascending
    pub entities: BTreeSet<String>,
}

/// Per-label counts and unique entity texts.
///
/// Labels keep the order in which they were first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregationResult {
    labels: Vec<LabelSummary>,
}

impl AggregationResult {
    pub fn labels(&self) -> &[LabelSummary] {
        &self.labels
    }

    pub fn get(&self, label: &str) -> Option<&LabelSummary> {
        self.labels.iter().find(|s| s.label == label)
    }

    /// Label -> count
    pub fn counts(&self) -> BTreeMap<String, usize> {
        self.labels
            .iter()
            .map(|s| (s.label.clone(), s.count))
            .collect()
    }

    /// Sum of all label counts.
    pub fn total(&self) -> usize {
        self.labels.iter().map(|s| s.count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Request-scoped accumulator over extraction results.
#[derive(Debug, Default)]
pub struct Aggregator {
    labels: Vec<LabelSummary>,
    index: HashMap<String, usize>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count every entity of one extraction.
    pub fn record(&mut self, entities: &[Entity]) {
        for entity in entities {
            let slot = match self.index.get(&entity.label) {
                Some(&slot) => slot,
                None => {
                    self.labels.push(LabelSummary {
                        label: entity.label.clone(),
                        count: 0,
                        entities: BTreeSet::new(),
                    });
                    self.index.insert(entity.label.clone(), self.labels.len() - 1);
                    self.labels.len() - 1
                }
            };

            let summary = &mut self.labels[slot];
            summary.count += 1;
            summary.entities.insert(entity.text.clone());
        }
    }

    pub fn finish(self) -> AggregationResult {
        AggregationResult {
            labels: self.labels,
        }
    }
}
