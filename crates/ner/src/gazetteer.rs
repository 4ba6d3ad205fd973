use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::model::EntityModel;
use crate::normalizer::normalize;
use crate::schema::Entity;

/// In-process phrase matcher backed by a label -> phrases table.
///
/// Phrases go through the same normalizer as request text, so matching happens
/// on whole words of normalized input. At each position the longest known phrase
/// wins, and matching resumes after it.
pub struct GazetteerModel {
    /// Maps normalized phrase -> label
    phrases: HashMap<String, String>,
    /// Longest phrase, in words
    max_words: usize,
}

impl GazetteerModel {
    pub fn from_entries(entries: BTreeMap<String, Vec<String>>) -> Self {
        let mut phrases = HashMap::new();
        let mut max_words = 0;

        for (label, list) in entries {
            for phrase in list {
                let normalized = normalize(&phrase);
                if normalized.is_empty() {
                    continue;
                }

                if let Some(existing) = phrases.get(&normalized) {
                    tracing::warn!(
                        phrase = %normalized,
                        kept = %existing,
                        ignored = %label,
                        "Phrase listed under several labels"
                    );
                    continue;
                }

                max_words = max_words.max(normalized.split(' ').count());
                phrases.insert(normalized, label.clone());
            }
        }

        Self { phrases, max_words }
    }

    /// Read a JSON gazetteer file: `{"ORG": ["apple inc", ...], "GPE": [...]}`.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .context(format!("Failed to read gazetteer: {:?}", path))?;

        let entries: BTreeMap<String, Vec<String>> = serde_json::from_str(&content)
            .context(format!("Invalid gazetteer JSON: {:?}", path))?;

        let model = Self::from_entries(entries);
        if model.is_empty() {
            anyhow::bail!("Gazetteer {:?} contains no phrases", path);
        }

        tracing::info!(path = ?path, phrases = model.len(), "Gazetteer NER model loaded");
        Ok(model)
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    fn match_words(&self, words: &[&str]) -> Vec<Entity> {
        let mut entities = Vec::new();
        let mut i = 0;

        while i < words.len() {
            let longest = self.max_words.min(words.len() - i);

            let found = (1..=longest).rev().find_map(|n| {
                let candidate = words[i..i + n].join(" ");
                self.phrases
                    .get(&candidate)
                    .map(|label| (n, Entity::new(candidate, label.clone())))
            });

            match found {
                Some((n, entity)) => {
                    entities.push(entity);
                    i += n;
                }
                None => i += 1,
            }
        }

        entities
    }
}

#[async_trait]
impl EntityModel for GazetteerModel {
    fn name(&self) -> &str {
        "gazetteer"
    }

    async fn extract(&self, text: &str) -> Result<Vec<Entity>> {
        let words: Vec<&str> = text.split_whitespace().collect();
        Ok(self.match_words(&words))
    }
}
