use serde::{Deserialize, Serialize};

/// A labeled span reported by the entity model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    pub label: String,
}

impl Entity {
    pub fn new(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label: label.into(),
        }
    }
}

/// One processed CSV row: where it came from, what it said, what was found.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowEntities {
    pub row: usize,
    pub original_text: String,
    pub entities: Vec<Entity>,
}
