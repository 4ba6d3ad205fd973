pub mod aggregate;
pub mod gazetteer;
pub mod model;
pub mod normalizer;
pub mod report;
pub mod schema;

pub use aggregate::{AggregationResult, Aggregator, LabelSummary};
pub use gazetteer::GazetteerModel;
pub use model::{EntityModel, RemoteModel};
pub use normalizer::{normalize, normalize_value};
pub use report::{EntitySummary, RowsReport, SUMMARY_FILENAME, render_text};
pub use schema::{Entity, RowEntities};

use anyhow::Result;
use std::sync::Arc;

/// Normalize -> extract -> aggregate, over one shared model handle.
#[derive(Clone)]
pub struct Pipeline {
    model: Arc<dyn EntityModel>,
}

impl Pipeline {
    pub fn new(model: Arc<dyn EntityModel>) -> Self {
        Self { model }
    }

    /// Extract entities from raw text
    pub async fn analyze(&self, text: &str) -> Result<Vec<Entity>> {
        self.analyze_normalized(&normalize(text)).await
    }

    /// Extract entities from text that already went through [`normalize`].
    pub async fn analyze_normalized(&self, cleaned: &str) -> Result<Vec<Entity>> {
        if cleaned.is_empty() {
            return Ok(Vec::new());
        }

        let entities = self.model.extract(cleaned).await?;
        tracing::debug!(
            model = self.model.name(),
            chars = cleaned.len(),
            entities = entities.len(),
            "Extracted entities"
        );
        Ok(entities)
    }

    /// Extract one CSV row, keeping its original index and text
    pub async fn analyze_row(&self, row: usize, original_text: String) -> Result<RowEntities> {
        let entities = self.analyze(&original_text).await?;
        Ok(RowEntities {
            row,
            original_text,
            entities,
        })
    }

    /// Aggregate entities across many texts.
    pub async fn summarize<'a, I>(&self, texts: I) -> Result<AggregationResult>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut aggregator = Aggregator::new();
        for text in texts {
            let entities = self.analyze(text).await?;
            aggregator.record(&entities);
        }
        Ok(aggregator.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn gazetteer() -> Arc<dyn EntityModel> {
        let mut entries = BTreeMap::new();
        entries.insert("ORG".to_string(), vec!["Apple Inc".to_string(), "Google".to_string()]);
        entries.insert(
            "GPE".to_string(),
            vec!["Cupertino".to_string(), "California".to_string(), "Paris".to_string()],
        );
        entries.insert("PERSON".to_string(), vec!["Tim Cook".to_string()]);
        Arc::new(GazetteerModel::from_entries(entries))
    }

    /// Counts calls, reports nothing
    struct CountingModel(AtomicUsize);

    #[async_trait]
    impl EntityModel for CountingModel {
        fn name(&self) -> &str {
            "counting"
        }

        async fn extract(&self, _text: &str) -> Result<Vec<Entity>> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    struct FailingModel;

    #[async_trait]
    impl EntityModel for FailingModel {
        fn name(&self) -> &str {
            "failing"
        }

        async fn extract(&self, _text: &str) -> Result<Vec<Entity>> {
            anyhow::bail!("model crashed")
        }
    }

    #[tokio::test]
    async fn test_end_to_end_sentence() {
        let pipeline = Pipeline::new(gazetteer());
        let summary = pipeline
            .summarize(["Apple Inc. is based in Cupertino, California. Tim Cook is CEO."])
            .await
            .unwrap();

        let counts = summary.counts();
        assert_eq!(counts["ORG"], 1);
        assert_eq!(counts["GPE"], 2);
        assert_eq!(counts["PERSON"], 1);
        for label in summary.labels() {
            assert!(!label.entities.is_empty());
        }
        assert!(summary.get("GPE").unwrap().entities.contains("cupertino"));
    }

    #[tokio::test]
    async fn test_summarize_many_texts() {
        let pipeline = Pipeline::new(gazetteer());
        let summary = pipeline
            .summarize(["Google in Paris", "@google #paris google!", "Paris, again"])
            .await
            .unwrap();

        assert_eq!(summary.get("ORG").unwrap().count, 2);
        assert_eq!(summary.get("GPE").unwrap().count, 2);
        assert_eq!(summary.get("GPE").unwrap().entities.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_text_skips_model() {
        let model = Arc::new(CountingModel(AtomicUsize::new(0)));
        let pipeline = Pipeline::new(model.clone());

        assert!(pipeline.analyze("!!! https://x.y").await.unwrap().is_empty());
        assert_eq!(model.0.load(Ordering::SeqCst), 0);

        pipeline.analyze("hello").await.unwrap();
        assert_eq!(model.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_analyze_row_keeps_original_text() {
        let pipeline = Pipeline::new(gazetteer());
        let row = pipeline.analyze_row(3, "Paris is lovely.".to_string()).await.unwrap();

        assert_eq!(row.row, 3);
        assert_eq!(row.original_text, "Paris is lovely.");
        assert_eq!(row.entities, vec![Entity::new("paris", "GPE")]);
    }

    #[tokio::test]
    async fn test_model_errors_propagate() {
        let pipeline = Pipeline::new(Arc::new(FailingModel));
        assert!(pipeline.summarize(["some text"]).await.is_err());
    }
}
