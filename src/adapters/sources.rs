use crate::domain::model::RawClue;
use crate::domain::ports::ClueSource;
use crate::utils::error::GenerationError;
use async_trait::async_trait;

/// Reads pairs from a JSON questions file:
/// `[{"question": "...", "answer": "..."}, ...]`.
pub struct QuestionsFileSource {
    path: String,
}

impl QuestionsFileSource {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ClueSource for QuestionsFileSource {
    async fn generate(&self, _topic: &str, _count: usize) -> Result<Vec<RawClue>, GenerationError> {
        let content =
            tokio::fs::read_to_string(&self.path)
                .await
                .map_err(|e| GenerationError::QuestionsFile {
                    path: self.path.clone(),
                    reason: e.to_string(),
                })?;

        let items: Vec<serde_json::Value> =
            serde_json::from_str(&content).map_err(|e| GenerationError::QuestionsFile {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;
        tracing::info!("📄 Loaded {} questions from {}", items.len(), self.path);

        let mut pairs = Vec::with_capacity(items.len());
        for item in items {
            match serde_json::from_value::<RawClue>(item.clone()) {
                Ok(pair) => pairs.push(pair),
                Err(e) => tracing::warn!("Skipping item {}: {}", item, e),
            }
        }

        Ok(pairs)
    }

    fn name(&self) -> &str {
        &self.path
    }
}

/// Fixed in-memory pairs; deterministic stand-in for the model.
#[derive(Debug, Clone, Default)]
pub struct StaticClueSource {
    pairs: Vec<RawClue>,
}

impl StaticClueSource {
    pub fn new(pairs: Vec<RawClue>) -> Self {
        Self { pairs }
    }
}

#[async_trait]
impl ClueSource for StaticClueSource {
    async fn generate(&self, _topic: &str, _count: usize) -> Result<Vec<RawClue>, GenerationError> {
        Ok(self.pairs.clone())
    }

    fn name(&self) -> &str {
        "static word list"
    }
}
