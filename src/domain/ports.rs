use crate::domain::model::{LayoutResult, RawClue, RenderedPuzzle, WordClue};
use crate::utils::error::{GenerationError, Result};
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Moves `from` over `to`, replacing any existing file.
    fn rename(
        &self,
        from: &str,
        to: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Removing a path that does not exist is not an error.
    fn remove(&self, path: &str) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Where a relative path ends up, for reporting.
    fn location(&self, path: &str) -> String;
}

/// Capability interface for anything that can propose (word, clue) pairs.
#[async_trait]
pub trait ClueSource: Send + Sync {
    async fn generate(
        &self,
        topic: &str,
        count: usize,
    ) -> std::result::Result<Vec<RawClue>, GenerationError>;

    fn name(&self) -> &str;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn generate(&self, topic: &str) -> Result<Vec<WordClue>>;
    async fn layout(&self, words: Vec<WordClue>) -> Result<LayoutResult>;
    async fn render(&self, topic: &str, layout: &LayoutResult) -> Result<RenderedPuzzle>;
    async fn load(&self, puzzle: RenderedPuzzle) -> Result<Vec<String>>;
}
