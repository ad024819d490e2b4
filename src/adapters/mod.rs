// Adapters layer: concrete implementations for external systems (model server, files).

pub mod ollama;
pub mod sources;
pub mod storage;

pub use ollama::OllamaClient;
pub use sources::{QuestionsFileSource, StaticClueSource};
pub use storage::LocalStorage;
