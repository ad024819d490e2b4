pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{LocalStorage, OllamaClient, QuestionsFileSource, StaticClueSource};
pub use config::toml_config::CrosswordConfig;
pub use core::{
    engine::{CrosswordEngine, RunReport, RunState},
    generator::ClueGenerator,
    pipeline::CrosswordPipeline,
};
pub use utils::error::{CrosswordError, Result};
