pub mod engine;
pub mod generator;
pub mod layout;
pub mod pipeline;
pub mod render;

pub use crate::domain::model::{LayoutResult, RenderedPuzzle, WordClue};
pub use crate::domain::ports::{ClueSource, Pipeline, Storage};
pub use crate::utils::error::Result;
