use crate::core::Pipeline;
use crate::utils::error::{CrosswordError, ErrorCategory, Result};
use crate::utils::monitor::SystemMonitor;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Pending,
    Generating,
    LayingOut,
    Rendering,
    Writing,
    Done,
    Failed(ErrorCategory),
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Pending => write!(f, "PENDING"),
            RunState::Generating => write!(f, "GENERATING"),
            RunState::LayingOut => write!(f, "LAYING_OUT"),
            RunState::Rendering => write!(f, "RENDERING"),
            RunState::Writing => write!(f, "WRITING"),
            RunState::Done => write!(f, "DONE"),
            RunState::Failed(kind) => write!(f, "FAILED({:?})", kind),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub files: Vec<String>,
    pub placed: usize,
    pub dropped: Vec<String>,
    pub rows: usize,
    pub cols: usize,
}

/// Drives a pipeline through GENERATING -> LAYING_OUT -> RENDERING -> DONE.
///
/// The first failing stage moves the run to `Failed` with that error's
/// category; nothing is retried and nothing is written after a failure.
pub struct CrosswordEngine<P: Pipeline> {
    pipeline: P,
    state: RunState,
    monitor: SystemMonitor,
}

impl<P: Pipeline> CrosswordEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            state: RunState::Pending,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    fn transition(&mut self, next: RunState) {
        tracing::debug!("State {} -> {}", self.state, next);
        self.state = next;
    }

    fn fail(&mut self, err: CrosswordError) -> CrosswordError {
        self.transition(RunState::Failed(err.category()));
        err
    }

    pub async fn run(&mut self, topic: &str) -> Result<RunReport> {
        tracing::info!("🚀 Building crossword for topic '{}'", topic);

        self.transition(RunState::Generating);
        let words = match self.pipeline.generate(topic).await {
            Ok(words) => words,
            Err(e) => return Err(self.fail(e)),
        };
        self.monitor.log_stats("Generation");

        self.transition(RunState::LayingOut);
        let layout = match self.pipeline.layout(words).await {
            Ok(layout) => layout,
            Err(e) => return Err(self.fail(e)),
        };
        self.monitor.log_stats("Layout");

        self.transition(RunState::Rendering);
        let puzzle = match self.pipeline.render(topic, &layout).await {
            Ok(puzzle) => puzzle,
            Err(e) => return Err(self.fail(e)),
        };
        self.monitor.log_stats("Render");

        self.transition(RunState::Writing);
        let files = match self.pipeline.load(puzzle).await {
            Ok(files) => files,
            Err(e) => return Err(self.fail(e)),
        };

        self.transition(RunState::Done);
        self.monitor.log_final_stats();

        Ok(RunReport {
            files,
            placed: layout.placed.len(),
            dropped: layout.dropped.iter().map(|w| w.word().to_string()).collect(),
            rows: layout.grid.rows(),
            cols: layout.grid.cols(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LayoutResult, RenderedPuzzle, WordClue};
    use crate::domain::model::Grid;
    use crate::utils::error::{GenerationError, RenderError};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    struct ScriptedPipeline {
        fail_generation: bool,
        fail_render: bool,
        loaded: Arc<AtomicBool>,
    }

    #[async_trait::async_trait]
    impl Pipeline for ScriptedPipeline {
        async fn generate(&self, _topic: &str) -> Result<Vec<WordClue>> {
            if self.fail_generation {
                return Err(GenerationError::MalformedResponse {
                    reason: "scripted".to_string(),
                }
                .into());
            }
            Ok(vec![WordClue::new("orbit", "Path around a star").unwrap()])
        }

        async fn layout(&self, words: Vec<WordClue>) -> Result<LayoutResult> {
            Ok(LayoutResult {
                grid: Grid::new(1, 5),
                placed: vec![],
                dropped: words,
            })
        }

        async fn render(&self, topic: &str, _layout: &LayoutResult) -> Result<RenderedPuzzle> {
            if self.fail_render {
                return Err(RenderError::EmptyGrid.into());
            }
            Ok(RenderedPuzzle {
                title: topic.to_string(),
                topic: topic.to_string(),
                grid_text: String::new(),
                key_text: String::new(),
                clues_text: String::new(),
                json: String::new(),
                csv: String::new(),
            })
        }

        async fn load(&self, _puzzle: RenderedPuzzle) -> Result<Vec<String>> {
            self.loaded.store(true, Ordering::SeqCst);
            Ok(vec!["out.txt".to_string()])
        }
    }

    fn scripted(fail_generation: bool, fail_render: bool) -> (ScriptedPipeline, Arc<AtomicBool>) {
        let loaded = Arc::new(AtomicBool::new(false));
        (
            ScriptedPipeline {
                fail_generation,
                fail_render,
                loaded: loaded.clone(),
            },
            loaded,
        )
    }

    #[tokio::test]
    async fn test_successful_run_reaches_done() {
        let (pipeline, loaded) = scripted(false, false);
        let mut engine = CrosswordEngine::new(pipeline);
        assert_eq!(engine.state(), RunState::Pending);

        let report = engine.run("space").await.unwrap();

        assert_eq!(engine.state(), RunState::Done);
        assert_eq!(report.files, vec!["out.txt"]);
        assert_eq!(report.dropped, vec!["ORBIT"]);
        assert!(loaded.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_generation_failure_is_terminal() {
        let (pipeline, loaded) = scripted(true, false);
        let mut engine = CrosswordEngine::new(pipeline);

        let err = engine.run("space").await.unwrap_err();

        assert!(matches!(err, CrosswordError::Generation(_)));
        assert_eq!(engine.state(), RunState::Failed(ErrorCategory::Generation));
        assert!(!loaded.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_render_failure_writes_nothing() {
        let (pipeline, loaded) = scripted(false, true);
        let mut engine = CrosswordEngine::new(pipeline);

        let err = engine.run("space").await.unwrap_err();

        assert_eq!(err.exit_code(), 4);
        assert_eq!(engine.state(), RunState::Failed(ErrorCategory::Render));
        assert!(!loaded.load(Ordering::SeqCst));
    }
}
