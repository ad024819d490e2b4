use crate::config::toml_config::CrosswordConfig;
use crate::core::generator::ClueGenerator;
use crate::core::layout::LayoutEngine;
use crate::core::render::TextRenderer;
use crate::core::{LayoutResult, Pipeline, RenderedPuzzle, Storage, WordClue};
use crate::utils::error::Result;
use std::io::Write;
use zip::write::{SimpleFileOptions, ZipWriter};

/// `"space exploration"` -> `"space_exploration"`; keeps only `[A-Za-z0-9_]`.
pub fn safe_topic(topic: &str) -> String {
    topic
        .trim()
        .replace([' ', '-'], "_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

pub struct CrosswordPipeline<S: Storage> {
    storage: S,
    config: CrosswordConfig,
    generator: ClueGenerator,
    layout_engine: LayoutEngine,
    renderer: TextRenderer,
}

impl<S: Storage> CrosswordPipeline<S> {
    pub fn new(storage: S, generator: ClueGenerator, config: CrosswordConfig) -> Self {
        Self {
            storage,
            layout_engine: LayoutEngine::new(config.layout.clone()),
            renderer: TextRenderer::new(config.render.clone()),
            generator,
            config,
        }
    }

    fn base_name(&self, topic: &str) -> String {
        let safe = safe_topic(topic);
        if safe.is_empty() {
            self.config.output.filename_prefix.clone()
        } else {
            format!("{}-{}", self.config.output.filename_prefix, safe)
        }
    }

    /// 依設定的格式列出要輸出的檔案
    fn output_files(&self, puzzle: &RenderedPuzzle) -> Vec<(String, String)> {
        let base = self.base_name(&puzzle.topic);
        let mut files = Vec::new();

        if self.config.wants_format("text") {
            files.push((format!("{}_grid.txt", base), puzzle.grid_text.clone()));
            files.push((format!("{}_key.txt", base), puzzle.key_text.clone()));
            files.push((format!("{}_clues.txt", base), puzzle.clues_text.clone()));
        }
        if self.config.wants_format("json") {
            files.push((format!("{}.json", base), puzzle.json.clone()));
        }
        if self.config.wants_format("csv") {
            files.push((format!("{}_words.csv", base), puzzle.csv.clone()));
        }
        files
    }

    fn bundle(files: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
        for (name, content) in files {
            zip.start_file(name.as_str(), SimpleFileOptions::default())?;
            zip.write_all(content)?;
        }
        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }

    /// 先寫入暫存檔，全部成功後才改名；任何失敗都會清掉已寫出的檔案
    async fn commit(&self, files: &[(String, Vec<u8>)]) -> Result<Vec<String>> {
        let mut staged = Vec::with_capacity(files.len());
        for (name, data) in files {
            let temp = staging_name(name);
            if let Err(e) = self.storage.write_file(&temp, data).await {
                tracing::error!("❌ Failed to write {}: {}", name, e);
                staged.push(temp);
                self.discard(&staged).await;
                return Err(e);
            }
            staged.push(temp);
        }

        let mut committed: Vec<String> = Vec::with_capacity(files.len());
        for ((name, _), temp) in files.iter().zip(&staged) {
            if let Err(e) = self.storage.rename(temp, name).await {
                tracing::error!("❌ Failed to move {} into place: {}", name, e);
                self.discard(&committed).await;
                self.discard(&staged[committed.len()..]).await;
                return Err(e);
            }
            tracing::debug!("Wrote {}", name);
            committed.push(name.clone());
        }

        Ok(committed
            .iter()
            .map(|name| self.storage.location(name))
            .collect())
    }

    async fn discard(&self, paths: &[String]) {
        for path in paths {
            if let Err(e) = self.storage.remove(path).await {
                tracing::warn!("⚠️ Could not remove {}: {}", path, e);
            }
        }
    }
}

fn staging_name(name: &str) -> String {
    format!(".{}.part", name)
}

#[async_trait::async_trait]
impl<S: Storage> Pipeline for CrosswordPipeline<S> {
    async fn generate(&self, topic: &str) -> Result<Vec<WordClue>> {
        let mut words = self
            .generator
            .generate(topic, self.config.generator.word_count)
            .await?;

        // 長字優先，同長度保留原順序
        words.sort_by(|a, b| b.len().cmp(&a.len()));
        Ok(words)
    }

    async fn layout(&self, words: Vec<WordClue>) -> Result<LayoutResult> {
        let result = self.layout_engine.layout(&words)?;
        if !result.dropped.is_empty() {
            let dropped: Vec<&str> = result.dropped.iter().map(|w| w.word()).collect();
            tracing::warn!("⚠️ {} words dropped: {}", dropped.len(), dropped.join(", "));
        }
        Ok(result)
    }

    async fn render(&self, topic: &str, layout: &LayoutResult) -> Result<RenderedPuzzle> {
        Ok(self.renderer.render(topic, layout)?)
    }

    async fn load(&self, puzzle: RenderedPuzzle) -> Result<Vec<String>> {
        let files: Vec<(String, Vec<u8>)> = self
            .output_files(&puzzle)
            .into_iter()
            .map(|(name, content)| (name, content.into_bytes()))
            .collect();

        if self.config.output.bundle {
            let name = format!("{}.zip", self.base_name(&puzzle.topic));
            let data = Self::bundle(&files)?;
            tracing::debug!("Writing ZIP bundle ({} bytes) with {} files", data.len(), files.len());
            return self.commit(&[(name, data)]).await;
        }

        self.commit(&files).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::StaticClueSource;
    use crate::domain::model::RawClue;
    use crate::utils::error::CrosswordError;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }

        async fn names(&self) -> Vec<String> {
            let files = self.files.lock().await;
            let mut names: Vec<String> = files.keys().cloned().collect();
            names.sort();
            names
        }
    }

    impl Storage for MockStorage {
        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }

        async fn rename(&self, from: &str, to: &str) -> Result<()> {
            let mut files = self.files.lock().await;
            let data = files.remove(from).ok_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::NotFound, from.to_string())
            })?;
            files.insert(to.to_string(), data);
            Ok(())
        }

        async fn remove(&self, path: &str) -> Result<()> {
            let mut files = self.files.lock().await;
            files.remove(path);
            Ok(())
        }

        fn location(&self, path: &str) -> String {
            format!("mock/{}", path)
        }
    }

    /// Fails the n-th write (1-based); everything else goes to the inner storage.
    #[derive(Clone)]
    struct FailingStorage {
        inner: MockStorage,
        writes: Arc<AtomicUsize>,
        fail_on: usize,
    }

    impl Storage for FailingStorage {
        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let n = self.writes.fetch_add(1, Ordering::SeqCst) + 1;
            if n == self.fail_on {
                return Err(std::io::Error::other("disk full").into());
            }
            self.inner.write_file(path, data).await
        }

        async fn rename(&self, from: &str, to: &str) -> Result<()> {
            self.inner.rename(from, to).await
        }

        async fn remove(&self, path: &str) -> Result<()> {
            self.inner.remove(path).await
        }

        fn location(&self, path: &str) -> String {
            self.inner.location(path)
        }
    }

    fn ocean_pairs() -> Vec<RawClue> {
        vec![
            RawClue::new("reef", "Ridge near the surface of the sea"),
            RawClue::new("ocean", "A vast body of salt water"),
            RawClue::new("coral", "Animal that builds tropical ridges"),
            RawClue::new("tide", "Twice-daily rise and fall of the sea"),
            RawClue::new("current", "Flow of water in a steady direction"),
            RawClue::new("kelp", "Large brown seaweed"),
        ]
    }

    fn pipeline<S: Storage>(storage: S, config: CrosswordConfig) -> CrosswordPipeline<S> {
        let generator = ClueGenerator::new(
            Box::new(StaticClueSource::new(ocean_pairs())),
            config.generator.clone(),
        );
        CrosswordPipeline::new(storage, generator, config)
    }

    #[test]
    fn test_safe_topic() {
        assert_eq!(safe_topic("space exploration"), "space_exploration");
        assert_eq!(safe_topic("Sci-Fi & Fantasy!"), "Sci_Fi__Fantasy");
        assert_eq!(safe_topic("  "), "");
    }

    #[tokio::test]
    async fn test_generate_sorts_longest_first() {
        let p = pipeline(MockStorage::new(), CrosswordConfig::default());
        let words = p.generate("ocean").await.unwrap();

        let answers: Vec<&str> = words.iter().map(|w| w.word()).collect();
        assert_eq!(answers, vec!["CURRENT", "OCEAN", "CORAL", "REEF", "TIDE", "KELP"]);
    }

    #[tokio::test]
    async fn test_load_writes_selected_formats() {
        let storage = MockStorage::new();
        let mut config = CrosswordConfig::default();
        config.layout.min_words = 2;
        config.output.formats = vec!["text".to_string(), "csv".to_string()];
        let p = pipeline(storage.clone(), config);

        let words = p.generate("ocean life").await.unwrap();
        let layout = p.layout(words).await.unwrap();
        let puzzle = p.render("ocean life", &layout).await.unwrap();
        let written = p.load(puzzle).await.unwrap();

        assert_eq!(written.len(), 4);
        assert_eq!(
            storage.names().await,
            vec![
                "topic2crossword-ocean_life_clues.txt",
                "topic2crossword-ocean_life_grid.txt",
                "topic2crossword-ocean_life_key.txt",
                "topic2crossword-ocean_life_words.csv",
            ]
        );
        assert!(written[0].starts_with("mock/"));
    }

    #[tokio::test]
    async fn test_load_bundle_zip() {
        let storage = MockStorage::new();
        let mut config = CrosswordConfig::default();
        config.layout.min_words = 2;
        config.output.bundle = true;
        let p = pipeline(storage.clone(), config);

        let words = p.generate("ocean").await.unwrap();
        let layout = p.layout(words).await.unwrap();
        let puzzle = p.render("ocean", &layout).await.unwrap();
        let written = p.load(puzzle).await.unwrap();

        assert_eq!(written, vec!["mock/topic2crossword-ocean.zip"]);

        let zip_bytes = storage.get_file("topic2crossword-ocean.zip").await.unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_bytes)).unwrap();
        let mut names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        names.sort();

        assert_eq!(
            names,
            vec![
                "topic2crossword-ocean.json",
                "topic2crossword-ocean_clues.txt",
                "topic2crossword-ocean_grid.txt",
                "topic2crossword-ocean_key.txt",
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_write_leaves_no_files() {
        let inner = MockStorage::new();
        let storage = FailingStorage {
            inner: inner.clone(),
            writes: Arc::new(AtomicUsize::new(0)),
            fail_on: 2,
        };
        let mut config = CrosswordConfig::default();
        config.layout.min_words = 2;
        config.output.formats = vec!["text".to_string(), "json".to_string()];
        let p = pipeline(storage, config);

        let words = p.generate("ocean").await.unwrap();
        let layout = p.layout(words).await.unwrap();
        let puzzle = p.render("ocean", &layout).await.unwrap();
        let err = p.load(puzzle).await.unwrap_err();

        assert!(matches!(err, CrosswordError::IoError(_)));
        assert!(inner.names().await.is_empty());
    }

    #[tokio::test]
    async fn test_load_leaves_no_staging_files() {
        let storage = MockStorage::new();
        let mut config = CrosswordConfig::default();
        config.layout.min_words = 2;
        config.output.formats = vec!["json".to_string()];
        let p = pipeline(storage.clone(), config);

        let words = p.generate("ocean").await.unwrap();
        let layout = p.layout(words).await.unwrap();
        let puzzle = p.render("ocean", &layout).await.unwrap();
        p.load(puzzle).await.unwrap();

        assert_eq!(storage.names().await, vec!["topic2crossword-ocean.json"]);
    }
}
