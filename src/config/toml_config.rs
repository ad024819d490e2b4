use crate::utils::error::{CrosswordError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const OUTPUT_FORMATS: [&str; 3] = ["text", "json", "csv"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CrosswordConfig {
    pub generator: GeneratorConfig,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
    pub output: OutputConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub endpoint: String,
    pub model: String,
    pub word_count: usize,
    /// 過濾後少於此數即視為生成失敗
    pub min_words: usize,
    pub min_length: usize,
    pub max_length: usize,
    pub timeout_seconds: u64,
    pub temperature: Option<f32>,
    /// 使用 JSON 題目檔取代模型
    pub questions_file: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "llama3.2:3b".to_string(),
            word_count: 30,
            min_words: 1,
            min_length: 3,
            max_length: 15,
            timeout_seconds: 60,
            temperature: None,
            questions_file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub max_rows: usize,
    pub max_cols: usize,
    /// Upper bound on positions evaluated per word.
    pub max_candidates: usize,
    pub min_words: usize,
    pub allow_disjoint: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            max_rows: 50,
            max_cols: 50,
            max_candidates: 500,
            min_words: 5,
            allow_disjoint: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub title: String,
    /// Blocked frame drawn around the grid.
    pub margin: usize,
    pub show_lengths: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            title: "AI Crossword Generator".to_string(),
            margin: 1,
            show_lengths: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub output_path: String,
    pub filename_prefix: String,
    pub formats: Vec<String>,
    pub bundle: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_path: "./output".to_string(),
            filename_prefix: "topic2crossword".to_string(),
            formats: vec!["text".to_string(), "json".to_string()],
            bundle: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

impl CrosswordConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| CrosswordError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${OLLAMA_HOST})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| CrosswordError::ConfigValidationError {
            field: "environment".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        let generator = &self.generator;
        if generator.questions_file.is_none() {
            validation::validate_url("generator.endpoint", &generator.endpoint)?;
            validation::validate_non_empty_string("generator.model", &generator.model)?;
        }
        validation::validate_positive_number("generator.word_count", generator.word_count, 1)?;
        validation::validate_positive_number("generator.min_words", generator.min_words, 1)?;
        validation::validate_positive_number("generator.timeout_seconds", generator.timeout_seconds as usize, 1)?;
        validation::validate_range("generator.min_length", generator.min_length, 2, 15)?;
        validation::validate_range(
            "generator.max_length",
            generator.max_length,
            generator.min_length,
            self.layout.max_rows.max(self.layout.max_cols),
        )?;
        if generator.min_words > generator.word_count {
            return Err(CrosswordError::InvalidConfigValueError {
                field: "generator.min_words".to_string(),
                value: generator.min_words.to_string(),
                reason: format!("Cannot exceed generator.word_count ({})", generator.word_count),
            });
        }
        if let Some(temperature) = generator.temperature {
            validation::validate_range("generator.temperature", temperature, 0.0, 2.0)?;
        }
        if let Some(path) = &generator.questions_file {
            validation::validate_path("generator.questions_file", path)?;
        }

        validation::validate_range("layout.max_rows", self.layout.max_rows, 3, 200)?;
        validation::validate_range("layout.max_cols", self.layout.max_cols, 3, 200)?;
        validation::validate_positive_number("layout.max_candidates", self.layout.max_candidates, 1)?;
        validation::validate_positive_number("layout.min_words", self.layout.min_words, 1)?;

        validation::validate_range("render.margin", self.render.margin, 0, 5)?;

        validation::validate_path("output.output_path", &self.output.output_path)?;
        validation::validate_non_empty_string("output.filename_prefix", &self.output.filename_prefix)?;
        validation::validate_formats("output.formats", &self.output.formats, &OUTPUT_FORMATS)?;

        Ok(())
    }

    pub fn wants_format(&self, format: &str) -> bool {
        self.output.formats.iter().any(|f| f == format)
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.enabled
    }
}

impl Validate for CrosswordConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
