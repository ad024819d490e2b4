use crate::config::toml_config::CrosswordConfig;
use crate::utils::error::Result;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "topic2crossword")]
#[command(about = "Convert any topic into a crossword puzzle using a local language model")]
#[command(version)]
pub struct CliConfig {
    /// Topic to build the puzzle around
    #[arg(default_value = "Crossword Puzzle")]
    pub topic: String,

    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Read {question, answer} pairs from a JSON file instead of the model
    #[arg(long)]
    pub questions: Option<String>,

    /// Model server base URL
    #[arg(long)]
    pub endpoint: Option<String>,

    #[arg(long)]
    pub model: Option<String>,

    /// Number of words to request
    #[arg(long)]
    pub count: Option<usize>,

    /// Minimum number of placed words for a usable puzzle
    #[arg(long)]
    pub min_words: Option<usize>,

    /// Generation timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    #[arg(long)]
    pub output_path: Option<String>,

    /// Output formats: text, json, csv
    #[arg(long, value_delimiter = ',')]
    pub formats: Vec<String>,

    /// Pack all output files into one ZIP archive
    #[arg(long)]
    pub bundle: bool,

    /// Log CPU and memory use per stage
    #[arg(long)]
    pub monitor: bool,

    /// Show the resolved configuration without generating anything
    #[arg(long)]
    pub dry_run: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,
}

impl CliConfig {
    /// 載入設定檔 (若有) 後套用命令列覆蓋
    pub fn resolve(&self) -> Result<CrosswordConfig> {
        let mut config = match &self.config {
            Some(path) => CrosswordConfig::from_file(path)?,
            None => CrosswordConfig::default(),
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut CrosswordConfig) {
        if let Some(path) = &self.questions {
            config.generator.questions_file = Some(path.clone());
        }
        if let Some(endpoint) = &self.endpoint {
            config.generator.endpoint = endpoint.clone();
        }
        if let Some(model) = &self.model {
            config.generator.model = model.clone();
        }
        if let Some(count) = self.count {
            config.generator.word_count = count;
        }
        if let Some(min_words) = self.min_words {
            config.layout.min_words = min_words;
        }
        if let Some(timeout) = self.timeout {
            config.generator.timeout_seconds = timeout;
        }
        if let Some(path) = &self.output_path {
            config.output.output_path = path.clone();
        }
        if !self.formats.is_empty() {
            config.output.formats = self.formats.clone();
        }
        if self.bundle {
            config.output.bundle = true;
        }
        if self.monitor {
            config.monitoring.enabled = true;
        }
    }
}
