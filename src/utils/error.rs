use thiserror::Error;

/// Clue Generator 階段的錯誤
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Generation service unreachable: {0}")]
    Unreachable(#[from] reqwest::Error),

    #[error("Generation service returned status {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Generation timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Malformed generation response: {reason}")]
    MalformedResponse { reason: String },

    #[error("Only {found} usable words generated, at least {required} required")]
    InsufficientWords { found: usize, required: usize },

    #[error("Failed to read questions file '{path}': {reason}")]
    QuestionsFile { path: String, reason: String },
}

/// Grid Layout Engine 階段的錯誤
#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("Only {placed} words could be placed, at least {required} required ({dropped} dropped)")]
    TooFewWords {
        placed: usize,
        required: usize,
        dropped: usize,
    },
}

/// Renderer 階段的錯誤
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Cannot render a grid with zero placed words")]
    EmptyGrid,

    #[error("Failed to encode rendered output: {0}")]
    Encoding(String),
}

#[derive(Error, Debug)]
pub enum CrosswordError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Generation,
    Layout,
    Render,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl CrosswordError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            CrosswordError::Generation(_) => ErrorCategory::Generation,
            CrosswordError::Layout(_) => ErrorCategory::Layout,
            CrosswordError::Render(_) => ErrorCategory::Render,
            CrosswordError::ConfigValidationError { .. }
            | CrosswordError::InvalidConfigValueError { .. }
            | CrosswordError::MissingConfigError { .. } => ErrorCategory::Configuration,
            CrosswordError::ZipError(_) | CrosswordError::IoError(_) => ErrorCategory::Output,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 服務暫時不可用，稍後重試即可
            CrosswordError::Generation(GenerationError::Unreachable(_))
            | CrosswordError::Generation(GenerationError::Timeout { .. }) => ErrorSeverity::Medium,
            CrosswordError::Generation(_)
            | CrosswordError::Layout(_)
            | CrosswordError::Render(_) => ErrorSeverity::High,
            CrosswordError::ConfigValidationError { .. }
            | CrosswordError::InvalidConfigValueError { .. }
            | CrosswordError::MissingConfigError { .. } => ErrorSeverity::High,
            CrosswordError::ZipError(_) | CrosswordError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Configuration => 1,
            ErrorCategory::Generation => 2,
            ErrorCategory::Layout => 3,
            ErrorCategory::Render => 4,
            ErrorCategory::Output => 5,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            CrosswordError::Generation(GenerationError::Unreachable(_)) => {
                "Could not reach the text-generation service".to_string()
            }
            CrosswordError::Generation(GenerationError::Timeout { seconds }) => {
                format!("The model did not answer within {} seconds", seconds)
            }
            CrosswordError::Generation(GenerationError::InsufficientWords { found, required }) => {
                format!(
                    "The model produced only {} usable words (need {})",
                    found, required
                )
            }
            CrosswordError::Layout(LayoutError::TooFewWords {
                placed, required, ..
            }) => format!(
                "Only {} words fit on the grid, a puzzle needs at least {}",
                placed, required
            ),
            CrosswordError::Render(RenderError::EmptyGrid) => {
                "Nothing to draw: the grid is empty".to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            CrosswordError::Generation(GenerationError::Unreachable(_)) => {
                "Start the model server with `ollama serve` and check --endpoint"
            }
            CrosswordError::Generation(GenerationError::Http { .. }) => {
                "Make sure the model is pulled, e.g. `ollama pull llama3.2:3b`"
            }
            CrosswordError::Generation(GenerationError::Timeout { .. }) => {
                "Increase --timeout or use a smaller model"
            }
            CrosswordError::Generation(GenerationError::MalformedResponse { .. }) => {
                "Run again; smaller models sometimes ignore the output format"
            }
            CrosswordError::Generation(GenerationError::InsufficientWords { .. }) => {
                "Try a broader topic or raise --count"
            }
            CrosswordError::Generation(GenerationError::QuestionsFile { .. }) => {
                "Check the questions file is a JSON array of {question, answer} objects"
            }
            CrosswordError::Layout(_) => "Try a broader topic, raise --count or lower --min-words",
            CrosswordError::Render(_) => "Check the layout produced at least one word",
            CrosswordError::ConfigValidationError { .. }
            | CrosswordError::InvalidConfigValueError { .. }
            | CrosswordError::MissingConfigError { .. } => {
                "Fix the configuration file or command-line options"
            }
            CrosswordError::ZipError(_) | CrosswordError::IoError(_) => {
                "Check the output directory exists and is writable"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, CrosswordError>;
