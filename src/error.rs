use thiserror::Error;

pub type Result<T> = std::result::Result<T, WardenError>;

#[derive(Error, Debug)]
pub enum WardenError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid rule pattern ({rule_id}): {message}")]
    Pattern { rule_id: String, message: String },

    #[error("Subprocess error: {0}")]
    Subprocess(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Output error: {0}")]
    Output(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl WardenError {
    pub fn exit_code(&self) -> i32 {
        2
    }

    /// True for caller mistakes that must always propagate, as opposed to
    /// soft external failures that degrade to partial or empty results.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
