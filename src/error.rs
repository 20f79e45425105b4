pub type LiquitypeResult<T> = Result<T, LiquitypeError>;

#[derive(thiserror::Error, Debug)]
pub enum LiquitypeError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("suggestion error: {0}")]
    Suggestion(String),

    #[error("export error: {0}")]
    Export(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LiquitypeError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn suggestion(msg: impl Into<String>) -> Self {
        Self::Suggestion(msg.into())
    }

    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}
