use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("CONTRACT: {0}")]
    Contract(String),
    #[error("CONFIG_INVALID: {0}")]
    Config(String),
}

impl From<serde_json::Error> for EngineError {
    fn from(value: serde_json::Error) -> Self {
        Self::Config(value.to_string())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
