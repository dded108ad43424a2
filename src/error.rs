use thiserror::Error;

pub type Result<T> = std::result::Result<T, AdviceError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AdviceError {
    #[error("Invalid timestamp format: {format:?}")]
    InvalidTimestampFormat { format: String },

    #[error("Invalid configuration value for {key}: {value:?}")]
    InvalidConfig { key: String, value: String },
}

impl AdviceError {
    pub fn invalid_config(key: impl Into<String>, value: impl Into<String>) -> Self {
        AdviceError::InvalidConfig {
            key: key.into(),
            value: value.into(),
        }
    }
}
