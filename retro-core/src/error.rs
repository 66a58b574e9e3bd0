use thiserror::Error;

use crate::llm::LlmError;

#[derive(Error, Debug)]
pub enum RetroError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("IPC error: {0}")]
    Ipc(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl RetroError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }
}

/// Accept a signed count from an outer surface and require it to be positive.
pub fn positive_count(name: &str, value: i64) -> Result<usize, RetroError> {
    if value <= 0 {
        return Err(RetroError::invalid(format!(
            "{} must be a positive integer, got {}",
            name, value
        )));
    }
    usize::try_from(value)
        .map_err(|_| RetroError::invalid(format!("{} is out of range: {}", name, value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_count_accepts_positive() {
        assert_eq!(positive_count("max_alerts_per_summary", 10).unwrap(), 10);
    }

    #[test]
    fn test_positive_count_rejects_zero_and_negative() {
        for value in [0, -1, -100] {
            let err = positive_count("max_alerts_per_summary", value).unwrap_err();
            assert!(err.is_invalid_argument());
            assert!(err.to_string().contains("max_alerts_per_summary"));
        }
    }
}
