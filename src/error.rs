use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShareError {
    #[error("Rate limit exceeded. Wait {wait_secs}s")]
    RateLimitExceeded { wait_secs: u64 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // underlying cause stays in the debug log
    #[error("Operation failed")]
    Collaborator(String),
}

impl ShareError {
    // only a rate limit goes away by itself
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ShareError::RateLimitExceeded { .. })
    }

    pub fn collaborator(context: &str, err: impl std::fmt::Display) -> Self {
        tracing::debug!("{}: {}", context, err);
        ShareError::Collaborator(format!("{}: {}", context, err))
    }
}

pub type Result<T> = std::result::Result<T, ShareError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_rate_limit_is_recoverable() {
        assert!(ShareError::RateLimitExceeded { wait_secs: 3 }.is_recoverable());
        assert!(!ShareError::InvalidInput("x".into()).is_recoverable());
        assert!(!ShareError::Collaborator("x".into()).is_recoverable());
    }

    #[test]
    fn collaborator_message_is_generic() {
        let err = ShareError::collaborator("presign_get", "403 AccessDenied");
        assert_eq!(err.to_string(), "Operation failed");
        match err {
            ShareError::Collaborator(cause) => assert!(cause.contains("AccessDenied")),
            _ => unreachable!(),
        }
    }
}
