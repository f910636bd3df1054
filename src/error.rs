use thiserror::Error;

/// Terms that mark a remote error as a likely content-policy rejection.
const CONTENT_POLICY_TERMS: &[&str] = &[
    "content",
    "policy",
    "violation",
    "inappropriate",
    "safety",
    "violence",
    "prohibited",
];

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Timeout reached while {phase} ({seconds} seconds)")]
    Timeout { phase: &'static str, seconds: u64 },

    /// The remote job failed or stopped in a status other than `succeeded`.
    #[error("{0}")]
    RemoteJob(String),

    #[error("{0}")]
    EmptyOutput(String),

    #[error("Failed to fetch image from {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// Either the remote job was canceled or the caller requested cancellation.
    #[error("{0}")]
    Canceled(String),

    #[error("Replicate API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to decode image: {0}")]
    Decode(image::ImageError),

    #[error("Failed to encode image: {0}")]
    Encode(image::ImageError),

    #[error("Image batch error: {0}")]
    Batch(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse classification of a [`GenerationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Timeout,
    RemoteJob,
    EmptyOutput,
    Fetch,
    Cancellation,
    Transport,
    Image,
    Config,
}

impl GenerationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GenerationError::Validation(_) => ErrorKind::Validation,
            GenerationError::Timeout { .. } => ErrorKind::Timeout,
            GenerationError::RemoteJob(_) => ErrorKind::RemoteJob,
            GenerationError::EmptyOutput(_) => ErrorKind::EmptyOutput,
            GenerationError::Fetch { .. } => ErrorKind::Fetch,
            GenerationError::Canceled(_) => ErrorKind::Cancellation,
            GenerationError::Api { .. }
            | GenerationError::Request(_)
            | GenerationError::Serialization(_) => ErrorKind::Transport,
            GenerationError::Decode(_)
            | GenerationError::Encode(_)
            | GenerationError::Batch(_) => ErrorKind::Image,
            GenerationError::Config(_) => ErrorKind::Config,
        }
    }

    /// Heuristic: does the message look like a content-policy rejection?
    pub fn is_content_policy(&self) -> bool {
        let message = self.to_string().to_lowercase();
        CONTENT_POLICY_TERMS
            .iter()
            .any(|term| message.contains(term))
    }
}

pub type Result<T> = std::result::Result<T, GenerationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            GenerationError::Validation("Prompt is required".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            GenerationError::Canceled("Prediction was canceled".into()).kind(),
            ErrorKind::Cancellation
        );
        assert_eq!(
            GenerationError::Api {
                status: 401,
                body: "unauthorized".into()
            }
            .kind(),
            ErrorKind::Transport
        );
    }

    #[test]
    fn test_timeout_message() {
        let err = GenerationError::Timeout {
            phase: "waiting for prediction to start",
            seconds: 600,
        };
        assert_eq!(
            err.to_string(),
            "Timeout reached while waiting for prediction to start (600 seconds)"
        );
    }

    #[test]
    fn test_content_policy_heuristic() {
        let flagged = GenerationError::RemoteJob(
            "Prediction failed: input flagged by Safety checker".into(),
        );
        assert!(flagged.is_content_policy());

        let plain = GenerationError::RemoteJob("Prediction failed: CUDA out of memory".into());
        assert!(!plain.is_content_policy());
    }
}
