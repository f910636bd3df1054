use crate::error::{GenerationError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
    #[serde(other)]
    Unknown,
}

impl PredictionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionStatus::Starting => "starting",
            PredictionStatus::Processing => "processing",
            PredictionStatus::Succeeded => "succeeded",
            PredictionStatus::Failed => "failed",
            PredictionStatus::Canceled => "canceled",
            PredictionStatus::Unknown => "unknown",
        }
    }

    /// Still queued or running on the remote side.
    pub fn is_pending(&self) -> bool {
        matches!(self, PredictionStatus::Starting | PredictionStatus::Processing)
    }
}

impl fmt::Display for PredictionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remote prediction as returned by create and refresh calls.
#[derive(Debug, Clone, Deserialize)]
pub struct Prediction {
    pub id: String,
    pub status: PredictionStatus,
    #[serde(default)]
    pub output: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
}

impl Prediction {
    /// Remote error text, if the service reported one.
    pub fn error_message(&self) -> Option<String> {
        match &self.error {
            None | Some(Value::Null) => None,
            Some(Value::String(message)) => Some(message.clone()),
            Some(other) => Some(other.to_string()),
        }
    }

    /// Normalize `output` into a flat list: `null` is empty, a single item
    /// becomes a one-element list, arrays keep their order.
    pub fn output_items(&self) -> Result<Vec<OutputItem>> {
        match &self.output {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| serde_json::from_value(item.clone()).map_err(GenerationError::from))
                .collect(),
            Some(single) => Ok(vec![serde_json::from_value(single.clone())?]),
        }
    }
}

/// One entry of a prediction's output: a bare URL or a file object with a `url`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OutputItem {
    Url(String),
    File { url: String },
}

impl OutputItem {
    pub fn url(&self) -> &str {
        match self {
            OutputItem::Url(url) => url,
            OutputItem::File { url } => url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn prediction(value: Value) -> Prediction {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_status_parsing() {
        let p = prediction(json!({"id": "abc", "status": "processing"}));
        assert_eq!(p.status, PredictionStatus::Processing);
        assert!(p.status.is_pending());

        let p = prediction(json!({"id": "abc", "status": "aborted"}));
        assert_eq!(p.status, PredictionStatus::Unknown);
        assert!(!p.status.is_pending());
    }

    #[test]
    fn test_output_items_mixed_shapes() {
        let p = prediction(json!({
            "id": "abc",
            "status": "succeeded",
            "output": ["https://x/a.png", {"url": "https://x/b.png"}]
        }));
        let urls: Vec<String> = p
            .output_items()
            .unwrap()
            .iter()
            .map(|item| item.url().to_string())
            .collect();
        assert_eq!(urls, vec!["https://x/a.png", "https://x/b.png"]);
    }

    #[test]
    fn test_output_items_single_and_null() {
        let single = prediction(json!({
            "id": "abc", "status": "succeeded", "output": "https://x/only.png"
        }));
        assert_eq!(
            single.output_items().unwrap(),
            vec![OutputItem::Url("https://x/only.png".into())]
        );

        let empty = prediction(json!({"id": "abc", "status": "succeeded", "output": null}));
        assert!(empty.output_items().unwrap().is_empty());
    }

    #[test]
    fn test_error_message() {
        let p = prediction(json!({"id": "abc", "status": "failed", "error": "NSFW content"}));
        assert_eq!(p.error_message().as_deref(), Some("NSFW content"));

        let p = prediction(json!({"id": "abc", "status": "failed", "error": null}));
        assert_eq!(p.error_message(), None);
    }
}
