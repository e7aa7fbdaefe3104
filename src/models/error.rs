use serde::{Deserialize, Serialize};

/// Error body shared by every endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// True for upstream RPC failures the UI may retry
    #[serde(default)]
    pub retryable: bool,
}
