use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// An intercepted call waiting for a human decision in the browser.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingApproval {
    pub id: Uuid,
    pub method: String,
    pub params: Value,
    pub status: ApprovalStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<ApprovalOutcome>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Awaiting,
    Resolved,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum ApprovalOutcome {
    /// Transaction hash or signature produced by the wallet.
    Success(String),
    /// Reason the operator (or wallet) gave for declining.
    Failure(String),
}

/// Body of `POST /api/complete/:id`.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionRequest {
    pub success: bool,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

pub const DEFAULT_REJECTION_MESSAGE: &str = "User rejected the request";

impl CompletionRequest {
    /// A successful completion must carry the wallet's result.
    pub fn into_outcome(self) -> Result<ApprovalOutcome, String> {
        if self.success {
            self.result
                .map(ApprovalOutcome::Success)
                .ok_or_else(|| "result is required when success is true".to_string())
        } else {
            Ok(ApprovalOutcome::Failure(
                self.error
                    .filter(|e| !e.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_REJECTION_MESSAGE.to_string()),
            ))
        }
    }
}
