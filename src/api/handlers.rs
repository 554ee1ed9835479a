use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::approval::{ApprovalOutcome, CompletionRequest, PendingApproval};
use crate::AppState;

// ── Response DTOs ────────────────────────────────────────────

#[derive(Serialize)]
pub struct PendingList {
    pub pending: Vec<Uuid>,
}

#[derive(Serialize)]
pub struct CompletionAck {
    pub ok: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UiConfig {
    pub from_address: Option<String>,
}

// Ids arrive from a URL the operator may have mangled; a malformed one cannot exist.
fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw).ok()
}

// ── Handlers ─────────────────────────────────────────────────

/// GET /api/pending/:id: details for the approval screen
pub async fn get_pending(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PendingApproval>, AppError> {
    let id = parse_id(&id).ok_or(AppError::PendingNotFound)?;
    state
        .store
        .get(&id)
        .map(Json)
        .ok_or(AppError::PendingNotFound)
}

/// POST /api/complete/:id: report the wallet's outcome
pub async fn complete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<CompletionRequest>, JsonRejection>,
) -> Result<Json<CompletionAck>, AppError> {
    let Json(payload) = payload.map_err(|e| AppError::InvalidCompletion(e.body_text()))?;
    let id = parse_id(&id).ok_or(AppError::CompletionNotFound)?;
    let outcome = payload
        .into_outcome()
        .map_err(AppError::InvalidCompletion)?;

    let kind = match &outcome {
        ApprovalOutcome::Success(_) => "success",
        ApprovalOutcome::Failure(_) => "failure",
    };

    state.store.resolve(&id, outcome).map_err(|e| {
        tracing::warn!(%id, error = %e, "completion refused");
        AppError::from(e)
    })?;

    tracing::info!(%id, outcome = kind, "completion received");
    Ok(Json(CompletionAck { ok: true }))
}

/// GET /api/pending: tracked ids, oldest first
pub async fn list_pending(State(state): State<Arc<AppState>>) -> Json<PendingList> {
    Json(PendingList {
        pending: state.store.list_ids(),
    })
}

/// GET /api/config: settings the UI needs before connecting a wallet
pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<UiConfig> {
    Json(UiConfig {
        from_address: state.config.from_address.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id_accepts_hyphenated_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string()), Some(id));
    }

    #[test]
    fn test_parse_id_rejects_garbage() {
        assert_eq!(parse_id("not-an-id"), None);
        assert_eq!(parse_id(""), None);
    }
}
