//! Audit log handlers

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::{AppError, AppState, CurrentUser, MAX_PAGE_LIMIT};
use budgetwise_core::AuditEntry;

/// Query parameters for audit log
#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    #[serde(default = "default_audit_limit")]
    pub limit: i64,
}

fn default_audit_limit() -> i64 {
    100
}

/// GET /api/audit - List audit log entries, newest first
pub async fn list_audit_log(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<AuditQuery>,
) -> Result<Json<Vec<AuditEntry>>, AppError> {
    let limit = params.limit.clamp(1, MAX_PAGE_LIMIT);

    let entries = state.db.list_audit_log(limit)?;

    // Viewing the audit log is itself audited
    state.db.log_audit(
        &user,
        "list",
        Some("audit_log"),
        None,
        Some(&format!("limit={}", limit)),
    )?;

    Ok(Json(entries))
}
