//! Audit trail handler

use axum::{extract::State, Json};
use nc_audit::{AuditEvent, AuditFilter};

use crate::error::ApiResult;
use crate::extractors::{ApiQuery, AppState, AuthenticatedUser};

/// GET /api/v1/audit-events
pub async fn list(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ApiQuery(filter): ApiQuery<AuditFilter>,
) -> ApiResult<Json<Vec<AuditEvent>>> {
    Ok(Json(state.services.audit.list(&user, &filter).await?))
}
