use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};

use crate::auth::RequirePlatformAdmin;
use crate::server::AppState;
use crate::server::dto::{DiagnosticsResponse, TableCount};
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::store::{LifecycleStore, TenantStore};

pub async fn get_diagnostics(
    _admin: RequirePlatformAdmin,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let table_counts = state
        .store
        .table_counts()
        .api_err("Failed to count rows")?
        .into_iter()
        .map(|(table, rows)| TableCount { table, rows })
        .collect();
    let pending_tasks = state
        .store
        .count_pending_tasks()
        .api_err("Failed to count tasks")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(DiagnosticsResponse {
        version: env!("CARGO_PKG_VERSION"),
        table_counts,
        pending_tasks,
        billing_configured: state.billing.is_some(),
    })))
}
