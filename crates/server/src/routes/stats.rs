use axum::{extract::State, Extension, Json};
use service::auth::SessionUser;
use service::stats::DashboardStats;

use crate::errors::JsonApiError;
use crate::routes::auth::ServerState;

#[utoipa::path(
    get, path = "/api/admin/stats", tag = "admin",
    responses((status = 200, body = crate::openapi::DashboardStatsDoc), (status = 403, description = "Forbidden"))
)]
pub async fn summary(
    State(state): State<ServerState>,
    Extension(actor): Extension<SessionUser>,
) -> Result<Json<DashboardStats>, JsonApiError> {
    Ok(Json(state.services.stats.summary(&actor).await?))
}
