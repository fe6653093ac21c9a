use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use models::user::{ProfilePatch, Role, User};
use serde::Deserialize;
use service::auth::SessionUser;

use crate::errors::JsonApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::routes::auth::ServerState;

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(flatten)]
    pub patch: ProfilePatch,
    pub version: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct RoleUpdate {
    pub role: Role,
}

#[utoipa::path(
    get, path = "/api/admin/user", tag = "users",
    params(("role" = Option<String>, Query, description = "admin | customer | team")),
    responses((status = 200, description = "OK"), (status = 403, description = "Forbidden"))
)]
pub async fn list(
    State(state): State<ServerState>,
    Extension(actor): Extension<SessionUser>,
    ApiQuery(q): ApiQuery<UserListQuery>,
) -> Result<Json<Vec<User>>, JsonApiError> {
    Ok(Json(state.services.users.list(&actor, q.role).await?))
}

#[utoipa::path(
    get, path = "/api/admin/user/{id}", tag = "users",
    params(("id" = String, Path, description = "User id")),
    responses((status = 200, description = "OK"), (status = 403, description = "Forbidden"), (status = 404, description = "Not Found"))
)]
pub async fn get(
    State(state): State<ServerState>,
    Extension(actor): Extension<SessionUser>,
    Path(id): Path<String>,
) -> Result<Json<User>, JsonApiError> {
    Ok(Json(state.services.users.get(&actor, &id).await?))
}

#[utoipa::path(
    patch, path = "/api/admin/user/{id}", tag = "users",
    params(("id" = String, Path, description = "User id")),
    request_body = crate::openapi::ProfilePatchDoc,
    responses(
        (status = 200, description = "Updated"),
        (status = 400, description = "Profile does not match role"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Version conflict")
    )
)]
pub async fn update_profile(
    State(state): State<ServerState>,
    Extension(actor): Extension<SessionUser>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<ProfileUpdate>,
) -> Result<Json<User>, JsonApiError> {
    Ok(Json(state.services.users.update_profile(&actor, &id, input.patch, input.version).await?))
}

#[utoipa::path(
    patch, path = "/api/admin/user/{id}/role", tag = "users",
    params(("id" = String, Path, description = "User id")),
    request_body = crate::openapi::RoleUpdateDoc,
    responses(
        (status = 200, description = "Role changed"),
        (status = 400, description = "Self change, admin target or admin promotion"),
        (status = 403, description = "Forbidden")
    )
)]
pub async fn update_role(
    State(state): State<ServerState>,
    Extension(actor): Extension<SessionUser>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<RoleUpdate>,
) -> Result<Json<User>, JsonApiError> {
    Ok(Json(state.services.change_role(&actor, &id, input.role).await?))
}

#[utoipa::path(
    delete, path = "/api/admin/user/{id}", tag = "users",
    params(("id" = String, Path, description = "User id")),
    responses((status = 204, description = "Deleted"), (status = 400, description = "Admin accounts cannot be deleted"), (status = 403, description = "Forbidden"))
)]
pub async fn delete(
    State(state): State<ServerState>,
    Extension(actor): Extension<SessionUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, JsonApiError> {
    state.services.delete_user(&actor, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
