use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use models::package::{Package, PackageInput, PackagePatch};
use serde::Deserialize;
use service::auth::SessionUser;
use service::authz::{self, Action, Resource};
use tracing::info;

use crate::errors::JsonApiError;
use crate::extract::ApiJson;
use crate::routes::auth::ServerState;

/// Package patch plus the version the client last read.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageUpdate {
    #[serde(flatten)]
    pub patch: PackagePatch,
    pub version: Option<u64>,
}

#[utoipa::path(get, path = "/api/packages", tag = "catalog", responses((status = 200, description = "Package catalog")))]
pub async fn public_list(State(state): State<ServerState>) -> Result<Json<Vec<Package>>, JsonApiError> {
    Ok(Json(state.services.packages.list().await?))
}

#[utoipa::path(
    get, path = "/api/packages/{id}", tag = "catalog",
    params(("id" = String, Path, description = "Package id")),
    responses((status = 200, description = "OK"), (status = 404, description = "Not Found"))
)]
pub async fn public_get(State(state): State<ServerState>, Path(id): Path<String>) -> Result<Json<Package>, JsonApiError> {
    Ok(Json(state.services.packages.get(&id).await?))
}

#[utoipa::path(get, path = "/api/admin/package", tag = "admin", responses((status = 200, description = "OK"), (status = 403, description = "Forbidden")))]
pub async fn list(
    State(state): State<ServerState>,
    Extension(actor): Extension<SessionUser>,
) -> Result<Json<Vec<Package>>, JsonApiError> {
    authz::authorize(actor.role, Resource::Package, Action::List)?;
    Ok(Json(state.services.packages.list().await?))
}

#[utoipa::path(
    post, path = "/api/admin/package", tag = "admin",
    request_body = crate::openapi::PackageInputDoc,
    responses((status = 201, description = "Created"), (status = 400, description = "Validation Error"), (status = 403, description = "Forbidden"))
)]
pub async fn create(
    State(state): State<ServerState>,
    Extension(actor): Extension<SessionUser>,
    ApiJson(input): ApiJson<PackageInput>,
) -> Result<(StatusCode, Json<Package>), JsonApiError> {
    let created = state.services.packages.create(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get, path = "/api/admin/package/{id}", tag = "admin",
    params(("id" = String, Path, description = "Package id")),
    responses((status = 200, description = "OK"), (status = 404, description = "Not Found"))
)]
pub async fn get(
    State(state): State<ServerState>,
    Extension(actor): Extension<SessionUser>,
    Path(id): Path<String>,
) -> Result<Json<Package>, JsonApiError> {
    authz::authorize(actor.role, Resource::Package, Action::Read)?;
    Ok(Json(state.services.packages.get(&id).await?))
}

#[utoipa::path(
    patch, path = "/api/admin/package/{id}", tag = "admin",
    params(("id" = String, Path, description = "Package id")),
    request_body = crate::openapi::PackagePatchDoc,
    responses(
        (status = 200, description = "Updated"),
        (status = 400, description = "Validation Error"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Version conflict")
    )
)]
pub async fn update(
    State(state): State<ServerState>,
    Extension(actor): Extension<SessionUser>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<PackageUpdate>,
) -> Result<Json<Package>, JsonApiError> {
    let updated = state.services.packages.update(&actor, &id, input.patch, input.version).await?;
    Ok(Json(updated))
}

#[utoipa::path(
    delete, path = "/api/admin/package/{id}", tag = "admin",
    params(("id" = String, Path, description = "Package id")),
    responses((status = 204, description = "Deleted"), (status = 404, description = "Not Found"))
)]
pub async fn delete(
    State(state): State<ServerState>,
    Extension(actor): Extension<SessionUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, JsonApiError> {
    state.services.packages.delete(&actor, &id).await?;
    info!(package_id = %id, actor = %actor.id, "package_delete_request");
    Ok(StatusCode::NO_CONTENT)
}
