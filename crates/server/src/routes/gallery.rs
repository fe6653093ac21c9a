use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use models::gallery::{GalleryInput, GalleryItem};
use service::auth::SessionUser;
use service::authz::{self, Action, Resource};
use service::gallery_service::GalleryQuery;

use crate::errors::JsonApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::routes::auth::ServerState;

#[utoipa::path(
    get, path = "/api/gallery", tag = "catalog",
    params(
        ("type" = Option<String>, Query, description = "photo | video"),
        ("category" = Option<String>, Query, description = "Category"),
        ("eventType" = Option<String>, Query, description = "Event type")
    ),
    responses((status = 200, description = "Gallery items"))
)]
pub async fn public_list(
    State(state): State<ServerState>,
    ApiQuery(q): ApiQuery<GalleryQuery>,
) -> Result<Json<Vec<GalleryItem>>, JsonApiError> {
    Ok(Json(state.services.gallery.list(&q).await?))
}

#[utoipa::path(get, path = "/api/admin/gallery", tag = "admin", responses((status = 200, description = "OK")))]
pub async fn list(
    State(state): State<ServerState>,
    Extension(actor): Extension<SessionUser>,
    ApiQuery(q): ApiQuery<GalleryQuery>,
) -> Result<Json<Vec<GalleryItem>>, JsonApiError> {
    authz::authorize(actor.role, Resource::Gallery, Action::List)?;
    Ok(Json(state.services.gallery.list(&q).await?))
}

#[utoipa::path(
    post, path = "/api/admin/gallery", tag = "admin",
    request_body = crate::openapi::GalleryInputDoc,
    responses((status = 201, description = "Created"), (status = 400, description = "Validation Error"), (status = 403, description = "Forbidden"))
)]
pub async fn create(
    State(state): State<ServerState>,
    Extension(actor): Extension<SessionUser>,
    ApiJson(input): ApiJson<GalleryInput>,
) -> Result<(StatusCode, Json<GalleryItem>), JsonApiError> {
    let item = state.services.gallery.create(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

#[utoipa::path(
    delete, path = "/api/admin/gallery/{id}", tag = "admin",
    params(("id" = String, Path, description = "Gallery item id")),
    responses((status = 204, description = "Deleted"), (status = 404, description = "Not Found"))
)]
pub async fn delete(
    State(state): State<ServerState>,
    Extension(actor): Extension<SessionUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, JsonApiError> {
    state.services.gallery.delete(&actor, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
