use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use models::contact::{ContactInput, ContactMessage};
use serde::{Deserialize, Serialize};
use service::auth::SessionUser;

use crate::errors::JsonApiError;
use crate::extract::ApiJson;
use crate::routes::auth::ServerState;

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ContactAck {
    pub id: String,
    pub success: bool,
}

#[derive(Debug, Deserialize)]
pub struct ReadUpdate {
    pub read: bool,
}

#[utoipa::path(
    post, path = "/api/contact", tag = "catalog",
    request_body = crate::openapi::ContactInputDoc,
    responses((status = 201, body = ContactAck), (status = 400, description = "Validation Error"))
)]
pub async fn submit(
    State(state): State<ServerState>,
    ApiJson(input): ApiJson<ContactInput>,
) -> Result<(StatusCode, Json<ContactAck>), JsonApiError> {
    let msg = state.services.contacts.submit(input).await?;
    Ok((StatusCode::CREATED, Json(ContactAck { id: msg.id, success: true })))
}

#[utoipa::path(get, path = "/api/admin/contact", tag = "admin", responses((status = 200, description = "OK"), (status = 403, description = "Forbidden")))]
pub async fn list(
    State(state): State<ServerState>,
    Extension(actor): Extension<SessionUser>,
) -> Result<Json<Vec<ContactMessage>>, JsonApiError> {
    Ok(Json(state.services.contacts.list(&actor).await?))
}

#[utoipa::path(
    get, path = "/api/admin/contact/{id}", tag = "admin",
    params(("id" = String, Path, description = "Message id")),
    responses((status = 200, description = "OK"), (status = 404, description = "Not Found"))
)]
pub async fn get(
    State(state): State<ServerState>,
    Extension(actor): Extension<SessionUser>,
    Path(id): Path<String>,
) -> Result<Json<ContactMessage>, JsonApiError> {
    Ok(Json(state.services.contacts.get(&actor, &id).await?))
}

#[utoipa::path(
    patch, path = "/api/admin/contact/{id}", tag = "admin",
    params(("id" = String, Path, description = "Message id")),
    request_body = crate::openapi::ReadUpdateDoc,
    responses((status = 200, description = "Updated"), (status = 404, description = "Not Found"))
)]
pub async fn mark_read(
    State(state): State<ServerState>,
    Extension(actor): Extension<SessionUser>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<ReadUpdate>,
) -> Result<Json<ContactMessage>, JsonApiError> {
    Ok(Json(state.services.contacts.set_read(&actor, &id, input.read).await?))
}

#[utoipa::path(
    delete, path = "/api/admin/contact/{id}", tag = "admin",
    params(("id" = String, Path, description = "Message id")),
    responses((status = 204, description = "Deleted"), (status = 404, description = "Not Found"))
)]
pub async fn delete(
    State(state): State<ServerState>,
    Extension(actor): Extension<SessionUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, JsonApiError> {
    state.services.contacts.delete(&actor, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
