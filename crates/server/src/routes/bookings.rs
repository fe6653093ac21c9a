use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use models::booking::Booking;
use service::auth::SessionUser;
use service::booking_service::{BookingPatch, BookingQuery, NewBooking};
use tracing::info;

use crate::errors::JsonApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::routes::auth::ServerState;

#[utoipa::path(
    get, path = "/api/admin/booking", tag = "bookings",
    params(
        ("status" = Option<String>, Query, description = "pending | approved | in-progress | completed | rejected"),
        ("assignedTo" = Option<String>, Query, description = "Team member id"),
        ("userId" = Option<String>, Query, description = "Owner id (admin only)")
    ),
    responses((status = 200, description = "Bookings visible to the caller"), (status = 401, description = "Unauthorized"))
)]
pub async fn list(
    State(state): State<ServerState>,
    Extension(actor): Extension<SessionUser>,
    ApiQuery(q): ApiQuery<BookingQuery>,
) -> Result<Json<Vec<Booking>>, JsonApiError> {
    let items = state.services.bookings.list(&actor, &q).await?;
    info!(count = items.len(), role = %actor.role, "list bookings");
    Ok(Json(items))
}

#[utoipa::path(
    post, path = "/api/admin/booking", tag = "bookings",
    request_body = crate::openapi::NewBookingDoc,
    responses(
        (status = 201, description = "Created"),
        (status = 400, description = "Missing required fields"),
        (status = 403, description = "Forbidden")
    )
)]
pub async fn create(
    State(state): State<ServerState>,
    Extension(actor): Extension<SessionUser>,
    ApiJson(input): ApiJson<NewBooking>,
) -> Result<(StatusCode, Json<Booking>), JsonApiError> {
    let booking = state.services.bookings.create(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

#[utoipa::path(
    get, path = "/api/admin/booking/{id}", tag = "bookings",
    params(("id" = String, Path, description = "Booking id")),
    responses((status = 200, description = "OK"), (status = 403, description = "Forbidden"), (status = 404, description = "Not Found"))
)]
pub async fn get(
    State(state): State<ServerState>,
    Extension(actor): Extension<SessionUser>,
    Path(id): Path<String>,
) -> Result<Json<Booking>, JsonApiError> {
    Ok(Json(state.services.bookings.get(&actor, &id).await?))
}

#[utoipa::path(
    patch, path = "/api/admin/booking/{id}", tag = "bookings",
    params(("id" = String, Path, description = "Booking id")),
    request_body = crate::openapi::BookingPatchDoc,
    responses(
        (status = 200, description = "Updated"),
        (status = 400, description = "Invalid amounts or team"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Illegal transition or stale version")
    )
)]
pub async fn update(
    State(state): State<ServerState>,
    Extension(actor): Extension<SessionUser>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<BookingPatch>,
) -> Result<Json<Booking>, JsonApiError> {
    Ok(Json(state.services.bookings.patch(&actor, &id, patch).await?))
}

#[utoipa::path(
    delete, path = "/api/admin/booking/{id}", tag = "bookings",
    params(("id" = String, Path, description = "Booking id")),
    responses((status = 204, description = "Deleted"), (status = 403, description = "Forbidden"), (status = 404, description = "Not Found"))
)]
pub async fn delete(
    State(state): State<ServerState>,
    Extension(actor): Extension<SessionUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, JsonApiError> {
    state.services.bookings.delete(&actor, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
