use axum::{
    middleware,
    routing::{delete, get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;

use crate::openapi::ApiDoc;

pub mod auth;
pub mod bookings;
pub mod contact;
pub mod dashboard;
pub mod gallery;
pub mod packages;
pub mod stats;
pub mod users;

use auth::ServerState;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the full application router: public catalog, auth flow and the
/// session-protected `/api/admin/*` API.
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    // Public routes
    let public = Router::new()
        .route("/health", get(health))
        .route("/auth/signin", get(auth::signin))
        .route("/auth/callback", get(auth::callback))
        .route("/auth/signout", post(auth::signout))
        .route("/dashboard", get(dashboard::dashboard))
        .route("/api/packages", get(packages::public_list))
        .route("/api/packages/:id", get(packages::public_get))
        .route("/api/gallery", get(gallery::public_list))
        .route("/api/contact", post(contact::submit));

    // Session-protected routes; role checks happen in the service layer
    let protected = Router::new()
        .route("/auth/session", get(auth::session))
        .route("/api/admin/booking", get(bookings::list).post(bookings::create))
        .route(
            "/api/admin/booking/:id",
            get(bookings::get).patch(bookings::update).delete(bookings::delete),
        )
        .route("/api/admin/package", get(packages::list).post(packages::create))
        .route(
            "/api/admin/package/:id",
            get(packages::get).patch(packages::update).delete(packages::delete),
        )
        .route("/api/admin/gallery", get(gallery::list).post(gallery::create))
        .route("/api/admin/gallery/:id", delete(gallery::delete))
        .route("/api/admin/user", get(users::list))
        .route(
            "/api/admin/user/:id",
            get(users::get).patch(users::update_profile).delete(users::delete),
        )
        .route("/api/admin/user/:id/role", axum::routing::patch(users::update_role))
        .route("/api/admin/contact", get(contact::list))
        .route(
            "/api/admin/contact/:id",
            get(contact::get).patch(contact::mark_read).delete(contact::delete),
        )
        .route("/api/admin/stats", get(stats::summary))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_session));

    public
        .merge(protected)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // 每次请求创建 span，包含方法和路径等，日志级别为 INFO
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                // 响应返回时打点，包含状态码与耗时
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                // 失败（5xx 等）时以 ERROR 记录
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
