use axum::{extract::State, http::HeaderMap, response::Response};
use axum_extra::extract::cookie::CookieJar;
use models::user::Role;

use crate::routes::auth::{current_user, found, ServerState};

/// Dashboard path for a role.
pub fn dashboard_path(role: Role) -> &'static str {
    match role {
        Role::Admin => "/dashboard/admin",
        Role::Customer => "/dashboard/customer",
        Role::Team => "/dashboard/team",
    }
}

/// 按角色跳转到对应面板；未登录跳转到登录
#[utoipa::path(get, path = "/dashboard", tag = "auth", responses((status = 302, description = "Redirect by role")))]
pub async fn dashboard(State(state): State<ServerState>, headers: HeaderMap, jar: CookieJar) -> Response {
    match current_user(&state, &headers, &jar).await {
        Some(user) => found(dashboard_path(user.role)),
        None => found("/auth/signin"),
    }
}
