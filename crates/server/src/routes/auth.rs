use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Extension, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use models::user::Role;
use serde::{Deserialize, Serialize};
use service::auth::session::SESSION_COOKIE;
use service::auth::{AuthService, SessionUser};
use service::Services;
use tracing::{info, warn};

use crate::errors::JsonApiError;
use crate::extract::ApiQuery;

/// Cookie holding the OAuth `state` between sign-in and callback.
pub const STATE_COOKIE: &str = "oauth_state";

#[derive(Clone)]
pub struct ServerState {
    pub services: Services,
    pub auth: Arc<AuthService>,
    pub cookie_secure: bool,
}

impl ServerState {
    pub fn new(services: Services, auth: Arc<AuthService>, cookie_secure: bool) -> Self {
        Self { services, auth, cookie_secure }
    }

    fn cookie(&self, name: &'static str, value: String) -> Cookie<'static> {
        let mut cookie = Cookie::new(name, value);
        cookie.set_path("/");
        cookie.set_http_only(true);
        cookie.set_secure(self.cookie_secure);
        cookie.set_same_site(SameSite::Lax);
        cookie
    }
}

/// `302 Found` with a `Location` header.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Session token from `Authorization: Bearer`, falling back to the session cookie.
/// Any other `Authorization` scheme is ignored.
pub fn session_token(headers: &HeaderMap, jar: &CookieJar) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .or_else(|| jar.get(SESSION_COOKIE).map(|c| c.value().to_string()).filter(|t| !t.is_empty()))
}

/// Resolve the caller, or `None` when there is no valid session.
pub async fn current_user(state: &ServerState, headers: &HeaderMap, jar: &CookieJar) -> Option<SessionUser> {
    let token = session_token(headers, jar)?;
    state.auth.resolve(&token).await.ok()
}

/// 受保护路由中间件：解析会话并写入请求扩展，缺失或无效返回 401
pub async fn require_session(
    State(state): State<ServerState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, JsonApiError> {
    let path = req.uri().path().to_string();
    let Some(token) = session_token(req.headers(), &jar) else {
        warn!(%path, "missing Authorization header and session cookie");
        return Err(JsonApiError::unauthorized());
    };
    match state.auth.resolve(&token).await {
        Ok(user) => {
            req.extensions_mut().insert(user);
            Ok(next.run(req).await)
        }
        Err(e) => {
            warn!(%path, code = e.code(), "session rejected");
            Err(e.into())
        }
    }
}

#[utoipa::path(get, path = "/auth/signin", tag = "auth", responses((status = 302, description = "Redirect to identity provider")))]
pub async fn signin(State(state): State<ServerState>, jar: CookieJar) -> Result<(CookieJar, Response), JsonApiError> {
    let (oauth_state, url) = state.auth.begin_sign_in()?;
    let jar = jar.add(state.cookie(STATE_COOKIE, oauth_state));
    Ok((jar, found(&url)))
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[utoipa::path(
    get, path = "/auth/callback", tag = "auth",
    params(CallbackQuery),
    responses(
        (status = 302, description = "Signed in, redirect to /dashboard"),
        (status = 400, description = "Missing code or state mismatch")
    )
)]
pub async fn callback(
    State(state): State<ServerState>,
    jar: CookieJar,
    ApiQuery(q): ApiQuery<CallbackQuery>,
) -> Result<(CookieJar, Response), JsonApiError> {
    if let Some(err) = q.error {
        warn!(error = %err, "identity provider returned an error");
        return Err(JsonApiError::bad_request(format!("Sign-in was cancelled: {err}")));
    }
    let code = q.code.filter(|c| !c.is_empty()).ok_or_else(|| JsonApiError::bad_request("Missing code"))?;
    let expected = jar.get(STATE_COOKIE).map(|c| c.value().to_string());
    let session = state
        .auth
        .complete_sign_in(&code, q.state.as_deref().unwrap_or_default(), expected.as_deref())
        .await?;

    let jar = jar
        .remove(Cookie::build(STATE_COOKIE).path("/"))
        .add(state.cookie(SESSION_COOKIE, session.token));
    Ok((jar, found("/dashboard")))
}

#[utoipa::path(post, path = "/auth/signout", tag = "auth", responses((status = 204, description = "Signed out")))]
pub async fn signout(jar: CookieJar) -> (CookieJar, StatusCode) {
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SessionOutput {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
    #[schema(value_type = String)]
    pub role: Role,
}

#[utoipa::path(
    get, path = "/auth/session", tag = "auth",
    responses((status = 200, body = SessionOutput), (status = 401, description = "Not signed in"))
)]
pub async fn session(
    State(state): State<ServerState>,
    Extension(actor): Extension<SessionUser>,
) -> Result<Json<SessionOutput>, JsonApiError> {
    let user = state.services.users.find(&actor.id).await?.ok_or_else(JsonApiError::unauthorized)?;
    info!(user_id = %user.id, "session_lookup");
    Ok(Json(SessionOutput { id: user.id, email: user.email, name: user.name, image: user.image, role: user.role }))
}
