//! Login, logout and self-registration

use api_types::auth::{Login, LoginResponse, Register, Success};
use axum::{Json, extract::State, http::StatusCode};
use axum_extra::{
    TypedHeader,
    extract::cookie::{Cookie, CookieJar, SameSite},
    headers::{Authorization, authorization::Bearer},
};

use crate::{
    ServerError,
    convert::profile_view,
    server::{SESSION_COOKIE, ServerState, presented_token},
};

/// Handle login requests. The token is returned in the body and as cookie.
pub async fn login(
    State(state): State<ServerState>,
    jar: CookieJar,
    Json(payload): Json<Login>,
) -> Result<(CookieJar, Json<LoginResponse>), ServerError> {
    let (token, profile) = state.engine.login(&payload.email, &payload.password).await?;
    tracing::info!(profile = %profile.id, "login");

    let cookie = Cookie::build((SESSION_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            token,
            profile: profile_view(profile),
        }),
    ))
}

/// Revoke the presented token, if any, and clear the cookie.
pub async fn logout(
    State(state): State<ServerState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<Success>), ServerError> {
    if let Some(token) = presented_token(bearer.as_ref(), &jar) {
        state.engine.logout(&token).await?;
    }
    Ok((
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        Json(Success { success: true }),
    ))
}

/// Handle self-registration of recyclers
pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<Register>,
) -> Result<(StatusCode, Json<api_types::profile::ProfileView>), ServerError> {
    let profile = state
        .engine
        .register_recycler(
            &payload.email,
            &payload.password,
            payload.full_name.as_deref(),
        )
        .await?;
    tracing::info!(profile = %profile.id, "recycler registered");

    Ok((StatusCode::CREATED, Json(profile_view(profile))))
}
