use axum::{
    Extension, Json, Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, patch, post},
};
use axum_extra::{
    TypedHeader,
    extract::cookie::CookieJar,
    headers::{Authorization, Error as AxumError, Header, authorization::Bearer},
};

use std::{net::SocketAddr, sync::Arc};

use api_types::health::Health;
use engine::{Engine, EngineError, Profile, Role};

use crate::{ServerError, analytics, auth, items, me, staff, users, vouchers};

/// Name of the cookie carrying the session token.
pub(crate) const SESSION_COOKIE: &str = "session";

static DEV_USER_HEADER: axum::http::HeaderName = axum::http::HeaderName::from_static("x-user-id");

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    /// Accept `x-user-id` as identity. Development only.
    pub dev_user_header: bool,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    pub dev_user_header: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 3000,
            dev_user_header: false,
        }
    }
}

/// `TypedHeader` for the development identity header
///
/// Only honoured when [`ServerState::dev_user_header`] is set.
#[derive(Debug)]
struct DevUserHeader(String);

impl Header for DevUserHeader {
    fn name() -> &'static axum::http::HeaderName {
        &DEV_USER_HEADER
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, AxumError>
    where
        Self: Sized,
        I: Iterator<Item = &'i axum::http::HeaderValue>,
    {
        let value = values.next().ok_or_else(AxumError::invalid)?;
        let Ok(value) = value.to_str() else {
            return Err(AxumError::invalid());
        };
        let value = value.trim();
        if value.is_empty() {
            return Err(AxumError::invalid());
        }

        Ok(DevUserHeader(value.to_string()))
    }

    fn encode<E: Extend<axum::http::HeaderValue>>(&self, values: &mut E) {
        match axum::http::HeaderValue::from_str(&self.0) {
            Ok(value) => values.extend(std::iter::once(value)),
            Err(_) => tracing::error!("failed to encode x-user-id header"),
        }
    }
}

fn unauthorized() -> ServerError {
    ServerError::Engine(EngineError::Unauthorized(
        "missing or invalid credentials".to_string(),
    ))
}

/// Returns the token presented as `Authorization: Bearer` or, failing that,
/// as the session cookie.
pub(crate) fn presented_token(
    bearer: Option<&TypedHeader<Authorization<Bearer>>>,
    jar: &CookieJar,
) -> Option<String> {
    bearer
        .map(|header| header.token().to_string())
        .or_else(|| jar.get(SESSION_COOKIE).map(|cookie| cookie.value().to_string()))
        .filter(|token| !token.is_empty())
}

async fn authenticate(
    State(state): State<ServerState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    jar: CookieJar,
    dev_user: Option<TypedHeader<DevUserHeader>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let profile = if let Some(token) = presented_token(bearer.as_ref(), &jar) {
        state.engine.profile_for_token(&token).await?
    } else if let Some(TypedHeader(DevUserHeader(user_id))) =
        dev_user.filter(|_| state.dev_user_header)
    {
        state
            .engine
            .profile(&user_id)
            .await
            .map_err(|err| match err {
                EngineError::KeyNotFound(_) => unauthorized(),
                other => ServerError::Engine(other),
            })?
    } else {
        return Err(unauthorized());
    };

    request.extensions_mut().insert(profile);
    Ok(next.run(request).await)
}

async fn staff_only(
    Extension(profile): Extension<Profile>,
    request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    if !profile.role.can_record_sessions() {
        return Err(ServerError::Engine(EngineError::Forbidden(
            "centre staff only".to_string(),
        )));
    }
    Ok(next.run(request).await)
}

async fn admin_only(
    Extension(profile): Extension<Profile>,
    request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    if profile.role != Role::Admin {
        return Err(ServerError::Engine(EngineError::Forbidden(
            "administrators only".to_string(),
        )));
    }
    Ok(next.run(request).await)
}

/// Handle health probes
async fn health(State(state): State<ServerState>) -> Json<Health> {
    Json(Health {
        ok: true,
        database_connected: state.engine.database_ready().await,
    })
}

pub fn router(state: ServerState) -> Router {
    let staff = Router::new()
        .route("/api/staff/create-session", post(staff::create_session))
        .route("/api/staff/transactions", get(staff::list_transactions))
        .route(
            "/api/staff/transactions/{session_id}",
            patch(staff::update_session).delete(staff::delete_session),
        )
        .route("/api/staff/lookup-recycler", post(staff::lookup_recycler))
        .route_layer(middleware::from_fn(staff_only));

    let admin = Router::new()
        .route(
            "/api/admin/items",
            get(items::list)
                .post(items::create)
                .put(items::update)
                .delete(items::delete),
        )
        .route(
            "/api/admin/vouchers",
            get(vouchers::list_all)
                .post(vouchers::create)
                .put(vouchers::update)
                .delete(vouchers::delete),
        )
        .route(
            "/api/admin/users",
            get(users::list)
                .post(users::create)
                .put(users::update)
                .delete(users::delete),
        )
        .route("/api/admin/analytics", get(analytics::get))
        .route_layer(middleware::from_fn(admin_only));

    let authenticated = Router::new()
        .route("/api/me", get(me::me))
        .route("/api/points/me", get(me::points))
        .route("/api/vouchers/redeem", post(vouchers::redeem))
        .merge(staff)
        .merge(admin)
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate));

    Router::new()
        .route("/api/health", get(health))
        .route("/api/vouchers", get(vouchers::list_active))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/register", post(auth::register))
        .merge(authenticated)
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {err}");
        return;
    }
    tracing::info!("shutdown signal received");
}

pub async fn run(engine: Engine, config: ServerConfig) {
    let addr = format!("{}:{}", config.bind, config.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener on {addr}: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, config.dev_user_header, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    dev_user_header: bool,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr: SocketAddr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);
    if dev_user_header {
        tracing::warn!("x-user-id header authentication is enabled");
    }

    let state = ServerState {
        engine: Arc::new(engine),
        dev_user_header,
    };

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}
