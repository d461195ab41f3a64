//! Admin endpoints for profiles

use api_types::{
    IdQuery,
    auth::Success,
    profile::{ProfileView, UserListQuery, UserNew, UserUpdate},
};
use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
};
use engine::{NewProfile, Profile, ProfileUpdate};

use crate::{
    ServerError,
    convert::{profile_view, role_from_api},
    server::ServerState,
};

pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<Vec<ProfileView>>, ServerError> {
    let profiles = state
        .engine
        .list_profiles(query.role.map(role_from_api))
        .await?;
    Ok(Json(profiles.into_iter().map(profile_view).collect()))
}

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<UserNew>,
) -> Result<(StatusCode, Json<ProfileView>), ServerError> {
    let profile = state
        .engine
        .create_profile(NewProfile {
            email: payload.email,
            password: payload.password,
            full_name: payload.full_name,
            role: role_from_api(payload.role),
        })
        .await?;
    tracing::info!(profile = %profile.id, role = profile.role.as_str(), "profile created");

    Ok((StatusCode::CREATED, Json(profile_view(profile))))
}

pub async fn update(
    State(state): State<ServerState>,
    Json(payload): Json<UserUpdate>,
) -> Result<Json<ProfileView>, ServerError> {
    let profile = state
        .engine
        .update_profile(
            &payload.id,
            ProfileUpdate {
                email: payload.email,
                full_name: payload.full_name,
                role: payload.role.map(role_from_api),
            },
        )
        .await?;

    Ok(Json(profile_view(profile)))
}

pub async fn delete(
    Extension(admin): Extension<Profile>,
    State(state): State<ServerState>,
    Query(query): Query<IdQuery>,
) -> Result<Json<Success>, ServerError> {
    if query.id == admin.id {
        return Err(ServerError::Generic(
            "administrators cannot delete themselves".to_string(),
        ));
    }
    state.engine.delete_profile(&query.id).await?;
    tracing::info!(profile = %query.id, "profile deleted");

    Ok(Json(Success { success: true }))
}
