//! Endpoints about the caller

use api_types::{
    points::PointsResponse,
    profile::{Me, MeView},
};
use axum::{Extension, Json, extract::State};
use engine::Profile;

use crate::{
    ServerError,
    convert::{ledger_entry_view, role_to_api},
    server::ServerState,
};

/// Handle requests for the caller's profile and point total
pub async fn me(
    Extension(profile): Extension<Profile>,
    State(state): State<ServerState>,
) -> Result<Json<Me>, ServerError> {
    let points_total = state.engine.balance(&profile.id).await?;

    Ok(Json(Me {
        user: MeView {
            id: profile.id,
            full_name: profile.full_name,
            role: role_to_api(profile.role),
            public_id: profile.public_id,
            email: profile.email,
            points_total,
        },
    }))
}

/// Handle requests for the caller's ledger
pub async fn points(
    Extension(profile): Extension<Profile>,
    State(state): State<ServerState>,
) -> Result<Json<PointsResponse>, ServerError> {
    let entries = state.engine.ledger(&profile.id).await?;
    let total_points = engine::balance_of(&entries);

    Ok(Json(PointsResponse {
        total_points,
        entries: entries.into_iter().map(ledger_entry_view).collect(),
    }))
}
