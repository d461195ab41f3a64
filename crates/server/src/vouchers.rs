//! Voucher catalog and redemption endpoints

use api_types::{
    IdQuery,
    auth::Success,
    voucher::{Redeem, Redeemed, VoucherNew, VoucherUpdate, VoucherView},
};
use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
};
use engine::{Profile, VoucherDraft};

use crate::{
    ServerError,
    convert::{redeemed_view, voucher_view},
    server::ServerState,
};

/// Handle public requests for the active vouchers, cheapest first
pub async fn list_active(
    State(state): State<ServerState>,
) -> Result<Json<Vec<VoucherView>>, ServerError> {
    let vouchers = state.engine.list_active_vouchers().await?;
    Ok(Json(vouchers.into_iter().map(voucher_view).collect()))
}

/// Handle requests for redeeming a voucher with the caller's points
pub async fn redeem(
    Extension(profile): Extension<Profile>,
    State(state): State<ServerState>,
    Json(payload): Json<Redeem>,
) -> Result<Json<Redeemed>, ServerError> {
    if payload.voucher_id.trim().is_empty() {
        return Err(ServerError::Generic("voucherId is required".to_string()));
    }

    let redeemed = state
        .engine
        .redeem_voucher(&profile.id, payload.voucher_id.trim())
        .await?;
    tracing::info!(
        user = %profile.id,
        voucher = %redeemed.redemption.voucher_id,
        points = redeemed.redemption.points_spent,
        "voucher redeemed"
    );

    Ok(Json(redeemed_view(redeemed)))
}

pub async fn list_all(
    State(state): State<ServerState>,
) -> Result<Json<Vec<VoucherView>>, ServerError> {
    let vouchers = state.engine.list_vouchers().await?;
    Ok(Json(vouchers.into_iter().map(voucher_view).collect()))
}

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<VoucherNew>,
) -> Result<(StatusCode, Json<VoucherView>), ServerError> {
    let voucher = state
        .engine
        .create_voucher(VoucherDraft {
            name: payload.name,
            description: payload.description,
            points_cost: payload.points_cost,
            is_active: payload.is_active.unwrap_or(true),
        })
        .await?;
    tracing::info!(voucher = %voucher.id, "voucher created");

    Ok((StatusCode::CREATED, Json(voucher_view(voucher))))
}

pub async fn update(
    State(state): State<ServerState>,
    Json(payload): Json<VoucherUpdate>,
) -> Result<Json<VoucherView>, ServerError> {
    let voucher = state
        .engine
        .update_voucher(
            &payload.id,
            engine::VoucherUpdate {
                name: payload.name,
                description: payload.description,
                points_cost: payload.points_cost,
                is_active: payload.is_active,
            },
        )
        .await?;

    Ok(Json(voucher_view(voucher)))
}

pub async fn delete(
    State(state): State<ServerState>,
    Query(query): Query<IdQuery>,
) -> Result<Json<Success>, ServerError> {
    state.engine.delete_voucher(&query.id).await?;
    tracing::info!(voucher = %query.id, "voucher deleted");

    Ok(Json(Success { success: true }))
}
