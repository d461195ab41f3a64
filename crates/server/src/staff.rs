//! Collection centre endpoints
//!
//! The acting staff profile id is the collection centre id of every session
//! recorded through these endpoints.

use api_types::staff::{
    BasketLine, LookupRecycler, LookupResponse, SessionCreated, SessionNew, SessionUpdate,
    SessionUpdated, TransactionListQuery, TransactionListResponse,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use engine::{BasketItem, Profile};

use crate::{
    ServerError,
    convert::{recycler_summary, stored_transaction, transaction_view},
    server::ServerState,
};

fn basket(lines: &[BasketLine]) -> Vec<BasketItem> {
    lines
        .iter()
        .map(|line| BasketItem {
            item_id: line.item_id,
            quantity: line.quantity,
        })
        .collect()
}

/// Handle requests for recording a recycling session
pub async fn create_session(
    Extension(staff): Extension<Profile>,
    State(state): State<ServerState>,
    Json(payload): Json<SessionNew>,
) -> Result<Json<SessionCreated>, ServerError> {
    if payload.recycler_id.trim().is_empty() {
        return Err(ServerError::Generic("recyclerId is required".to_string()));
    }

    let session = state
        .engine
        .create_session(&staff.id, payload.recycler_id.trim(), &basket(&payload.items))
        .await?;
    tracing::info!(
        session = %session.id,
        centre = %session.collection_centre_id,
        recycler = %session.recycler_id,
        "recycling session recorded"
    );

    Ok(Json(SessionCreated {
        success: true,
        session_id: session.id,
        message: "Recycling session recorded".to_string(),
    }))
}

/// Handle requests for replacing the items of a session
pub async fn update_session(
    Extension(staff): Extension<Profile>,
    State(state): State<ServerState>,
    Path(session_id): Path<String>,
    Json(payload): Json<SessionUpdate>,
) -> Result<Json<SessionUpdated>, ServerError> {
    let transactions = state
        .engine
        .update_session(&staff.id, &session_id, &basket(&payload.items))
        .await?;
    tracing::info!(session = %session_id, "recycling session updated");

    Ok(Json(SessionUpdated {
        success: true,
        transactions: transactions.into_iter().map(stored_transaction).collect(),
    }))
}

/// Handle requests for deleting a session
pub async fn delete_session(
    Extension(staff): Extension<Profile>,
    State(state): State<ServerState>,
    Path(session_id): Path<String>,
) -> Result<Json<api_types::auth::Success>, ServerError> {
    state.engine.delete_session(&staff.id, &session_id).await?;
    tracing::info!(session = %session_id, "recycling session deleted");

    Ok(Json(api_types::auth::Success { success: true }))
}

/// Handle requests for listing the transactions of the caller's centre
pub async fn list_transactions(
    Extension(staff): Extension<Profile>,
    State(state): State<ServerState>,
    Query(query): Query<TransactionListQuery>,
) -> Result<Json<TransactionListResponse>, ServerError> {
    let recycler_id = query
        .recycler_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty());
    let listing = state
        .engine
        .list_centre_transactions(&staff.id, recycler_id)
        .await?;

    Ok(Json(TransactionListResponse {
        transactions: listing
            .transactions
            .into_iter()
            .map(transaction_view)
            .collect(),
        centre_totals: listing.centre_totals,
        recycler_totals: listing.recycler_totals,
    }))
}

/// Handle requests for resolving a member code
pub async fn lookup_recycler(
    State(state): State<ServerState>,
    Json(payload): Json<LookupRecycler>,
) -> Result<Json<LookupResponse>, ServerError> {
    if payload.member_code.trim().is_empty() {
        return Err(ServerError::Generic("Member code is required".to_string()));
    }
    let profile = state.engine.lookup_recycler(&payload.member_code).await?;

    Ok(Json(LookupResponse {
        profile: recycler_summary(profile),
    }))
}
