//! Admin endpoints for the item catalog

use api_types::{
    auth::Success,
    item::{ItemIdQuery, ItemNew, ItemUpdate, ItemView},
};
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use engine::Measurement;

use crate::{
    ServerError,
    convert::{item_view, measurement_from_api},
    server::ServerState,
};

pub async fn list(State(state): State<ServerState>) -> Result<Json<Vec<ItemView>>, ServerError> {
    let items = state.engine.list_items().await?;
    Ok(Json(items.into_iter().map(item_view).collect()))
}

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<ItemNew>,
) -> Result<(StatusCode, Json<ItemView>), ServerError> {
    let measurement = payload
        .measurement
        .map_or(Measurement::Count, measurement_from_api);
    let item = state.engine.create_item(&payload.name, measurement).await?;
    tracing::info!(item = item.id, "item created");

    Ok((StatusCode::CREATED, Json(item_view(item))))
}

pub async fn update(
    State(state): State<ServerState>,
    Json(payload): Json<ItemUpdate>,
) -> Result<Json<ItemView>, ServerError> {
    if payload.name.is_none() && payload.measurement.is_none() {
        return Err(ServerError::Generic(
            "name or measurement required".to_string(),
        ));
    }
    let item = state
        .engine
        .update_item(
            payload.id,
            payload.name.as_deref(),
            payload.measurement.map(measurement_from_api),
        )
        .await?;

    Ok(Json(item_view(item)))
}

pub async fn delete(
    State(state): State<ServerState>,
    Query(query): Query<ItemIdQuery>,
) -> Result<Json<Success>, ServerError> {
    state.engine.delete_item(query.id).await?;
    tracing::info!(item = query.id, "item deleted");

    Ok(Json(Success { success: true }))
}
