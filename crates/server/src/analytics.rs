//! Admin analytics endpoint

use api_types::analytics::{AnalyticsQuery, AnalyticsResponse};
use axum::{
    Json,
    extract::{Query, State},
};
use chrono::Utc;
use engine::AnalyticsRange;

use crate::{ServerError, convert::analytics_response, server::ServerState};

/// Handle requests for the dashboard aggregates. `range` defaults to `7d`.
pub async fn get(
    State(state): State<ServerState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<AnalyticsResponse>, ServerError> {
    let range = match query.range.as_deref() {
        Some(range) => AnalyticsRange::try_from(range)?,
        None => AnalyticsRange::default(),
    };
    let analytics = state.engine.analytics(range, Utc::now()).await?;

    Ok(Json(analytics_response(range.as_str(), analytics)))
}
