//! Consultant API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::common::{AppError, AppResult};
use crate::core::ServerState;
use shared::booking::Availability;
use shared::models::{Consultant, ConsultantSummary};

/// Query params for an availability window
#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// List all consultants
pub async fn list(State(state): State<ServerState>) -> Json<Vec<ConsultantSummary>> {
    Json(state.catalog.list_consultants())
}

/// Get consultant by id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Consultant>> {
    let consultant = state
        .catalog
        .get_consultant(&id)
        .ok_or_else(|| AppError::NotFound(format!("Consultant {} not found", id)))?;
    Ok(Json(consultant))
}

/// Bookable slots for a consultant over a date range
pub async fn availability(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Query(query): Query<AvailabilityQuery>,
) -> AppResult<Json<Availability>> {
    let availability =
        state
            .manager
            .availability(&id, query.from, query.to, chrono::Utc::now())?;
    Ok(Json(availability))
}
