// =============================================================================
// Somoco Backend - Vehicle Handlers
// =============================================================================
// Public reads only ever see enabled vehicles. Writes need an admin session
// and always rewrite the full editable field set.
// =============================================================================

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use somoco_common::{bump_rankings, ApiResponse, RankingPatch, Vehicle, VehicleDraft};

use crate::auth::AdminSession;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::AppState;

// -----------------------------------------------------------------------------
// Request Types
// -----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RankingRequest {
    pub ranking: i64,
}

fn require_id(id: &str) -> Result<&str, ApiError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ApiError::BadRequest("Invalid vehicle ID".into()));
    }
    Ok(id)
}

// -----------------------------------------------------------------------------
// Handlers
// -----------------------------------------------------------------------------

/// All enabled vehicles, newest first.
pub async fn list_vehicles(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Vehicle>>>, ApiError> {
    let vehicles = state
        .store
        .list_vehicles()
        .await
        .map_err(ApiError::cms("Failed to fetch vehicles"))?;

    Ok(Json(ApiResponse::ok(vehicles)))
}

/// One enabled vehicle.
pub async fn get_vehicle(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vehicle>>, ApiError> {
    let vehicle = state
        .store
        .get_vehicle(require_id(&id)?)
        .await
        .map_err(ApiError::cms("Failed to fetch vehicle"))?
        .ok_or_else(|| ApiError::NotFound("Vehicle not found".into()))?;

    Ok(Json(ApiResponse::ok(vehicle)))
}

pub async fn create_vehicle(
    State(state): State<AppState>,
    session: AdminSession,
    ApiJson(draft): ApiJson<VehicleDraft>,
) -> Result<Json<ApiResponse<Vehicle>>, ApiError> {
    draft.validate()?;

    let vehicle = state
        .store
        .create_vehicle(draft.into_fields())
        .await
        .map_err(ApiError::cms("Failed to create vehicle"))?;

    tracing::info!(
        "{} created vehicle {} ({})",
        session.identity.name,
        vehicle.id,
        vehicle.display_name()
    );
    Ok(Json(ApiResponse::ok_with_message(vehicle, "Vehicle created successfully")))
}

/// Replace a vehicle's editable fields. A missing document is an upstream
/// failure (500), not a 404.
pub async fn update_vehicle(
    State(state): State<AppState>,
    session: AdminSession,
    Path(id): Path<String>,
    ApiJson(draft): ApiJson<VehicleDraft>,
) -> Result<Json<ApiResponse<Vehicle>>, ApiError> {
    let id = require_id(&id)?;
    draft.validate()?;

    let vehicle = state
        .store
        .update_vehicle(id, draft.into_fields())
        .await
        .map_err(ApiError::cms("Failed to update vehicle"))?;

    tracing::info!("{} updated vehicle {}", session.identity.name, vehicle.id);
    Ok(Json(ApiResponse::ok_with_message(vehicle, "Vehicle updated successfully")))
}

pub async fn delete_vehicle(
    State(state): State<AppState>,
    session: AdminSession,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = require_id(&id)?;

    state
        .store
        .delete_vehicle(id)
        .await
        .map_err(ApiError::cms("Failed to delete vehicle"))?;

    tracing::info!("{} deleted vehicle {}", session.identity.name, id);
    Ok(Json(ApiResponse::message_only("Vehicle deleted successfully")))
}

/// Move a vehicle to `ranking`, pushing the vehicles at or below it down one.
pub async fn set_ranking(
    State(state): State<AppState>,
    _session: AdminSession,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<RankingRequest>,
) -> Result<Json<ApiResponse<Vec<RankingPatch>>>, ApiError> {
    let id = require_id(&id)?;
    if req.ranking < 1 {
        return Err(ApiError::BadRequest("Ranking must be at least 1".into()));
    }

    let entries = state
        .store
        .list_rankings()
        .await
        .map_err(ApiError::cms("Failed to fetch rankings"))?;
    if !entries.iter().any(|entry| entry.id == id) {
        return Err(ApiError::NotFound("Vehicle not found".into()));
    }

    let patches = bump_rankings(&entries, id, req.ranking);
    state
        .store
        .apply_rankings(&patches)
        .await
        .map_err(ApiError::cms("Failed to update ranking"))?;

    tracing::debug!("Ranking of {} set to {} ({} writes)", id, req.ranking, patches.len());
    Ok(Json(ApiResponse::ok_with_message(patches, "Ranking updated successfully")))
}
