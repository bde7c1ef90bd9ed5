// =============================================================================
// Somoco Backend - Finance Partner Handlers
// =============================================================================

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use somoco_common::{ApiResponse, Partner, ValidationError};

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::mail::templates::{self, FinanceInquiry};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartnerContactRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub partner_name: Option<String>,
    pub partner_email: Option<String>,
}

/// Provider id of the inquiry delivered to the partner.
#[derive(Debug, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    pub id: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Enabled finance partners, by name.
pub async fn list_partners(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Partner>>>, ApiError> {
    let partners = state
        .store
        .list_partners()
        .await
        .map_err(ApiError::cms("Failed to fetch partners"))?;

    Ok(Json(ApiResponse::ok(partners)))
}

pub async fn get_partner(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Partner>>, ApiError> {
    let partner = state
        .store
        .get_partner(&id)
        .await
        .map_err(ApiError::cms("Failed to fetch partner"))?
        .ok_or_else(|| ApiError::NotFound("Partner not found".into()))?;

    Ok(Json(ApiResponse::ok(partner)))
}

/// Send a customer's finance inquiry to the chosen partner, plus a tracking
/// copy to the Somoco inbox.
pub async fn partner_contact(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<PartnerContactRequest>,
) -> Result<Json<ApiResponse<DeliveryReceipt>>, ApiError> {
    let partner_email = present(&req.partner_email)
        .ok_or_else(|| ApiError::BadRequest("Partner email not configured".into()))?;
    let name = present(&req.name).ok_or(ValidationError::Required("name"))?;
    let email = present(&req.email).ok_or(ValidationError::Required("email"))?;

    let inquiry = FinanceInquiry {
        name,
        email,
        phone: present(&req.phone),
        city: present(&req.city),
        region: present(&req.region),
        partner_name: present(&req.partner_name).unwrap_or("(unnamed partner)"),
    };

    let receipt = state
        .transactional
        .send(templates::partner_inquiry(partner_email, &inquiry))
        .await
        .map_err(ApiError::mail("Failed to send email"))?;

    // The partner already has the inquiry; a lost copy must not make the
    // customer submit it twice.
    let copy = templates::partner_copy(&state.config.partner_copy_inbox, partner_email, &inquiry);
    if let Err(e) = state.transactional.send(copy).await {
        tracing::error!("Partner inquiry copy to {} failed: {}", state.config.partner_copy_inbox, e);
    }

    tracing::info!("Finance inquiry from {} sent to {}", email, inquiry.partner_name);
    Ok(Json(ApiResponse::ok(DeliveryReceipt { id: receipt.id })))
}
