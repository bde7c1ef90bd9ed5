// =============================================================================
// Somoco Backend - Contact Form Handler
// =============================================================================

use axum::{extract::State, Json};
use serde::Deserialize;
use somoco_common::{ApiResponse, ValidationError};

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::mail::templates::{self, ContactSubmission};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ContactRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
}

impl ContactRequest {
    fn submission(&self) -> Result<ContactSubmission<'_>, ValidationError> {
        Ok(ContactSubmission {
            name: field(&self.name)?,
            phone: field(&self.phone)?,
            email: field(&self.email)?,
            message: field(&self.message)?,
        })
    }
}

fn field(value: &Option<String>) -> Result<&str, ValidationError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(ValidationError::AllFieldsRequired)
}

/// Forward a contact form submission to the customer service inbox.
pub async fn submit_contact(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ContactRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let submission = req.submission()?;

    state
        .smtp
        .send(templates::contact_submission(&state.config.contact_inbox, &submission))
        .await
        .map_err(ApiError::mail("Failed to send message"))?;

    tracing::info!("Contact form submission from {}", submission.email);
    Ok(Json(ApiResponse::message_only("Message sent successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_fields_required() {
        let req = ContactRequest {
            name: Some("Ada".into()),
            phone: Some("  ".into()),
            email: Some("ada@example.com".into()),
            message: Some("Hi".into()),
        };
        assert_eq!(req.submission().unwrap_err(), ValidationError::AllFieldsRequired);
    }

    #[test]
    fn test_trims_fields() {
        let req = ContactRequest {
            name: Some(" Ada ".into()),
            phone: Some("123".into()),
            email: Some("ada@example.com".into()),
            message: Some("Hi".into()),
        };
        assert_eq!(req.submission().unwrap().name, "Ada");
    }
}
