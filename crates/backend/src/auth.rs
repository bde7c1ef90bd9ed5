// =============================================================================
// Somoco Backend - Admin Authentication
// =============================================================================
// Table of Contents:
// 1. JWT Claims
// 2. Admin Session Extractor
// 3. Credential Resolution
// 4. Helper Functions
// 5. Handlers
// =============================================================================

use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, HeaderMap},
    Json,
};
use base64::{
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
    Engine,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use somoco_common::ApiResponse;

use crate::cms::AdminCredentials;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::mail::templates;
use crate::AppState;

/// bcrypt work factor for newly generated hashes.
pub const BCRYPT_COST: u32 = 10;

/// Length of generated admin passwords.
pub const GENERATED_PASSWORD_LEN: usize = 16;

// -----------------------------------------------------------------------------
// 1. JWT Claims
// -----------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,  // Always "admin"
    pub name: String, // Admin username
    pub exp: i64,     // Expiry timestamp
    pub iat: i64,     // Issued at
}

/// The single admin user, as handed out after a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminIdentity {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl AdminIdentity {
    pub fn new(username: &str) -> Self {
        Self {
            id: "admin".into(),
            name: username.to_string(),
            email: format!("{username}@admin.local"),
        }
    }
}

// -----------------------------------------------------------------------------
// 2. Admin Session Extractor
// -----------------------------------------------------------------------------

/// Admin session extracted from the `Authorization: Bearer` token.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub identity: AdminIdentity,
}

#[async_trait]
impl FromRequestParts<AppState> for AdminSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = extract_token(&parts.headers).ok_or(ApiError::Unauthorized)?;
        let claims = validate_token(&token, &state.config.jwt_secret)?;

        Ok(AdminSession {
            identity: AdminIdentity::new(&claims.name),
        })
    }
}

// -----------------------------------------------------------------------------
// 3. Credential Resolution
// -----------------------------------------------------------------------------

/// The bcrypt hash logins are checked against.
///
/// The CMS singleton wins; the environment is the fallback for fresh installs
/// and for when the CMS cannot be reached.
pub async fn current_password_hash(state: &AppState) -> Option<String> {
    match state.store.admin_credentials().await {
        Ok(Some(stored)) => {
            if let Some(hash) = stored_hash(&stored) {
                return Some(hash);
            }
        }
        Ok(None) => {}
        Err(e) => tracing::warn!("Falling back to env admin credentials: {}", e),
    }

    let admin = &state.config.admin;
    admin
        .password_hash_b64
        .as_deref()
        .and_then(decode_b64)
        .or_else(|| admin.password_hash.as_deref().map(strip_quotes))
        .filter(|hash| !hash.is_empty())
}

fn stored_hash(stored: &AdminCredentials) -> Option<String> {
    stored
        .password_hash_b64
        .as_deref()
        .and_then(decode_b64)
        .or_else(|| stored.password_hash.clone())
        .filter(|hash| !hash.is_empty())
}

fn decode_b64(encoded: &str) -> Option<String> {
    let bytes = STANDARD.decode(encoded.trim()).ok()?;
    String::from_utf8(bytes).ok()
}

/// `.env` files often carry the hash quoted to protect the `$` signs.
fn strip_quotes(raw: &str) -> String {
    let trimmed = raw.trim();
    ['\'', '"']
        .iter()
        .find_map(|q| {
            trimmed
                .strip_prefix(*q)
                .and_then(|rest| rest.strip_suffix(*q))
        })
        .unwrap_or(trimmed)
        .to_string()
}

/// Check a username/password pair against the admin account.
///
/// Any mismatch yields `Ok(None)`; the caller never learns which part was
/// wrong.
pub async fn authorize(
    state: &AppState,
    username: Option<&str>,
    password: Option<&str>,
) -> Result<Option<AdminIdentity>, ApiError> {
    let (Some(username), Some(password)) = (username, password) else {
        return Ok(None);
    };
    if username.is_empty() || password.is_empty() {
        return Ok(None);
    }

    let Some(admin_username) = state.config.admin.username.as_deref() else {
        return Ok(None);
    };
    let Some(hash) = current_password_hash(state).await else {
        return Ok(None);
    };
    if username != admin_username {
        return Ok(None);
    }

    if verify_password(password, &hash).await? {
        Ok(Some(AdminIdentity::new(admin_username)))
    } else {
        Ok(None)
    }
}

// -----------------------------------------------------------------------------
// 4. Helper Functions
// -----------------------------------------------------------------------------

/// Hash a password with bcrypt.
pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, BCRYPT_COST)
}

/// Verify a password against a bcrypt hash off the async runtime.
async fn verify_password(password: &str, hash: &str) -> Result<bool, ApiError> {
    let password = password.to_string();
    let hash = hash.to_string();
    let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| ApiError::Internal(format!("password check panicked: {e}")))?;

    match verified {
        Ok(valid) => Ok(valid),
        Err(e) => {
            tracing::warn!("Stored admin hash is not valid bcrypt: {}", e);
            Ok(false)
        }
    }
}

async fn hash_password_blocking(password: &str) -> Result<String, ApiError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ApiError::Internal(format!("password hashing panicked: {e}")))?
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {e}")))
}

/// Random URL-safe password of `len` characters.
pub fn generate_password(len: usize) -> String {
    let mut bytes = vec![0u8; (len * 3).div_ceil(4)];
    rand::thread_rng().fill_bytes(&mut bytes);
    let mut password = URL_SAFE_NO_PAD.encode(bytes);
    password.truncate(len);
    password
}

/// Generate a session token for the admin.
pub fn generate_token(identity: &AdminIdentity, secret: &str, expiry_hours: i64) -> Result<String, ApiError> {
    let now = Utc::now();
    let exp = now + Duration::hours(expiry_hours);

    let claims = Claims {
        sub: identity.id.clone(),
        name: identity.name.clone(),
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("Failed to sign token: {e}")))
}

/// Validate a session token and extract claims.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, ApiError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::Unauthorized)
}

/// Extract token from Authorization header.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

// -----------------------------------------------------------------------------
// 5. Handlers
// -----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: AdminIdentity,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub username: Option<String>,
}

/// Login with the admin username and password.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    let identity = authorize(&state, req.username.as_deref(), req.password.as_deref())
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    let token = generate_token(&identity, &state.config.jwt_secret, state.config.jwt_expiry_hours)?;
    tracing::info!("Admin {} logged in", identity.name);

    Ok(Json(ApiResponse::ok(LoginResponse { token, user: identity })))
}

/// Replace the admin password with a generated one and email it.
///
/// The email goes out before the new hash is stored: if delivery fails, the
/// old password keeps working.
pub async fn reset_password(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let admin = &state.config.admin;
    let username = match (admin.username.as_deref(), req.username.as_deref()) {
        (Some(expected), Some(given)) if expected == given => expected,
        _ => return Err(ApiError::BadRequest("Invalid username".into())),
    };
    let admin_email = admin
        .email
        .as_deref()
        .ok_or_else(|| ApiError::Internal("Admin email not configured".into()))?;
    if !state.smtp.is_configured() {
        return Err(ApiError::Internal("Email service not configured".into()));
    }

    let password = generate_password(GENERATED_PASSWORD_LEN);
    let hash = hash_password_blocking(&password).await?;

    state
        .smtp
        .send(templates::password_reset(admin_email, username, &password))
        .await
        .map_err(ApiError::mail("Failed to reset password"))?;

    let credentials = AdminCredentials::from_hash(hash);
    if let Err(e) = state.store.put_admin_credentials(&credentials).await {
        tracing::error!(
            "Reset password was emailed to {} but could not be stored; the previous password is still active: {}",
            admin_email,
            e
        );
        return Err(ApiError::cms("Failed to save new password")(e));
    }

    tracing::info!("Admin password reset, new credentials sent to {}", admin_email);
    Ok(Json(ApiResponse::message_only(
        "A new password has been generated and sent to your email.",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_password() {
        let a = generate_password(GENERATED_PASSWORD_LEN);
        let b = generate_password(GENERATED_PASSWORD_LEN);
        assert_eq!(a.len(), 16);
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_strip_quotes() {
        assert_eq!(strip_quotes("'$2b$10$abc'"), "$2b$10$abc");
        assert_eq!(strip_quotes("\"$2b$10$abc\""), "$2b$10$abc");
        assert_eq!(strip_quotes(" $2b$10$abc "), "$2b$10$abc");
        assert_eq!(strip_quotes("'unbalanced"), "'unbalanced");
    }

    #[test]
    fn test_stored_hash_prefers_b64() {
        let stored = AdminCredentials {
            password_hash: Some("raw".into()),
            password_hash_b64: Some(STANDARD.encode("decoded")),
            updated_at: None,
        };
        assert_eq!(stored_hash(&stored).as_deref(), Some("decoded"));

        let raw_only = AdminCredentials {
            password_hash_b64: Some("%%% not base64".into()),
            ..stored
        };
        assert_eq!(stored_hash(&raw_only).as_deref(), Some("raw"));
    }

    #[test]
    fn test_token_roundtrip() {
        let identity = AdminIdentity::new("admin");
        let token = generate_token(&identity, "secret", 1).unwrap();
        let claims = validate_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, "admin");
        assert_eq!(claims.name, "admin");

        assert!(matches!(validate_token(&token, "other"), Err(ApiError::Unauthorized)));
    }

    #[test]
    fn test_extract_token() {
        let mut headers = HeaderMap::new();
        assert!(extract_token(&headers).is_none());
        headers.insert(header::AUTHORIZATION, "Bearer abc".parse().unwrap());
        assert_eq!(extract_token(&headers).as_deref(), Some("abc"));
        headers.insert(header::AUTHORIZATION, "Basic abc".parse().unwrap());
        assert!(extract_token(&headers).is_none());
    }

    #[test]
    fn test_identity_email() {
        assert_eq!(AdminIdentity::new("boss").email, "boss@admin.local");
    }
}
