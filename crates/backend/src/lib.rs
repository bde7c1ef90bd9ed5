// =============================================================================
// Somoco Backend - Library Root
// =============================================================================
// Table of Contents:
// 1. Modules
// 2. Application State
// 3. Router Setup
// =============================================================================

pub mod auth;
pub mod catalog;
pub mod cms;
pub mod config;
pub mod contact;
pub mod error;
pub mod extract;
pub mod mail;
pub mod maintenance;
pub mod partners;
pub mod uploads;
pub mod vehicles;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::cms::DocumentStore;
use crate::config::{Config, MailBackend};
use crate::mail::{Mailer, MemoryMailer, ResendMailer, SmtpMailer};

// -----------------------------------------------------------------------------
// 2. Application State
// -----------------------------------------------------------------------------

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn DocumentStore>,
    /// Contact form and password reset mail
    pub smtp: Arc<dyn Mailer>,
    /// Partner inquiries
    pub transactional: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn DocumentStore>,
        smtp: Arc<dyn Mailer>,
        transactional: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            smtp,
            transactional,
        }
    }

    /// Build the store and mailers the configuration asks for.
    pub fn from_config(config: Config) -> Result<Self, Box<dyn std::error::Error>> {
        let store = cms::store_from_config(&config.cms)?;

        let smtp: Arc<dyn Mailer>;
        let transactional: Arc<dyn Mailer>;
        match config.mail_backend {
            MailBackend::Live => {
                if config.smtp.is_none() {
                    tracing::warn!("SMTP is not configured; contact and reset mail will fail");
                }
                if config.resend.is_none() {
                    tracing::warn!("RESEND_API_KEY is not set; partner inquiries will fail");
                }
                smtp = Arc::new(SmtpMailer::new(config.smtp.clone()));
                transactional = Arc::new(ResendMailer::new(config.resend.clone())?);
            }
            MailBackend::Memory => {
                smtp = Arc::new(MemoryMailer::new());
                transactional = Arc::new(MemoryMailer::new());
            }
        }

        tracing::info!(
            "Store: {}, mailers: {} / {}",
            store.name(),
            smtp.name(),
            transactional.name()
        );
        Ok(Self::new(config, store, smtp, transactional))
    }
}

// -----------------------------------------------------------------------------
// 3. Router Setup
// -----------------------------------------------------------------------------

fn cors_layer(config: &Config) -> CorsLayer {
    let origin = match HeaderValue::from_str(&config.frontend_url) {
        Ok(origin) => AllowOrigin::exact(origin),
        Err(_) => {
            tracing::warn!("FRONTEND_URL is not a valid origin; allowing any origin");
            AllowOrigin::any()
        }
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

pub fn create_router(state: AppState) -> Router {
    let cors = if state.config.frontend_url == "*" {
        CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
    } else {
        cors_layer(&state.config)
    };

    let upload_routes = Router::new()
        .route("/api/upload-image", post(uploads::upload_image))
        .route("/api/upload-file", post(uploads::upload_file))
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes));

    Router::new()
        // Health check
        .route("/health", get(|| async { "OK" }))
        // Auth routes
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/reset-password", post(auth::reset_password))
        // Vehicles API (writes need an admin session)
        .route(
            "/api/vehicles",
            get(vehicles::list_vehicles).post(vehicles::create_vehicle),
        )
        .route(
            "/api/vehicles/:id",
            get(vehicles::get_vehicle)
                .put(vehicles::update_vehicle)
                .delete(vehicles::delete_vehicle),
        )
        .route("/api/vehicles/:id/ranking", put(vehicles::set_ranking))
        // Storefront API (public)
        .route("/api/catalog", get(catalog::get_catalog))
        .route("/api/compare", get(catalog::compare))
        .route("/api/partners", get(partners::list_partners))
        .route("/api/partners/:id", get(partners::get_partner))
        // Mail
        .route("/api/contact", post(contact::submit_contact))
        .route("/api/partner-contact", post(partners::partner_contact))
        // Uploads (admin)
        .merge(upload_routes)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
