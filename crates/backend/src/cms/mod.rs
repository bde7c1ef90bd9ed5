//! Document store seam for the headless CMS
//!
//! ## Table of Contents
//! - **DocumentStore**: async trait every handler talks to
//! - **SanityClient**: the hosted CMS over its HTTP API
//! - **MemoryStore**: process-local store for tests and offline runs
//! - **AdminCredentials**: the singleton credential document
//! - **store_from_config**: picks the implementation for a `CmsConfig`
//!
//! There is no cache: every read goes to the store, and concurrent writes are
//! last-write-wins.

mod memory;
mod sanity;

pub use memory::MemoryStore;
pub use sanity::SanityClient;

use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use somoco_common::{DocumentError, Partner, RankingEntry, RankingPatch, Vehicle};

use crate::config::{CmsBackend, CmsConfig};

/// `_id` of the admin credential singleton.
pub const ADMIN_CREDENTIALS_ID: &str = "adminCredentials";

/// Error talking to the document store.
#[derive(Debug, thiserror::Error)]
pub enum CmsError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CMS responded {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Unexpected CMS response: {0}")]
    Decode(String),

    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// Stored admin password hash. `password_hash_b64` duplicates the hash in
/// base64 so it survives `$` expansion when copied into env files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminCredentials {
    #[serde(default)]
    pub password_hash: Option<String>,
    #[serde(rename = "passwordHashB64", default)]
    pub password_hash_b64: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl AdminCredentials {
    /// Credentials for a fresh bcrypt hash, stamped now.
    pub fn from_hash(hash: String) -> Self {
        Self {
            password_hash_b64: Some(STANDARD.encode(hash.as_bytes())),
            password_hash: Some(hash),
            updated_at: Some(Utc::now().to_rfc3339()),
        }
    }
}

/// What kind of asset an upload becomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Image,
    File,
}

impl AssetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AssetKind::Image => "image",
            AssetKind::File => "file",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AssetUpload {
    pub kind: AssetKind,
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Trait for catalog document storage.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Enabled vehicles, newest first.
    async fn list_vehicles(&self) -> Result<Vec<Vehicle>, CmsError>;

    /// An enabled vehicle by id.
    async fn get_vehicle(&self, id: &str) -> Result<Option<Vehicle>, CmsError>;

    async fn create_vehicle(&self, fields: Map<String, Value>) -> Result<Vehicle, CmsError>;

    /// Set `fields` on an existing vehicle. Fails if the document is missing.
    async fn update_vehicle(&self, id: &str, fields: Map<String, Value>) -> Result<Vehicle, CmsError>;

    /// Fails with `CmsError::NotFound` if nothing was deleted.
    async fn delete_vehicle(&self, id: &str) -> Result<(), CmsError>;

    /// Every raw vehicle document, disabled ones included.
    async fn vehicle_documents(&self) -> Result<Vec<Value>, CmsError>;

    /// Rankings of every published vehicle, disabled ones included.
    async fn list_rankings(&self) -> Result<Vec<RankingEntry>, CmsError>;

    /// Apply ranking writes in a single transaction.
    async fn apply_rankings(&self, patches: &[RankingPatch]) -> Result<(), CmsError>;

    /// Enabled partners by name.
    async fn list_partners(&self) -> Result<Vec<Partner>, CmsError>;

    /// An enabled partner by id.
    async fn get_partner(&self, id: &str) -> Result<Option<Partner>, CmsError>;

    async fn admin_credentials(&self) -> Result<Option<AdminCredentials>, CmsError>;

    async fn put_admin_credentials(&self, credentials: &AdminCredentials) -> Result<(), CmsError>;

    /// Store an uploaded asset and return its asset id (`image-…` / `file-…`).
    async fn upload_asset(&self, upload: AssetUpload) -> Result<String, CmsError>;

    /// Store name for logging
    fn name(&self) -> &str;
}

/// Open the store `config` names.
pub fn store_from_config(config: &CmsConfig) -> Result<Arc<dyn DocumentStore>, CmsError> {
    Ok(match config.backend {
        CmsBackend::Sanity => Arc::new(SanityClient::new(config)?),
        CmsBackend::Memory => {
            tracing::warn!("Using in-memory CMS store; nothing will be persisted");
            Arc::new(MemoryStore::new())
        }
    })
}

/// Decode a list of raw documents, skipping (and logging) malformed ones.
pub(crate) fn decode_all<T>(docs: &[Value], decode: impl Fn(&Value) -> Result<T, DocumentError>) -> Vec<T> {
    docs.iter()
        .filter_map(|doc| match decode(doc) {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::warn!("Skipping malformed CMS document: {}", e);
                None
            }
        })
        .collect()
}
