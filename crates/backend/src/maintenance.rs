// =============================================================================
// Somoco Backend - Operator Tasks
// =============================================================================
// Jobs run from `somoco-admin` against the live document store:
// - key migration: add the `_key` the studio needs to every keyless array item
// - password rotation: replace the stored admin credential
// =============================================================================

use serde_json::Value;
use somoco_common::vehicle::missing_keys_patch;

use crate::auth::hash_password;
use crate::cms::{AdminCredentials, CmsError, DocumentStore};

#[derive(Debug, thiserror::Error)]
pub enum MaintenanceError {
    #[error(transparent)]
    Cms(#[from] CmsError),

    #[error("Failed to hash password: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

/// Outcome of a key migration.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct KeyMigration {
    /// Vehicle documents inspected
    pub checked: usize,
    /// Ids of the documents that needed keys (patched unless dry run)
    pub updated: Vec<String>,
}

/// Give every keyless specification parameter and image of every vehicle a
/// `_key`. Documents that already have all their keys are not written.
pub async fn migrate_keys(store: &dyn DocumentStore, dry_run: bool) -> Result<KeyMigration, CmsError> {
    let docs = store.vehicle_documents().await?;
    tracing::info!("Found {} vehicles to check", docs.len());

    let mut report = KeyMigration::default();
    for doc in &docs {
        report.checked += 1;
        let Some(id) = doc.get("_id").and_then(Value::as_str) else {
            tracing::warn!("Skipping vehicle document without _id");
            continue;
        };
        let Some(fields) = missing_keys_patch(doc) else {
            continue;
        };

        let name = doc.get("name").and_then(Value::as_str).unwrap_or("(unnamed)");
        if dry_run {
            tracing::info!("Would update vehicle: {} ({})", name, id);
        } else {
            tracing::info!("Updating vehicle: {} ({})", name, id);
            store.update_vehicle(id, fields).await?;
        }
        report.updated.push(id.to_string());
    }

    Ok(report)
}

/// Hash `password` and, unless `dry_run`, store it as the admin credential.
/// Returns what was (or would have been) written.
pub async fn rotate_password(
    store: &dyn DocumentStore,
    password: &str,
    dry_run: bool,
) -> Result<AdminCredentials, MaintenanceError> {
    let credentials = AdminCredentials::from_hash(hash_password(password)?);
    if !dry_run {
        store.put_admin_credentials(&credentials).await?;
        tracing::info!("Admin credentials updated in {}", store.name());
    }
    Ok(credentials)
}
