use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Map, Value};
use somoco_common::vehicle::{PARTNER_TYPE, VEHICLE_TYPE};
use somoco_common::{Partner, RankingEntry, RankingPatch, Vehicle};
use tokio::sync::RwLock;

use super::{decode_all, AdminCredentials, AssetUpload, CmsError, DocumentStore, ADMIN_CREDENTIALS_ID};

#[derive(Debug, Clone)]
struct Stored {
    seq: u64,
    doc: Value,
}

/// In-memory document store.
///
/// Mirrors the CMS semantics the API depends on: generated `_id` and
/// `_createdAt`, `disabled` documents hidden from public reads, errors on
/// patching or deleting a missing document.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: RwLock<HashMap<String, Stored>>,
    seq: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a raw document as-is. It must carry `_id`.
    pub async fn insert_document(&self, doc: Value) -> Result<(), CmsError> {
        let id = doc
            .get("_id")
            .and_then(Value::as_str)
            .ok_or_else(|| CmsError::Decode("document without _id".into()))?
            .to_string();
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        self.docs.write().await.insert(id, Stored { seq, doc });
        Ok(())
    }

    /// Raw document by id, disabled or not.
    pub async fn document(&self, id: &str) -> Option<Value> {
        self.docs.read().await.get(id).map(|s| s.doc.clone())
    }

    async fn enabled_document(&self, id: &str, doc_type: &str) -> Option<Value> {
        self.document(id)
            .await
            .filter(|doc| is_type(doc, doc_type) && is_enabled(doc))
    }

    /// Documents of one type in insertion order.
    async fn of_type(&self, doc_type: &str) -> Vec<Stored> {
        let docs = self.docs.read().await;
        let mut out: Vec<Stored> = docs
            .values()
            .filter(|s| is_type(&s.doc, doc_type))
            .cloned()
            .collect();
        out.sort_by_key(|s| s.seq);
        out
    }
}

fn is_type(doc: &Value, doc_type: &str) -> bool {
    doc.get("_type").and_then(Value::as_str) == Some(doc_type)
}

fn is_enabled(doc: &Value) -> bool {
    doc.get("disabled").and_then(Value::as_bool) != Some(true)
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list_vehicles(&self) -> Result<Vec<Vehicle>, CmsError> {
        let docs: Vec<Value> = self
            .of_type(VEHICLE_TYPE)
            .await
            .into_iter()
            .rev()
            .map(|s| s.doc)
            .filter(is_enabled)
            .collect();
        Ok(decode_all(&docs, Vehicle::from_document))
    }

    async fn get_vehicle(&self, id: &str) -> Result<Option<Vehicle>, CmsError> {
        match self.enabled_document(id, VEHICLE_TYPE).await {
            Some(doc) => Ok(Some(Vehicle::from_document(&doc)?)),
            None => Ok(None),
        }
    }

    async fn create_vehicle(&self, fields: Map<String, Value>) -> Result<Vehicle, CmsError> {
        let mut doc = fields;
        let id = uuid::Uuid::new_v4().to_string();
        doc.insert("_id".into(), Value::String(id));
        doc.insert("_type".into(), Value::String(VEHICLE_TYPE.into()));
        doc.insert("_createdAt".into(), Value::String(Utc::now().to_rfc3339()));
        let doc = Value::Object(doc);
        let vehicle = Vehicle::from_document(&doc)?;
        self.insert_document(doc).await?;
        Ok(vehicle)
    }

    async fn update_vehicle(&self, id: &str, fields: Map<String, Value>) -> Result<Vehicle, CmsError> {
        let mut docs = self.docs.write().await;
        let stored = docs
            .get_mut(id)
            .filter(|s| is_type(&s.doc, VEHICLE_TYPE))
            .ok_or_else(|| CmsError::NotFound(id.to_string()))?;
        if let Value::Object(doc) = &mut stored.doc {
            doc.extend(fields);
        }
        Ok(Vehicle::from_document(&stored.doc)?)
    }

    async fn delete_vehicle(&self, id: &str) -> Result<(), CmsError> {
        let mut docs = self.docs.write().await;
        if !docs.get(id).is_some_and(|s| is_type(&s.doc, VEHICLE_TYPE)) {
            return Err(CmsError::NotFound(id.to_string()));
        }
        docs.remove(id);
        Ok(())
    }

    async fn vehicle_documents(&self) -> Result<Vec<Value>, CmsError> {
        Ok(self.of_type(VEHICLE_TYPE).await.into_iter().map(|s| s.doc).collect())
    }

    async fn list_rankings(&self) -> Result<Vec<RankingEntry>, CmsError> {
        Ok(self
            .of_type(VEHICLE_TYPE)
            .await
            .into_iter()
            .filter_map(|s| {
                let id = s.doc.get("_id")?.as_str()?.to_string();
                Some(RankingEntry {
                    id,
                    ranking: s.doc.get("ranking").and_then(Value::as_i64),
                })
            })
            .collect())
    }

    async fn apply_rankings(&self, patches: &[RankingPatch]) -> Result<(), CmsError> {
        let mut docs = self.docs.write().await;
        if let Some(missing) = patches.iter().find(|p| !docs.contains_key(&p.id)) {
            return Err(CmsError::NotFound(missing.id.clone()));
        }
        for patch in patches {
            if let Some(Value::Object(doc)) = docs.get_mut(&patch.id).map(|s| &mut s.doc) {
                doc.insert("ranking".into(), json!(patch.ranking));
            }
        }
        Ok(())
    }

    async fn list_partners(&self) -> Result<Vec<Partner>, CmsError> {
        let docs: Vec<Value> = self
            .of_type(PARTNER_TYPE)
            .await
            .into_iter()
            .map(|s| s.doc)
            .filter(is_enabled)
            .collect();
        let mut partners = decode_all(&docs, Partner::from_document);
        partners.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(partners)
    }

    async fn get_partner(&self, id: &str) -> Result<Option<Partner>, CmsError> {
        match self.enabled_document(id, PARTNER_TYPE).await {
            Some(doc) => Ok(Some(Partner::from_document(&doc)?)),
            None => Ok(None),
        }
    }

    async fn admin_credentials(&self) -> Result<Option<AdminCredentials>, CmsError> {
        match self.document(ADMIN_CREDENTIALS_ID).await {
            Some(doc) => serde_json::from_value(doc)
                .map(Some)
                .map_err(|e| CmsError::Decode(e.to_string())),
            None => Ok(None),
        }
    }

    async fn put_admin_credentials(&self, credentials: &AdminCredentials) -> Result<(), CmsError> {
        let mut doc = serde_json::to_value(credentials).map_err(|e| CmsError::Decode(e.to_string()))?;
        if let Value::Object(map) = &mut doc {
            map.insert("_id".into(), json!(ADMIN_CREDENTIALS_ID));
            map.insert("_type".into(), json!(ADMIN_CREDENTIALS_ID));
        }
        self.insert_document(doc).await
    }

    async fn upload_asset(&self, upload: AssetUpload) -> Result<String, CmsError> {
        let ext = upload
            .filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_else(|| "bin".into());
        let hash = uuid::Uuid::new_v4().simple().to_string();
        let id = match upload.kind {
            super::AssetKind::Image => format!("image-{hash}-1x1-{ext}"),
            super::AssetKind::File => format!("file-{hash}-{ext}"),
        };
        self.insert_document(json!({
            "_id": id,
            "_type": format!("sanity.{}Asset", upload.kind.as_str()),
            "originalFilename": upload.filename,
            "mimeType": upload.content_type,
            "size": upload.bytes.len(),
        }))
        .await?;
        Ok(id)
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use somoco_common::VehicleDraft;

    #[tokio::test]
    async fn test_create_list_newest_first() {
        let store = MemoryStore::new();
        let a = store
            .create_vehicle(VehicleDraft::new("Xpeng", "G6").into_fields())
            .await
            .unwrap();
        let b = store
            .create_vehicle(VehicleDraft::new("Tesla", "Model Y").into_fields())
            .await
            .unwrap();

        let ids: Vec<_> = store.list_vehicles().await.unwrap().into_iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);
    }

    #[tokio::test]
    async fn test_disabled_hidden() {
        let store = MemoryStore::new();
        store
            .insert_document(json!({"_id": "off", "_type": "event", "brand": "BYD", "name": "Seal", "disabled": true}))
            .await
            .unwrap();

        assert!(store.list_vehicles().await.unwrap().is_empty());
        assert!(store.get_vehicle("off").await.unwrap().is_none());
        assert_eq!(store.list_rankings().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_document_errors() {
        let store = MemoryStore::new();
        assert!(matches!(store.delete_vehicle("nope").await, Err(CmsError::NotFound(_))));
        assert!(matches!(
            store.update_vehicle("nope", Map::new()).await,
            Err(CmsError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_vehicle_writes_leave_other_types_alone() {
        let store = MemoryStore::new();
        store
            .insert_document(json!({"_id": "p1", "_type": "partner", "name": "Alpha Bank"}))
            .await
            .unwrap();
        store
            .put_admin_credentials(&AdminCredentials {
                password_hash: Some("$2b$10$abc".into()),
                password_hash_b64: None,
                updated_at: None,
            })
            .await
            .unwrap();

        let fields = VehicleDraft::new("Tesla", "Model Y").into_fields();
        assert!(matches!(store.update_vehicle("p1", fields).await, Err(CmsError::NotFound(_))));
        assert!(matches!(
            store.delete_vehicle(ADMIN_CREDENTIALS_ID).await,
            Err(CmsError::NotFound(_))
        ));

        assert!(store.document("p1").await.unwrap().get("brand").is_none());
        assert!(store.admin_credentials().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_partners_sorted_enabled() {
        let store = MemoryStore::new();
        for (id, name, disabled) in [("p1", "Zed Credit", false), ("p2", "Alpha Bank", false), ("p3", "Hidden", true)] {
            store
                .insert_document(json!({"_id": id, "_type": "partner", "name": name, "disabled": disabled}))
                .await
                .unwrap();
        }
        let names: Vec<_> = store.list_partners().await.unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Alpha Bank", "Zed Credit"]);
        assert_eq!(store.get_partner("p2").await.unwrap().unwrap().name, "Alpha Bank");
        assert!(store.get_partner("p3").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_admin_credentials_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.admin_credentials().await.unwrap().is_none());

        let creds = AdminCredentials {
            password_hash: Some("$2b$10$abc".into()),
            password_hash_b64: None,
            updated_at: Some("2026-01-01T00:00:00Z".into()),
        };
        store.put_admin_credentials(&creds).await.unwrap();
        assert_eq!(store.admin_credentials().await.unwrap(), Some(creds));
    }
}
