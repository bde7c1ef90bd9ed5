// =============================================================================
// Somoco Backend - Sanity HTTP Client
// =============================================================================
// Reads use GROQ through the query endpoint (never the API CDN, so admin edits
// are visible immediately). Writes go through the mutate endpoint with
// `returnDocuments=true`. Uploads stream the raw bytes to the assets endpoint.
// =============================================================================

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use somoco_common::vehicle::VEHICLE_TYPE;
use somoco_common::{Partner, RankingEntry, RankingPatch, Vehicle};
use url::Url;

use super::{
    decode_all, AdminCredentials, AssetKind, AssetUpload, CmsError, DocumentStore,
    ADMIN_CREDENTIALS_ID,
};
use crate::config::CmsConfig;

// -----------------------------------------------------------------------------
// Queries
// -----------------------------------------------------------------------------

const LIST_VEHICLES: &str = r#"*[_type == "event" && disabled != true] | order(_createdAt desc)"#;
const GET_VEHICLE: &str = r#"*[_type == "event" && _id == $id && disabled != true][0]"#;
const ALL_VEHICLES: &str = r#"*[_type == "event"]"#;
const LIST_RANKINGS: &str =
    r#"*[_type == "event" && !(_id in path("drafts.**"))]{ _id, ranking }"#;
const LIST_PARTNERS: &str = r#"*[_type == "partner" && disabled != true] | order(name asc)"#;
const GET_PARTNER: &str = r#"*[_type == "partner" && _id == $id && disabled != true][0]"#;
const GET_BY_ID: &str = r#"*[_id == $id][0]"#;
/// Mutation target for vehicle writes, so an id of another type matches nothing.
const VEHICLE_BY_ID: &str = r#"*[_type == "event" && _id == $id]"#;

// -----------------------------------------------------------------------------
// Response Types
// -----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct QueryResponse {
    result: Value,
}

#[derive(Debug, Deserialize)]
struct MutateResponse {
    #[serde(default)]
    results: Vec<MutationResult>,
}

#[derive(Debug, Deserialize)]
struct MutationResult {
    #[serde(default)]
    document: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct AssetResponse {
    document: AssetDocument,
}

#[derive(Debug, Deserialize)]
struct AssetDocument {
    #[serde(rename = "_id")]
    id: String,
}

#[derive(Debug, Deserialize)]
struct RankingRow {
    #[serde(rename = "_id")]
    id: String,
    #[serde(default)]
    ranking: Option<i64>,
}

// -----------------------------------------------------------------------------
// Client
// -----------------------------------------------------------------------------

/// Document store backed by the hosted CMS.
#[derive(Clone)]
pub struct SanityClient {
    http: Client,
    base: Url,
    dataset: String,
    token: Option<String>,
}

impl SanityClient {
    pub fn new(config: &CmsConfig) -> Result<Self, CmsError> {
        let base = Url::parse(&format!(
            "https://{}.api.sanity.io/v{}/",
            config.project_id, config.api_version
        ))
        .map_err(|e| CmsError::Decode(format!("invalid CMS base URL: {e}")))?;
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            base,
            dataset: config.dataset.clone(),
            token: config.token.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, CmsError> {
        self.base
            .join(&format!("{}/{}", path, self.dataset))
            .map_err(|e| CmsError::Decode(format!("invalid CMS URL: {e}")))
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn check(response: Response) -> Result<Response, CmsError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        // Error bodies look like {"error": {"description": "..."}}
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| {
                v.pointer("/error/description")
                    .or_else(|| v.get("message"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or(body);
        Err(CmsError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn query(&self, groq: &str, params: &[(&str, &str)]) -> Result<Value, CmsError> {
        let mut query: Vec<(String, String)> = vec![("query".into(), groq.into())];
        for (name, value) in params {
            // Parameters are JSON-encoded values
            query.push((format!("${name}"), Value::String(value.to_string()).to_string()));
        }

        let req = self.http.get(self.endpoint("data/query")?).query(&query);
        let response = Self::check(self.authorized(req).send().await?).await?;
        let body: QueryResponse = response.json().await?;
        Ok(body.result)
    }

    async fn mutate(&self, mutations: Vec<Value>) -> Result<Vec<MutationResult>, CmsError> {
        let mut url = self.endpoint("data/mutate")?;
        url.query_pairs_mut()
            .append_pair("returnIds", "true")
            .append_pair("returnDocuments", "true")
            .append_pair("visibility", "sync");

        let req = self.http.post(url).json(&json!({ "mutations": mutations }));
        let response = Self::check(self.authorized(req).send().await?).await?;
        let body: MutateResponse = response.json().await?;
        Ok(body.results)
    }

    fn single_document(results: Vec<MutationResult>, id: &str) -> Result<Value, CmsError> {
        results
            .into_iter()
            .next()
            .and_then(|r| r.document)
            .ok_or_else(|| CmsError::NotFound(id.to_string()))
    }
}

#[async_trait]
impl DocumentStore for SanityClient {
    async fn list_vehicles(&self) -> Result<Vec<Vehicle>, CmsError> {
        let result = self.query(LIST_VEHICLES, &[]).await?;
        let docs = result.as_array().cloned().unwrap_or_default();
        Ok(decode_all(&docs, Vehicle::from_document))
    }

    async fn get_vehicle(&self, id: &str) -> Result<Option<Vehicle>, CmsError> {
        let result = self.query(GET_VEHICLE, &[("id", id)]).await?;
        if result.is_null() {
            return Ok(None);
        }
        Ok(Some(Vehicle::from_document(&result)?))
    }

    async fn create_vehicle(&self, fields: Map<String, Value>) -> Result<Vehicle, CmsError> {
        let mut doc = fields;
        doc.insert("_type".into(), Value::String(VEHICLE_TYPE.into()));
        let results = self.mutate(vec![json!({ "create": doc })]).await?;
        let created = Self::single_document(results, "(new vehicle)")?;
        tracing::info!(id = ?created.get("_id"), "vehicle created");
        Ok(Vehicle::from_document(&created)?)
    }

    async fn update_vehicle(&self, id: &str, fields: Map<String, Value>) -> Result<Vehicle, CmsError> {
        let results = self
            .mutate(vec![json!({
                "patch": { "query": VEHICLE_BY_ID, "params": { "id": id }, "set": fields }
            })])
            .await?;
        let updated = Self::single_document(results, id)?;
        Ok(Vehicle::from_document(&updated)?)
    }

    async fn delete_vehicle(&self, id: &str) -> Result<(), CmsError> {
        // A delete that matches nothing is a silent no-op upstream; an empty
        // result list is how we tell.
        let results = self
            .mutate(vec![json!({
                "delete": { "query": VEHICLE_BY_ID, "params": { "id": id } }
            })])
            .await?;
        if results.is_empty() {
            return Err(CmsError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn vehicle_documents(&self) -> Result<Vec<Value>, CmsError> {
        let result = self.query(ALL_VEHICLES, &[]).await?;
        Ok(result.as_array().cloned().unwrap_or_default())
    }

    async fn list_rankings(&self) -> Result<Vec<RankingEntry>, CmsError> {
        let result = self.query(LIST_RANKINGS, &[]).await?;
        let rows: Vec<RankingRow> =
            serde_json::from_value(result).map_err(|e| CmsError::Decode(e.to_string()))?;
        Ok(rows
            .into_iter()
            .map(|row| RankingEntry {
                id: row.id,
                ranking: row.ranking,
            })
            .collect())
    }

    async fn apply_rankings(&self, patches: &[RankingPatch]) -> Result<(), CmsError> {
        if patches.is_empty() {
            return Ok(());
        }
        let mutations = patches
            .iter()
            .map(|p| json!({ "patch": { "id": p.id, "set": { "ranking": p.ranking } } }))
            .collect();
        self.mutate(mutations).await?;
        Ok(())
    }

    async fn list_partners(&self) -> Result<Vec<Partner>, CmsError> {
        let result = self.query(LIST_PARTNERS, &[]).await?;
        let docs = result.as_array().cloned().unwrap_or_default();
        Ok(decode_all(&docs, Partner::from_document))
    }

    async fn get_partner(&self, id: &str) -> Result<Option<Partner>, CmsError> {
        let result = self.query(GET_PARTNER, &[("id", id)]).await?;
        if result.is_null() {
            return Ok(None);
        }
        Ok(Some(Partner::from_document(&result)?))
    }

    async fn admin_credentials(&self) -> Result<Option<AdminCredentials>, CmsError> {
        let result = self.query(GET_BY_ID, &[("id", ADMIN_CREDENTIALS_ID)]).await?;
        if result.is_null() {
            return Ok(None);
        }
        serde_json::from_value(result)
            .map(Some)
            .map_err(|e| CmsError::Decode(e.to_string()))
    }

    async fn put_admin_credentials(&self, credentials: &AdminCredentials) -> Result<(), CmsError> {
        let updated_at = credentials
            .updated_at
            .clone()
            .unwrap_or_else(|| Utc::now().to_rfc3339());
        let doc = json!({
            "_id": ADMIN_CREDENTIALS_ID,
            "_type": ADMIN_CREDENTIALS_ID,
            "passwordHash": credentials.password_hash,
            "passwordHashB64": credentials.password_hash_b64,
            "updatedAt": updated_at,
        });
        self.mutate(vec![json!({ "createOrReplace": doc })]).await?;
        Ok(())
    }

    async fn upload_asset(&self, upload: AssetUpload) -> Result<String, CmsError> {
        let path = match upload.kind {
            AssetKind::Image => "assets/images",
            AssetKind::File => "assets/files",
        };
        let mut url = self.endpoint(path)?;
        url.query_pairs_mut().append_pair("filename", &upload.filename);

        let req = self
            .http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, upload.content_type)
            .body(upload.bytes);
        let response = Self::check(self.authorized(req).send().await?).await?;
        let asset: AssetResponse = response.json().await?;
        tracing::info!(asset = %asset.document.id, "asset uploaded");
        Ok(asset.document.id)
    }

    fn name(&self) -> &str {
        "sanity"
    }
}
