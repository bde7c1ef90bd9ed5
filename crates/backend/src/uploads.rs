// =============================================================================
// Somoco Backend - Asset Upload Handlers
// =============================================================================
// Multipart bodies with a single `file` part. The response carries a reference
// ready to drop into a vehicle's image list or `document` field.
// =============================================================================

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use somoco_common::{ApiResponse, FileRef, ImageRef};

use crate::auth::AdminSession;
use crate::cms::{AssetKind, AssetUpload};
use crate::error::ApiError;
use crate::AppState;

const PDF: &str = "application/pdf";

/// Pull the `file` part out of a multipart body.
async fn read_file(mut multipart: Multipart, kind: AssetKind) -> Result<AssetUpload, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {e}")))?;
        if bytes.is_empty() {
            break;
        }
        return Ok(AssetUpload {
            kind,
            filename,
            content_type,
            bytes: bytes.to_vec(),
        });
    }
    Err(ApiError::BadRequest("No file provided".into()))
}

fn is_pdf(upload: &AssetUpload) -> bool {
    upload.content_type == PDF || upload.filename.to_ascii_lowercase().ends_with(".pdf")
}

pub async fn upload_image(
    State(state): State<AppState>,
    _session: AdminSession,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ApiResponse<ImageRef>>, ApiError> {
    let upload = read_file(multipart?, AssetKind::Image).await?;
    if !upload.content_type.starts_with("image/") {
        return Err(ApiError::BadRequest("Only image files can be uploaded here".into()));
    }

    let asset_id = state
        .store
        .upload_asset(upload)
        .await
        .map_err(ApiError::cms("Failed to upload image"))?;

    Ok(Json(ApiResponse::ok(ImageRef::new(asset_id))))
}

/// Upload a PDF spec sheet.
pub async fn upload_file(
    State(state): State<AppState>,
    _session: AdminSession,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ApiResponse<FileRef>>, ApiError> {
    let mut upload = read_file(multipart?, AssetKind::File).await?;
    if !is_pdf(&upload) {
        return Err(ApiError::BadRequest("Only PDF files are supported".into()));
    }
    upload.content_type = PDF.into();

    let title = upload
        .filename
        .rsplit_once('.')
        .map_or(upload.filename.as_str(), |(stem, _)| stem)
        .to_string();
    let asset_id = state
        .store
        .upload_asset(upload)
        .await
        .map_err(ApiError::cms("Failed to upload file"))?;

    Ok(Json(ApiResponse::ok(FileRef {
        title: Some(title),
        ..FileRef::new(asset_id)
    })))
}
