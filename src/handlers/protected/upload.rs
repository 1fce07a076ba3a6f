use axum::{
    extract::{Multipart, State},
    Extension, Json,
};
use chrono::Utc;

use crate::error::ApiError;
use crate::integrations::UploadedMedia;
use crate::middleware::CurrentTenant;
use crate::services::upload::{prepare_upload, IncomingFile, UploadError};
use crate::state::AppState;

/// Fields of the upload form; unknown parts are skipped
#[derive(Debug, Default)]
struct UploadForm {
    file: Option<IncomingFile>,
    alt: Option<String>,
    media_type: Option<String>,
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, UploadError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| UploadError::Malformed(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| UploadError::Malformed(e.body_text()))?;
                form.file = Some(IncomingFile {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            "alt" | "type" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| UploadError::Malformed(e.body_text()))?;
                if name == "alt" {
                    form.alt = Some(value);
                } else {
                    form.media_type = Some(value);
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

/// POST /api/upload - Upload an image or video for the tenant
///
/// Multipart fields: `file`, `alt` (required description) and `type` (media
/// kind used for tagging). Files land in the tenant's folder at the upload
/// provider.
pub async fn upload_post(
    State(state): State<AppState>,
    Extension(CurrentTenant(tenant)): Extension<CurrentTenant>,
    multipart: Multipart,
) -> Result<Json<UploadedMedia>, ApiError> {
    let form = read_form(multipart).await?;

    let request = prepare_upload(
        tenant.slug.as_deref(),
        form.file,
        form.alt.as_deref(),
        form.media_type.as_deref(),
        &state.config.uploads,
        Utc::now().timestamp_millis(),
    )?;

    tracing::info!(
        tenant_id = %tenant.id,
        folder = %request.folder,
        resource_type = request.resource_type.as_str(),
        bytes = request.bytes.len(),
        "Uploading media"
    );

    let media = state.uploads.upload(request).await?;

    Ok(Json(media))
}
