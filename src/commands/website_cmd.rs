//! Website Content Handlers
//!
//! Opening hours, contact block and gallery for the public site.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::auth::RequireAdmin;
use crate::domain::{DomainError, GalleryUpload, WebsiteData, WebsiteUpdate};
use crate::repository::{ContactOperations, OpeningHoursOperations, Repository};
use crate::AppState;
use super::response::{no_cache, parse_body, success, ApiResult};

/// GET /api/website
///
/// Picks up image files dropped into the gallery directory first; a failed
/// scan is logged and the stored gallery is served as is.
pub async fn get_website(State(state): State<AppState>) -> ApiResult<Response> {
    if let Err(e) = state.gallery_repo.sync_directory().await {
        tracing::warn!(error = %e, "Gallery sync failed");
    }

    let data = WebsiteData {
        days: state.website_repo.list_opening_hours().await?,
        contact: state.website_repo.load_contact().await?,
        images: state.gallery_repo.list().await?,
    };
    let body = serde_json::to_value(&data).map_err(|e| DomainError::Internal(e.to_string()))?;
    Ok(no_cache(success(body)))
}

/// POST /api/website, dispatched on `type`
pub async fn save_website(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let update: WebsiteUpdate = parse_body(&body)?;
    let kind = update.kind();

    let result = match update {
        WebsiteUpdate::OpeningHours { days } => state.website_repo.update_opening_hours(&days).await,
        WebsiteUpdate::ContactInfo { contact } => state.website_repo.save_contact(&contact).await.map(|_| ()),
        WebsiteUpdate::UpdateImage { image } => state.gallery_repo.update_image(&image).await.map(|_| ()),
        WebsiteUpdate::DeleteImage { id } => state.gallery_repo.delete_image(&id).await.map(|_| ()),
        WebsiteUpdate::ReorderImages { ids } => state.gallery_repo.reorder_images(&ids).await,
    };
    if let Err(e) = &result {
        tracing::warn!(kind, error = %e, "Website save failed");
    }
    result?;

    tracing::info!(kind, "Website content saved");
    Ok(success(json!({})))
}

/// POST /api/gallery/upload
pub async fn upload_gallery_image(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let upload: GalleryUpload = parse_body(&body)?;
    let image = state.gallery_repo.upload(&upload).await?;
    let image = serde_json::to_value(&image).map_err(|e| DomainError::Internal(e.to_string()))?;
    Ok(success(json!({ "image": image })))
}

/// GET <gallery url prefix>/{file}: the stored image bytes
pub async fn serve_gallery_file(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> ApiResult<Response> {
    let settings = state.gallery_repo.settings();
    let path = settings
        .file_for(&settings.src_for(&file))
        .ok_or_else(|| DomainError::not_found("Image not found"))?;

    let content = match tokio::fs::read(&path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(DomainError::not_found("Image not found").into());
        }
        Err(e) => return Err(DomainError::from(e).into()),
    };
    let mime_type = mime_guess::from_path(&path).first_or_octet_stream();
    Ok(([(header::CONTENT_TYPE, mime_type.to_string())], content).into_response())
}
