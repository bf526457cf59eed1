use axum::extract::{DefaultBodyLimit, Extension, Multipart, Path, Query};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use crate::api::{MEDIA_PATH, MEDIA_UPLOAD_PATH, UPLOADS_PATH};
use crate::entities::{MediaId, MediaItem, MediaUpload, SectionId, MAX_UPLOAD_SIZE_IN_BYTES};
use crate::error::Entity;
use crate::http::{ApiContext, ApiError, Result};

// multipart framing and the section_id field on top of the file itself
const BODY_LIMIT_SLACK_IN_BYTES: usize = 1_048_576;

pub fn router() -> Router {
    Router::new()
        .route(MEDIA_PATH, get(list_media))
        .route(MEDIA_UPLOAD_PATH, post(upload_media))
        .route(&format!("{}/:media_id", MEDIA_PATH), put(move_media).delete(delete_media))
        .route(&format!("{}/:name", UPLOADS_PATH), get(get_upload))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE_IN_BYTES as usize + BODY_LIMIT_SLACK_IN_BYTES))
}

#[derive(serde::Deserialize, Debug, Default)]
struct MediaFilter {
    section_id: Option<SectionId>,
}

#[derive(serde::Deserialize, Debug)]
struct MoveBody {
    section_id: SectionId,
}

async fn list_media(
    ctx: Extension<ApiContext>,
    Query(filter): Query<MediaFilter>,
) -> Json<Vec<MediaItem>> {
    Json(ctx.catalog.media(filter.section_id))
}

fn multipart_error(err: impl std::fmt::Display) -> ApiError {
    ApiError::invalid([("file", format!("multipart error: {}", err))])
}

async fn read_upload(mut multipart: Multipart) -> Result<(MediaUpload, SectionId)> {
    let mut upload = None;
    let mut section_id = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name() {
            Some("file") => {
                let file_name = field.file_name()
                    .ok_or(ApiError::invalid([("file", "filename is empty")]))?
                    .to_string();
                let content_type = field.content_type().unwrap_or("application/octet-stream").to_string();
                let data = field.bytes().await.map_err(multipart_error)?.to_vec();
                upload = Some(MediaUpload::new(file_name, content_type, data));
            }
            Some("section_id") => {
                let text = field.text().await.map_err(multipart_error)?;
                let id = text.trim().parse::<SectionId>()
                    .map_err(|_| ApiError::invalid([("section_id", "not a number")]))?;
                section_id = Some(id);
            }
            _ => (),
        }
    }
    let upload = upload.ok_or(ApiError::invalid([("file", "missing file")]))?;
    let section_id = section_id.ok_or(ApiError::invalid([("section_id", "no section selected")]))?;
    Ok((upload, section_id))
}

async fn upload_media(
    ctx: Extension<ApiContext>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<(StatusCode, Json<MediaItem>)> {
    ctx.authorize(&headers)?;
    let (upload, section_id) = read_upload(multipart).await?;
    if !upload.is_image() {
        return Err(ApiError::invalid([("file", "not an image")]));
    }
    if upload.size() > MAX_UPLOAD_SIZE_IN_BYTES {
        return Err(ApiError::invalid([("file", "file too large")]));
    }
    let media = ctx.catalog.insert_media(&upload, section_id)?;
    Ok((StatusCode::CREATED, Json(media)))
}

async fn move_media(
    ctx: Extension<ApiContext>,
    headers: HeaderMap,
    Path(media_id): Path<MediaId>,
    Json(body): Json<MoveBody>,
) -> Result<Json<MediaItem>> {
    ctx.authorize(&headers)?;
    let media = ctx.catalog.set_media_section(media_id, body.section_id)?;
    Ok(Json(media))
}

async fn delete_media(
    ctx: Extension<ApiContext>,
    headers: HeaderMap,
    Path(media_id): Path<MediaId>,
) -> Result<StatusCode> {
    ctx.authorize(&headers)?;
    ctx.catalog.remove_media(media_id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_upload(
    ctx: Extension<ApiContext>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse> {
    let data = ctx.catalog.blob(&name).ok_or(ApiError::NotFound(Entity::Media))?;
    let content_type = mime_guess::from_path(&name).first_or_octet_stream().to_string();
    Ok(([(CONTENT_TYPE, content_type)], data))
}
