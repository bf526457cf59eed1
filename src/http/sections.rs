use axum::extract::{Extension, Path};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, put};
use axum::{Json, Router};
use crate::api::MEDIA_SECTIONS_PATH;
use crate::entities::{MediaSection, SectionForm, SectionId};
use crate::http::{ApiContext, ApiError, Result};

pub fn router() -> Router {
    Router::new()
        .route(MEDIA_SECTIONS_PATH, get(list_sections).post(create_section))
        .route(&format!("{}/:section_id", MEDIA_SECTIONS_PATH), put(update_section).delete(delete_section))
}

fn validate(form: &SectionForm) -> Result<SectionForm> {
    form.normalized()
        .map_err(|e| ApiError::invalid([("name", e.to_string())]))
}

async fn list_sections(
    ctx: Extension<ApiContext>,
) -> Json<Vec<MediaSection>> {
    Json(ctx.catalog.sections())
}

async fn create_section(
    ctx: Extension<ApiContext>,
    headers: HeaderMap,
    Json(form): Json<SectionForm>,
) -> Result<(StatusCode, Json<MediaSection>)> {
    ctx.authorize(&headers)?;
    let form = validate(&form)?;
    let section = ctx.catalog.insert_section(&form);
    Ok((StatusCode::CREATED, Json(section)))
}

async fn update_section(
    ctx: Extension<ApiContext>,
    headers: HeaderMap,
    Path(section_id): Path<SectionId>,
    Json(form): Json<SectionForm>,
) -> Result<Json<MediaSection>> {
    ctx.authorize(&headers)?;
    let form = validate(&form)?;
    let section = ctx.catalog.update_section(section_id, &form)?;
    Ok(Json(section))
}

async fn delete_section(
    ctx: Extension<ApiContext>,
    headers: HeaderMap,
    Path(section_id): Path<SectionId>,
) -> Result<StatusCode> {
    ctx.authorize(&headers)?;
    ctx.catalog.remove_section(section_id)?;
    Ok(StatusCode::NO_CONTENT)
}
