use std::sync::Arc;
use schoolsite_media_lib::api::{ApiConfig, HttpContentRepository};
use schoolsite_media_lib::auth::{Credential, StaticCredential};
use schoolsite_media_lib::entities::*;
use schoolsite_media_lib::error::{Entity, MediaLibraryError, ValidationError};
use schoolsite_media_lib::http::{router, ApiContext};
use schoolsite_media_lib::manager::{FetchStatus, MediaLibraryManager};
use schoolsite_media_lib::object_store::ObjectStore;
use schoolsite_media_lib::repository::{Catalog, ContentRepository};

const TOKEN: &str = "school-admin-token";

async fn start_backend() -> (String, Arc<Catalog>) {
    let catalog = Arc::new(Catalog::seeded());
    let ctx = ApiContext::new(catalog.clone(), Some(TOKEN.to_string()));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(ctx)).await.unwrap();
    });
    (format!("http://{}", addr), catalog)
}

fn manager(api_url: &str, token: Option<&str>) -> MediaLibraryManager<HttpContentRepository, StaticCredential> {
    let repository = HttpContentRepository::new(ApiConfig::new(api_url)).unwrap();
    let auth = StaticCredential::new(token.map(str::to_string));
    MediaLibraryManager::new(repository, auth, ObjectStore::new(api_url))
}

fn png(name: &str) -> MediaUpload {
    MediaUpload::new(name, "image/png", vec![137, 80, 78, 71, 13, 10, 26, 10])
}

#[tokio::test]
async fn upload_move_and_delete_over_http() {
    let (api_url, catalog) = start_backend().await;
    let mut manager = manager(&api_url, Some(TOKEN));

    let sections = manager.load_sections().await;
    assert_eq!(sections, default_sections());

    manager.select_section(Some(3)).await;
    let media = manager.upload_media(&png("graduation.png"), Some(3)).await.unwrap();
    assert_eq!(media.section_id, Some(3));
    assert_eq!(media.section_name.as_deref(), Some("Students"));
    assert_eq!(media.file_size, 8);

    let items = manager.load_filtered_media(Some(3)).await;
    assert_eq!(items.iter().map(|x| x.id).collect::<Vec<_>>(), vec![media.id]);
    assert_eq!(manager.view().status, FetchStatus::Success);

    let url = manager.resolve_url(&media);
    let bytes = reqwest::get(&url).await.unwrap().bytes().await.unwrap();
    assert_eq!(bytes.as_ref(), png("graduation.png").data.as_slice());

    manager.move_to_section(media.id, 5).await.unwrap();
    assert!(manager.view().items.is_empty());
    assert_eq!(catalog.get_media(media.id).unwrap().section_id, Some(5));

    manager.delete_media(media.id).await.unwrap();
    assert_eq!(catalog.media_count(), 0);
    let res = reqwest::get(&url).await.unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleted_section_items_move_to_general() {
    let (api_url, _) = start_backend().await;
    let mut manager = manager(&api_url, Some(TOKEN));
    manager.load_sections().await;

    let form = SectionForm::new("Events").with_color("#10B981");
    let section = manager.create_section(&form).await.unwrap();
    assert!(manager.sections().iter().any(|x| x.id == section.id && x.color == "#10B981"));

    manager.select_section(Some(section.id)).await;
    let media = manager.upload_media(&png("fair.png"), Some(section.id)).await.unwrap();
    manager.delete_section(section.id).await.unwrap();
    assert_eq!(manager.view().selected_section, None);
    assert!(!manager.sections().iter().any(|x| x.id == section.id));

    let items = manager.load_filtered_media(None).await;
    let moved = items.iter().find(|x| x.id == media.id).unwrap();
    assert_eq!(moved.section_name.as_deref(), Some(GENERAL_SECTION_NAME));
}

#[tokio::test]
async fn wrong_token_is_an_auth_error() {
    let (api_url, catalog) = start_backend().await;
    let mut manager = manager(&api_url, Some("not-the-token"));
    manager.load_sections().await;

    let result = manager.upload_media(&png("a.png"), Some(1)).await;
    assert_eq!(result, Err(MediaLibraryError::Auth));
    let result = manager.create_section(&SectionForm::new("Sports")).await;
    assert_eq!(result, Err(MediaLibraryError::Auth));
    assert_eq!(catalog.media_count(), 0);
}

#[tokio::test]
async fn backend_validates_uploads_too() {
    let (api_url, _) = start_backend().await;
    let repository = HttpContentRepository::new(ApiConfig::new(&api_url)).unwrap();
    let credential = Credential::bearer(TOKEN).unwrap();

    let pdf = MediaUpload::new("timetable.pdf", "application/pdf", vec![1, 2, 3]);
    let result = repository.upload_media(&pdf, 1, &credential).await;
    assert!(matches!(result, Err(MediaLibraryError::Network(ref message)) if message.contains("not an image")));

    let result = repository.upload_media(&png("a.png"), 99, &credential).await;
    assert_eq!(result, Err(MediaLibraryError::NotFound(Entity::Section)));

    let result = repository.update_media_section(42, 1, &credential).await;
    assert_eq!(result, Err(MediaLibraryError::NotFound(Entity::Media)));
}

#[tokio::test]
async fn client_side_checks_happen_before_the_request() {
    let mut manager = manager("http://127.0.0.1:9", Some(TOKEN));
    let result = manager.upload_media(&png("a.png"), None).await;
    assert_eq!(result, Err(ValidationError::NoSectionSelected.into()));

    let sections = manager.load_sections().await;
    assert_eq!(sections, default_sections());
    let items = manager.load_filtered_media(Some(2)).await;
    assert!(items.is_empty());
    assert_eq!(manager.view().status, FetchStatus::Failed);
}
