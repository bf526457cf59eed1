use async_trait::async_trait;
use crate::auth::Credential;
use crate::entities::{MediaId, MediaItem, MediaSection, MediaUpload, SectionForm, SectionId};
use crate::error::Result;

mod catalog;
mod memory;

pub use catalog::{Catalog, CatalogError};
pub use memory::InMemoryRepository;

/// Persistence boundary of the media library.
///
/// Every mutating call takes the bearer credential of the current user.
/// Deleting a section moves its items to the "General" section.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    async fn list_sections(&self) -> Result<Vec<MediaSection>>;
    async fn create_section(&self, form: &SectionForm, credential: &Credential) -> Result<MediaSection>;
    async fn update_section(&self, id: SectionId, form: &SectionForm, credential: &Credential) -> Result<MediaSection>;
    async fn delete_section(&self, id: SectionId, credential: &Credential) -> Result<()>;

    /// `None` lists every item.
    async fn list_media(&self, section_id: Option<SectionId>) -> Result<Vec<MediaItem>>;
    async fn upload_media(&self, upload: &MediaUpload, section_id: SectionId, credential: &Credential) -> Result<MediaItem>;
    async fn update_media_section(&self, id: MediaId, section_id: SectionId, credential: &Credential) -> Result<MediaItem>;
    async fn delete_media(&self, id: MediaId, credential: &Credential) -> Result<()>;
}
