use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use async_trait::async_trait;
use crate::auth::{is_token_valid, Credential};
use crate::entities::*;
use crate::error::{Entity, MediaLibraryError, Result};
use crate::repository::{Catalog, CatalogError, ContentRepository};

/// Repository backed by an in-process [`Catalog`].
///
/// Clones share the catalog, the call counter and the offline switch, so a
/// test can keep one handle while the manager owns another.
#[derive(Clone, Debug)]
pub struct InMemoryRepository {
    catalog: Arc<Catalog>,
    expected_token: Option<Arc<str>>,
    calls: Arc<AtomicUsize>,
    offline: Arc<AtomicBool>,
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new(Arc::new(Catalog::seeded()))
    }
}

impl InMemoryRepository {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            expected_token: None,
            calls: Arc::new(AtomicUsize::new(0)),
            offline: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Rejects mutations whose credential differs from `token`.
    pub fn with_token(mut self, token: &str) -> Self {
        self.expected_token = Some(Arc::from(token));
        self
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Makes every following call fail as if the backend were unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of calls received so far, including failed ones.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn begin(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(MediaLibraryError::network("content repository is unreachable"));
        }
        Ok(())
    }

    fn begin_write(&self, credential: &Credential) -> Result<()> {
        self.begin()?;
        if let Some(expected) = &self.expected_token {
            is_token_valid(Some(credential.token()), expected).map_err(|_| MediaLibraryError::Auth)?;
        }
        Ok(())
    }
}

impl From<CatalogError> for MediaLibraryError {
    fn from(value: CatalogError) -> Self {
        match value {
            CatalogError::SectionNotFound => MediaLibraryError::NotFound(Entity::Section),
            CatalogError::MediaNotFound => MediaLibraryError::NotFound(Entity::Media),
        }
    }
}

#[async_trait]
impl ContentRepository for InMemoryRepository {
    async fn list_sections(&self) -> Result<Vec<MediaSection>> {
        self.begin()?;
        Ok(self.catalog.sections())
    }

    async fn create_section(&self, form: &SectionForm, credential: &Credential) -> Result<MediaSection> {
        self.begin_write(credential)?;
        let form = form.normalized()?;
        Ok(self.catalog.insert_section(&form))
    }

    async fn update_section(&self, id: SectionId, form: &SectionForm, credential: &Credential) -> Result<MediaSection> {
        self.begin_write(credential)?;
        let form = form.normalized()?;
        Ok(self.catalog.update_section(id, &form)?)
    }

    async fn delete_section(&self, id: SectionId, credential: &Credential) -> Result<()> {
        self.begin_write(credential)?;
        self.catalog.remove_section(id)?;
        Ok(())
    }

    async fn list_media(&self, section_id: Option<SectionId>) -> Result<Vec<MediaItem>> {
        self.begin()?;
        Ok(self.catalog.media(section_id))
    }

    async fn upload_media(&self, upload: &MediaUpload, section_id: SectionId, credential: &Credential) -> Result<MediaItem> {
        self.begin_write(credential)?;
        Ok(self.catalog.insert_media(upload, section_id)?)
    }

    async fn update_media_section(&self, id: MediaId, section_id: SectionId, credential: &Credential) -> Result<MediaItem> {
        self.begin_write(credential)?;
        Ok(self.catalog.set_media_section(id, section_id)?)
    }

    async fn delete_media(&self, id: MediaId, credential: &Credential) -> Result<()> {
        self.begin_write(credential)?;
        self.catalog.remove_media(id)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn offline_repository_fails_and_counts_calls() {
        let repository = InMemoryRepository::default();
        assert_eq!(repository.list_sections().await.unwrap().len(), 6);
        repository.set_offline(true);
        assert!(matches!(repository.list_media(None).await, Err(MediaLibraryError::Network(_))));
        assert_eq!(repository.call_count(), 2);
    }

    #[tokio::test]
    async fn writes_check_the_token() {
        let repository = InMemoryRepository::default().with_token("secret");
        let wrong = Credential::bearer("nope").unwrap();
        let right = Credential::bearer("secret").unwrap();
        let form = SectionForm::new("Sports");
        assert_eq!(repository.create_section(&form, &wrong).await, Err(MediaLibraryError::Auth));
        let section = repository.create_section(&form, &right).await.unwrap();
        assert_eq!(section.name, "Sports");
    }

    #[tokio::test]
    async fn missing_entities_are_not_found() {
        let repository = InMemoryRepository::default();
        let credential = Credential::bearer("any").unwrap();
        assert_eq!(
            repository.delete_media(42, &credential).await,
            Err(MediaLibraryError::NotFound(Entity::Media)),
        );
        assert_eq!(
            repository.delete_section(42, &credential).await,
            Err(MediaLibraryError::NotFound(Entity::Section)),
        );
    }
}
