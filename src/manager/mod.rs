//! Section-scoped media library manager.
//!
//! Reads degrade gracefully: sections fall back to a built-in set and media
//! falls back to the last full catalog fetched from the repository. Writes
//! never fall back; their errors are returned and the view is left as is.

use std::collections::HashMap;
use itertools::Itertools;
use log::{debug, error, info, warn};
use tokio::sync::watch;
use crate::auth::{Credential, CredentialProvider};
use crate::entities::*;
use crate::error::{Entity, MediaLibraryError, Result, ValidationError};
use crate::object_store::ObjectStore;
use crate::repository::ContentRepository;

mod state;

pub use state::{FetchStatus, SectionsSource, ViewState};

pub struct MediaLibraryManager<R, A> {
    repository: R,
    auth: A,
    object_store: ObjectStore,
    sections: Vec<MediaSection>,
    sections_source: SectionsSource,
    catalog: Option<Vec<MediaItem>>,
    view: ViewState,
    publisher: watch::Sender<ViewState>,
}

impl<R, A> MediaLibraryManager<R, A>
where
    R: ContentRepository,
    A: CredentialProvider,
{
    pub fn new(repository: R, auth: A, object_store: ObjectStore) -> Self {
        let view = ViewState::default();
        let (publisher, _) = watch::channel(view.clone());
        Self {
            repository,
            auth,
            object_store,
            sections: Vec::new(),
            sections_source: SectionsSource::Unloaded,
            catalog: None,
            view,
            publisher,
        }
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn sections(&self) -> &[MediaSection] {
        &self.sections
    }

    pub fn sections_source(&self) -> SectionsSource {
        self.sections_source
    }

    /// Last full catalog fetched from the repository, if any.
    pub fn cached_catalog(&self) -> Option<&[MediaItem]> {
        self.catalog.as_deref()
    }

    /// Receives a snapshot after every view change.
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.publisher.subscribe()
    }

    fn publish(&self) {
        self.publisher.send_replace(self.view.clone());
    }

    fn credential(&self) -> Result<Credential> {
        self.auth.credential().ok_or(MediaLibraryError::Auth)
    }

    pub fn resolve_url(&self, media: &MediaItem) -> String {
        self.object_store.display_url(media)
    }

    /// Reloads the section list. When the selected section is gone the
    /// filter is reset and the unfiltered list is fetched again; otherwise
    /// shown and cached items are re-checked against the new list.
    pub async fn load_sections(&mut self) -> Vec<MediaSection> {
        match self.repository.list_sections().await {
            Ok(sections) => {
                info!("Loaded {} media section(s)", sections.len());
                self.sections = sections;
                self.sections_source = SectionsSource::Repository;
            }
            Err(e) => {
                warn!("Failed to load media sections, using built-in sections: {}", e);
                self.sections = default_sections();
                self.sections_source = SectionsSource::BuiltIn;
            }
        }
        self.view.sections = self.sections.clone();
        let missing = self.view.selected_section.filter(|&id| self.is_missing_section(id));
        match missing {
            Some(selected) => {
                info!("Selected section {} no longer exists, showing all media", selected);
                self.load_filtered_media(None).await;
            }
            None => {
                self.detach_stale_references();
                self.publish();
            }
        }
        self.sections.clone()
    }

    fn is_missing_section(&self, id: SectionId) -> bool {
        self.sections_source == SectionsSource::Repository && !self.sections.iter().any(|x| x.id == id)
    }

    fn has_unknown_section(&self, items: &[MediaItem]) -> bool {
        items.iter()
            .filter_map(|x| x.section_id)
            .any(|id| self.is_missing_section(id))
    }

    /// Picks up sections created elsewhere without touching the filter.
    async fn refresh_sections(&mut self) {
        match self.repository.list_sections().await {
            Ok(sections) => {
                debug!("Refreshed {} media section(s)", sections.len());
                self.sections = sections;
                self.view.sections = self.sections.clone();
            }
            Err(e) => warn!("Failed to refresh media sections: {}", e),
        }
    }

    fn detach_stale_references(&mut self) {
        if self.sections_source != SectionsSource::Repository {
            return;
        }
        let sections = &self.sections;
        for item in self.view.items.iter_mut().chain(self.catalog.iter_mut().flatten()) {
            item.detach_from_missing_section(sections);
        }
    }

    pub async fn select_section(&mut self, section_id: Option<SectionId>) -> Vec<MediaItem> {
        self.load_filtered_media(section_id).await
    }

    pub async fn retry(&mut self) -> Vec<MediaItem> {
        self.load_filtered_media(self.view.selected_section).await
    }

    pub fn dismiss_warning(&mut self) {
        if self.view.warning.take().is_some() {
            self.publish();
        }
    }

    /// Loads the items of one section, or all items for `None`.
    ///
    /// Never fails: when the repository is unreachable the result comes from
    /// the cached catalog (`Fallback`) or is empty (`Failed`).
    pub async fn load_filtered_media(&mut self, section_id: Option<SectionId>) -> Vec<MediaItem> {
        self.view.selected_section = section_id;
        self.view.status = FetchStatus::Loading;
        self.publish();

        let mut result = self.fetch_media(section_id).await;
        if result.is_ok() && section_id.is_some_and(|id| self.is_missing_section(id)) {
            self.refresh_sections().await;
            let missing = section_id.filter(|&id| self.is_missing_section(id));
            if let Some(missing) = missing {
                info!("Section {} no longer exists, showing all media", missing);
                self.view.selected_section = None;
                result = self.fetch_media(None).await;
            }
        }
        let section_id = self.view.selected_section;

        match result {
            Ok(items) => {
                if section_id.is_none() {
                    self.catalog = Some(items.clone());
                }
                self.view.items = items;
                self.view.status = FetchStatus::Success;
                self.view.warning = None;
                self.view.error = None;
            }
            Err(e) => match &self.catalog {
                Some(catalog) => {
                    warn!("Failed to load media, using cached data: {}", e);
                    self.view.items = catalog.iter()
                        .filter(|x| x.is_in_section(section_id))
                        .cloned()
                        .collect();
                    self.view.status = FetchStatus::Fallback;
                    self.view.warning = Some(format!("Using cached data: {}", e));
                    self.view.error = None;
                }
                None => {
                    error!("Failed to load media: {}", e);
                    self.view.items.clear();
                    self.view.status = FetchStatus::Failed;
                    self.view.warning = None;
                    self.view.error = Some(format!("Failed to load media, check backend connection: {}", e));
                }
            },
        }
        self.publish();
        self.view.items.clone()
    }

    /// A reference to a section missing from the current list triggers one
    /// section reload before it is treated as dangling.
    async fn fetch_media(&mut self, section_id: Option<SectionId>) -> Result<Vec<MediaItem>> {
        let items = self.repository.list_media(section_id).await?;
        if self.has_unknown_section(&items) {
            self.refresh_sections().await;
        }
        Ok(self.normalize(items))
    }

    /// Dangling section references only count as dangling against sections
    /// the repository itself reported.
    fn normalize(&self, items: Vec<MediaItem>) -> Vec<MediaItem> {
        if self.sections_source != SectionsSource::Repository {
            return items;
        }
        items.into_iter()
            .map(|mut x| {
                let section_id = x.section_id;
                if x.detach_from_missing_section(&self.sections) {
                    warn!("Media {} references unknown section {:?}, treating it as unsectioned", x.id, section_id);
                }
                x
            })
            .collect()
    }

    pub async fn upload_media(&mut self, upload: &MediaUpload, section_id: Option<SectionId>) -> Result<MediaItem> {
        let section_id = section_id.ok_or(ValidationError::NoSectionSelected)?;
        let credential = self.credential()?;
        if !upload.is_image() {
            return Err(ValidationError::NotAnImage.into());
        }
        if upload.size() > MAX_UPLOAD_SIZE_IN_BYTES {
            return Err(ValidationError::FileTooLarge { size: upload.size(), limit: MAX_UPLOAD_SIZE_IN_BYTES }.into());
        }

        info!("Uploading {} ({} bytes) into section {}", upload.file_name, upload.size(), section_id);
        let media = self.repository.upload_media(upload, section_id, &credential).await?;
        self.load_filtered_media(self.view.selected_section).await;
        Ok(media)
    }

    /// Confirmation is the caller's job. The item stays in the view until
    /// the repository has deleted it.
    pub async fn delete_media(&mut self, media_id: MediaId) -> Result<()> {
        let credential = self.credential()?;
        self.repository.delete_media(media_id, &credential).await?;
        info!("Deleted media {}", media_id);
        self.load_filtered_media(self.view.selected_section).await;
        Ok(())
    }

    pub async fn move_to_section(&mut self, media_id: MediaId, target_section_id: SectionId) -> Result<()> {
        if !self.sections.iter().any(|x| x.id == target_section_id) {
            return Err(MediaLibraryError::NotFound(Entity::Section));
        }
        let media = self.find_media(media_id).ok_or(MediaLibraryError::NotFound(Entity::Media))?;
        if media.section_id == Some(target_section_id) {
            return Err(ValidationError::AlreadyInSection.into());
        }
        let credential = self.credential()?;

        self.repository.update_media_section(media_id, target_section_id, &credential).await?;
        info!("Moved media {} to section {}", media_id, target_section_id);
        self.load_filtered_media(self.view.selected_section).await;
        Ok(())
    }

    fn find_media(&self, media_id: MediaId) -> Option<&MediaItem> {
        self.view.items.iter()
            .chain(self.catalog.iter().flatten())
            .find(|x| x.id == media_id)
    }

    pub async fn create_section(&mut self, form: &SectionForm) -> Result<MediaSection> {
        let form = form.normalized()?;
        let credential = self.credential()?;
        let section = self.repository.create_section(&form, &credential).await?;
        info!("Created section {} ({})", section.name, section.id);
        self.load_sections().await;
        Ok(section)
    }

    pub async fn update_section(&mut self, id: SectionId, form: &SectionForm) -> Result<MediaSection> {
        let form = form.normalized()?;
        let credential = self.credential()?;
        let section = self.repository.update_section(id, &form, &credential).await?;
        info!("Updated section {} ({})", section.name, section.id);
        self.load_sections().await;
        Ok(section)
    }

    /// Items of the deleted section are moved to "General" by the repository.
    pub async fn delete_section(&mut self, id: SectionId) -> Result<()> {
        let credential = self.credential()?;
        self.repository.delete_section(id, &credential).await?;
        info!("Deleted section {}", id);
        if self.view.selected_section == Some(id) {
            self.view.selected_section = None;
        }
        self.load_sections().await;
        self.load_filtered_media(self.view.selected_section).await;
        Ok(())
    }

    /// Item count per section over the cached catalog (or the current view
    /// when nothing is cached). Unsectioned items are counted under `None`.
    pub fn section_counts(&self) -> HashMap<Option<SectionId>, usize> {
        self.catalog.as_deref()
            .unwrap_or(&self.view.items)
            .iter()
            .counts_by(|x| x.section_id)
    }
}
