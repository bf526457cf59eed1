use std::sync::atomic::{AtomicI64, Ordering};
use dashmap::DashMap;
use itertools::Itertools;
use log::info;
use thiserror::Error;
use uuid::Uuid;
use crate::entities::*;

const UPLOADS_PREFIX: &str = "/uploads/";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("section not found")]
    SectionNotFound,
    #[error("media item not found")]
    MediaNotFound,
}

/// Canonical in-memory collections of sections, media items and their bytes.
#[derive(Debug)]
pub struct Catalog {
    sections: DashMap<SectionId, MediaSection>,
    media: DashMap<MediaId, MediaItem>,
    blobs: DashMap<String, Vec<u8>>,
    next_section_id: AtomicI64,
    next_media_id: AtomicI64,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            sections: DashMap::new(),
            media: DashMap::new(),
            blobs: DashMap::new(),
            next_section_id: AtomicI64::new(1),
            next_media_id: AtomicI64::new(1),
        }
    }
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog holding the built-in sections and no media.
    pub fn seeded() -> Self {
        let catalog = Self::new();
        for section in default_sections() {
            catalog.insert_section_record(section);
        }
        catalog
    }

    pub fn insert_section_record(&self, section: MediaSection) {
        self.next_section_id.fetch_max(section.id + 1, Ordering::SeqCst);
        self.sections.insert(section.id, section);
    }

    /// Inserts an item as-is; references to unknown sections are kept.
    pub fn insert_media_record(&self, media: MediaItem) {
        self.next_media_id.fetch_max(media.id + 1, Ordering::SeqCst);
        self.media.insert(media.id, media);
    }

    pub fn sections(&self) -> Vec<MediaSection> {
        self.sections.iter()
            .map(|x| x.value().clone())
            .sorted_by_key(|x| x.id)
            .collect()
    }

    pub fn get_section(&self, id: SectionId) -> Option<MediaSection> {
        self.sections.get(&id).map(|x| x.value().clone())
    }

    pub fn media_count(&self) -> usize {
        self.media.len()
    }

    pub fn insert_section(&self, form: &SectionForm) -> MediaSection {
        let id = self.next_section_id.fetch_add(1, Ordering::SeqCst);
        let section = MediaSection {
            id,
            name: form.name.clone(),
            description: form.description.clone(),
            color: form.color.clone().unwrap_or_else(|| DEFAULT_SECTION_COLOR.to_string()),
        };
        self.sections.insert(id, section.clone());
        info!("Section created: {} ({})", section.name, section.id);
        section
    }

    pub fn update_section(&self, id: SectionId, form: &SectionForm) -> Result<MediaSection, CatalogError> {
        let mut entry = self.sections.get_mut(&id).ok_or(CatalogError::SectionNotFound)?;
        let section = entry.value_mut();
        section.name = form.name.clone();
        section.description = form.description.clone();
        if let Some(color) = &form.color {
            section.color = color.clone();
        }
        Ok(section.clone())
    }

    /// Removes a section and moves its items to "General", creating that
    /// section when it does not exist. Items of a deleted "General" section
    /// become unsectioned. Returns the ids of the moved items.
    pub fn remove_section(&self, id: SectionId) -> Result<Vec<MediaId>, CatalogError> {
        let (_, removed) = self.sections.remove(&id).ok_or(CatalogError::SectionNotFound)?;
        let orphans = self.media.iter()
            .filter(|x| x.value().section_id == Some(id))
            .map(|x| *x.key())
            .collect::<Vec<MediaId>>();
        let fallback = if removed.is_general() || orphans.is_empty() {
            None
        } else {
            Some(self.general_section())
        };
        for media_id in &orphans {
            if let Some(mut entry) = self.media.get_mut(media_id) {
                match &fallback {
                    Some(general) => entry.value_mut().assign_section(general),
                    None => entry.value_mut().clear_section(),
                }
            }
        }
        info!("Section deleted: {} ({}), {} item(s) reassigned", removed.name, removed.id, orphans.len());
        Ok(orphans)
    }

    fn general_section(&self) -> MediaSection {
        let existing = self.sections.iter()
            .filter(|x| x.value().is_general())
            .map(|x| x.value().clone())
            .min_by_key(|x| x.id);
        match existing {
            Some(section) => section,
            None => self.insert_section(&SectionForm {
                name: GENERAL_SECTION_NAME.to_string(),
                description: None,
                color: Some(DEFAULT_SECTION_COLOR.to_string()),
            }),
        }
    }

    /// Items of one section (or all), ordered by id, with section display
    /// fields taken from the current sections.
    pub fn media(&self, section_id: Option<SectionId>) -> Vec<MediaItem> {
        let items = self.media.iter()
            .filter(|x| x.value().is_in_section(section_id))
            .map(|x| x.value().clone())
            .collect_vec();
        items.into_iter()
            .map(|x| self.with_section_fields(x))
            .sorted_by_key(|x| x.id)
            .collect()
    }

    pub fn get_media(&self, id: MediaId) -> Option<MediaItem> {
        let media = self.media.get(&id)?.value().clone();
        Some(self.with_section_fields(media))
    }

    fn with_section_fields(&self, mut media: MediaItem) -> MediaItem {
        if let Some(section) = media.section_id.and_then(|x| self.get_section(x)) {
            media.assign_section(&section);
        }
        media
    }

    /// Section locks are taken before media locks, never the other way round.
    /// The target section stays locked until the item is stored, so a
    /// concurrent `remove_section` either rejects the upload or reassigns it.
    pub fn insert_media(&self, upload: &MediaUpload, section_id: SectionId) -> Result<MediaItem, CatalogError> {
        let section = self.sections.get(&section_id).ok_or(CatalogError::SectionNotFound)?;
        let blob_name = format!("{}-{}", Uuid::new_v4().simple(), sanitize_file_name(&upload.file_name));
        let id = self.next_media_id.fetch_add(1, Ordering::SeqCst);
        let mut media = MediaItem {
            id,
            file_url: format!("{}{}", UPLOADS_PREFIX, blob_name),
            original_name: upload.file_name.clone(),
            file_size: upload.size(),
            section_id: None,
            section_name: None,
            section_color: None,
            content_type: Some(upload.content_type.clone()),
            uploaded_at: Some(chrono::Utc::now()),
        };
        media.assign_section(section.value());
        self.blobs.insert(blob_name, upload.data.clone());
        self.media.insert(id, media.clone());
        info!("Media uploaded: {} ({}) into section {}", media.original_name, media.id, section.name);
        Ok(media)
    }

    pub fn set_media_section(&self, id: MediaId, section_id: SectionId) -> Result<MediaItem, CatalogError> {
        let section = self.sections.get(&section_id).ok_or(CatalogError::SectionNotFound)?;
        let mut entry = self.media.get_mut(&id).ok_or(CatalogError::MediaNotFound)?;
        entry.value_mut().assign_section(section.value());
        Ok(entry.value().clone())
    }

    /// Removes an item together with its stored bytes.
    pub fn remove_media(&self, id: MediaId) -> Result<MediaItem, CatalogError> {
        let (_, media) = self.media.remove(&id).ok_or(CatalogError::MediaNotFound)?;
        if let Some(blob_name) = media.file_url.strip_prefix(UPLOADS_PREFIX) {
            self.blobs.remove(blob_name);
        }
        info!("Media deleted: {} ({})", media.original_name, media.id);
        Ok(media)
    }

    pub fn blob(&self, name: &str) -> Option<Vec<u8>> {
        self.blobs.get(name).map(|x| x.value().clone())
    }
}

fn sanitize_file_name(file_name: &str) -> String {
    let sanitized = file_name.chars()
        .map(|x| if x.is_ascii_alphanumeric() || x == '.' || x == '-' || x == '_' { x } else { '_' })
        .collect::<String>();
    if sanitized.is_empty() { "file".to_string() } else { sanitized }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(name: &str) -> MediaUpload {
        MediaUpload::new(name, "image/png", vec![1, 2, 3])
    }

    #[test]
    fn seeded_catalog_has_default_sections() {
        let catalog = Catalog::seeded();
        assert_eq!(catalog.sections(), default_sections());
        let section = catalog.insert_section(&SectionForm::new("Sports").normalized().unwrap());
        assert_eq!(section.id, 7);
    }

    #[test]
    fn removing_section_moves_items_to_general() {
        let catalog = Catalog::seeded();
        let media = catalog.insert_media(&png("a.png"), 3).unwrap();
        let moved = catalog.remove_section(3).unwrap();
        assert_eq!(moved, vec![media.id]);

        let media = catalog.get_media(media.id).unwrap();
        assert_eq!(media.section_id, Some(1));
        assert_eq!(media.section_name.as_deref(), Some(GENERAL_SECTION_NAME));
        assert!(catalog.get_section(3).is_none());
    }

    #[test]
    fn removing_section_recreates_missing_general() {
        let catalog = Catalog::seeded();
        let media = catalog.insert_media(&png("a.png"), 2).unwrap();
        catalog.remove_section(1).unwrap();
        catalog.remove_section(2).unwrap();

        let media = catalog.get_media(media.id).unwrap();
        let general = catalog.get_section(media.section_id.unwrap()).unwrap();
        assert!(general.is_general());
        assert_ne!(general.id, 1);
    }

    #[test]
    fn removing_general_leaves_items_unsectioned() {
        let catalog = Catalog::seeded();
        let media = catalog.insert_media(&png("a.png"), 1).unwrap();
        catalog.remove_section(1).unwrap();
        assert_eq!(catalog.get_media(media.id).unwrap().section_id, None);
    }

    #[test]
    fn upload_requires_existing_section() {
        let catalog = Catalog::seeded();
        assert_eq!(catalog.insert_media(&png("a.png"), 99), Err(CatalogError::SectionNotFound));
    }

    #[test]
    fn removing_media_frees_bytes() {
        let catalog = Catalog::seeded();
        let media = catalog.insert_media(&png("class photo.png"), 2).unwrap();
        let blob_name = media.file_url.strip_prefix(UPLOADS_PREFIX).unwrap().to_string();
        assert!(blob_name.ends_with("-class_photo.png"));
        assert_eq!(catalog.blob(&blob_name), Some(vec![1, 2, 3]));

        catalog.remove_media(media.id).unwrap();
        assert_eq!(catalog.blob(&blob_name), None);
        assert_eq!(catalog.remove_media(media.id), Err(CatalogError::MediaNotFound));
    }

    #[test]
    fn concurrent_uploads_never_land_in_removed_section() {
        for _ in 0..50 {
            let catalog = Catalog::seeded();
            std::thread::scope(|scope| {
                for _ in 0..4 {
                    scope.spawn(|| {
                        for _ in 0..20 {
                            let _ = catalog.insert_media(&png("race.png"), 3);
                        }
                    });
                }
                scope.spawn(|| catalog.remove_section(3).unwrap());
            });
            let dangling = catalog.media(None).into_iter()
                .filter(|x| x.section_id.is_some_and(|id| catalog.get_section(id).is_none()))
                .count();
            assert_eq!(dangling, 0);
        }
    }

    #[test]
    fn media_listing_refreshes_section_fields() {
        let catalog = Catalog::seeded();
        let media = catalog.insert_media(&png("a.png"), 2).unwrap();
        let form = SectionForm::new("School Events").with_color("#000000").normalized().unwrap();
        catalog.update_section(2, &form).unwrap();

        let listed = catalog.media(Some(2));
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, media.id);
        assert_eq!(listed[0].section_name.as_deref(), Some("School Events"));
        assert_eq!(listed[0].section_color.as_deref(), Some("#000000"));
        assert!(catalog.media(Some(3)).is_empty());
        assert_eq!(catalog.media(None).len(), 1);
    }
}
