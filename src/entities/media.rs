use std::path::Path;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::entities::section::{MediaSection, SectionId};
use crate::error::{Entity, InvalidRecord};

pub type MediaId = i64;

pub const MAX_UPLOAD_SIZE_IN_BYTES: u64 = 10_485_760; // 10 MiB

/// One uploaded file record.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MediaItem {
    pub id: MediaId,
    pub file_url: String,
    pub original_name: String,
    pub file_size: u64,
    pub section_id: Option<SectionId>,
    pub section_name: Option<String>,
    pub section_color: Option<String>,
    pub content_type: Option<String>,
    pub uploaded_at: Option<DateTime<Utc>>,
}

impl MediaItem {
    /// `None` matches every item.
    pub fn is_in_section(&self, section_id: Option<SectionId>) -> bool {
        section_id.is_none() || self.section_id == section_id
    }

    pub fn assign_section(&mut self, section: &MediaSection) {
        self.section_id = Some(section.id);
        self.section_name = Some(section.name.clone());
        self.section_color = Some(section.color.clone());
    }

    pub fn clear_section(&mut self) {
        self.section_id = None;
        self.section_name = None;
        self.section_color = None;
    }

    /// Turns a reference to an unknown section into "unsectioned".
    /// Returns true when the item was changed.
    pub fn detach_from_missing_section(&mut self, sections: &[MediaSection]) -> bool {
        match self.section_id {
            Some(section_id) if !sections.iter().any(|x| x.id == section_id) => {
                self.clear_section();
                true
            }
            _ => false,
        }
    }
}

/// Media item as it arrives from the content repository, before validation.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct MediaRecord {
    pub id: MediaId,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub original_name: Option<String>,
    /// Any JSON number; negative sizes read as 0, oversized ones as `u64::MAX`.
    #[serde(default)]
    pub file_size: Option<serde_json::Number>,
    #[serde(default)]
    pub section_id: Option<SectionId>,
    #[serde(default)]
    pub section_name: Option<String>,
    #[serde(default)]
    pub section_color: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default, alias = "created_at")]
    pub uploaded_at: Option<DateTime<Utc>>,
}

impl TryFrom<MediaRecord> for MediaItem {
    type Error = InvalidRecord;

    fn try_from(value: MediaRecord) -> Result<Self, Self::Error> {
        let file_url = value.file_url
            .filter(|x| !x.trim().is_empty())
            .ok_or_else(|| InvalidRecord::new(Entity::Media, value.id, "file_url is missing"))?;
        let original_name = value.original_name
            .filter(|x| !x.trim().is_empty())
            .unwrap_or_else(|| file_name_of(&file_url));
        let file_size = value.file_size.as_ref().map_or(0, clamp_size);
        let mut media = Self {
            id: value.id,
            file_url,
            original_name,
            file_size,
            section_id: value.section_id,
            section_name: value.section_name,
            section_color: value.section_color,
            content_type: value.content_type,
            uploaded_at: value.uploaded_at,
        };
        if media.section_id.is_none() {
            media.clear_section();
        }
        Ok(media)
    }
}

fn clamp_size(size: &serde_json::Number) -> u64 {
    size.as_u64()
        .or_else(|| size.as_f64().map(|x| x.max(0.0) as u64))
        .unwrap_or(0)
}

fn file_name_of(file_url: &str) -> String {
    file_url.rsplit('/').next().unwrap_or(file_url).to_string()
}

/// A file picked for upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl MediaUpload {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self { file_name: file_name.into(), content_type: content_type.into(), data }
    }

    /// Reads a file from disk, guessing its content type from the extension.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let data = tokio::fs::read(path).await?;
        let file_name = path.file_name()
            .map(|x| x.to_string_lossy().to_string())
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"))?;
        let content_type = mime_guess::from_path(path).first_or_octet_stream().to_string();
        Ok(Self { file_name, content_type, data })
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_image(&self) -> bool {
        self.content_type.parse::<mime::Mime>()
            .map(|x| x.type_() == mime::IMAGE)
            .unwrap_or(false)
    }
}
