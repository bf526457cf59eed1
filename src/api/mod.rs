mod client;

pub use client::{ApiConfig, HttpContentRepository};

pub const MEDIA_SECTIONS_PATH: &str = "/api/media-sections";
pub const MEDIA_PATH: &str = "/api/media";
pub const MEDIA_UPLOAD_PATH: &str = "/api/media/upload";
pub const UPLOADS_PATH: &str = "/uploads";
