pub mod media;
pub mod section;

pub use crate::entities::media::{MediaId, MediaItem, MediaRecord, MediaUpload, MAX_UPLOAD_SIZE_IN_BYTES};
pub use crate::entities::section::{default_sections, MediaSection, SectionForm, SectionId, SectionRecord};
pub use crate::entities::section::{DEFAULT_SECTION_COLOR, GENERAL_SECTION_NAME};
