use crate::entities::{MediaItem, MediaSection, SectionId};

/// Outcome of the last media fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FetchStatus {
    #[default]
    Idle,
    Loading,
    Success,
    /// Live fetch failed; the list was filtered from the cached catalog.
    Fallback,
    /// Live fetch failed with nothing cached; the list is empty.
    Failed,
}

/// Where the current section list came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SectionsSource {
    #[default]
    Unloaded,
    Repository,
    BuiltIn,
}

/// Snapshot of what the media view renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub selected_section: Option<SectionId>,
    pub sections: Vec<MediaSection>,
    pub items: Vec<MediaItem>,
    pub status: FetchStatus,
    /// Dismissible, set on fallback.
    pub warning: Option<String>,
    /// Blocking, set on failure.
    pub error: Option<String>,
}

impl ViewState {
    pub fn can_retry(&self) -> bool {
        self.status == FetchStatus::Failed
    }

    pub fn selected_section(&self) -> Option<&MediaSection> {
        let id = self.selected_section?;
        self.sections.iter().find(|x| x.id == id)
    }
}
