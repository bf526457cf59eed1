use crate::entities::MediaItem;

/// Resolves stored file paths against the public base URL.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    base_url: String,
}

impl ObjectStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url }
    }

    pub fn resolve(&self, file_url: &str) -> String {
        if file_url.starts_with("http://") || file_url.starts_with("https://") {
            return file_url.to_string();
        }
        format!("{}/{}", self.base_url, file_url.trim_start_matches('/'))
    }

    pub fn display_url(&self, media: &MediaItem) -> String {
        self.resolve(&media.file_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_relative_paths() {
        let store = ObjectStore::new("http://localhost:1698/");
        assert_eq!(store.resolve("/uploads/a.png"), "http://localhost:1698/uploads/a.png");
        assert_eq!(store.resolve("uploads/a.png"), "http://localhost:1698/uploads/a.png");
    }

    #[test]
    fn absolute_urls_pass_through() {
        let store = ObjectStore::new("http://localhost:1698");
        assert_eq!(store.resolve("https://cdn.example.org/a.png"), "https://cdn.example.org/a.png");
    }
}
