use std::fmt;
use thiserror::Error;

pub type Result<T, E = MediaLibraryError> = std::result::Result<T, E>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Section,
    Media,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::Section => write!(f, "section"),
            Entity::Media => write!(f, "media item"),
        }
    }
}

/// Bad input, caught before any network call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no section selected")]
    NoSectionSelected,
    #[error("not an image")]
    NotAnImage,
    #[error("file too large: {size} bytes, limit is {limit} bytes")]
    FileTooLarge { size: u64, limit: u64 },
    #[error("name required")]
    NameRequired,
    #[error("already in section")]
    AlreadyInSection,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MediaLibraryError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("authentication required")]
    Auth,
    #[error("{0} not found")]
    NotFound(Entity),
    #[error("network error: {0}")]
    Network(String),
}

impl MediaLibraryError {
    pub fn network(message: impl fmt::Display) -> Self {
        Self::Network(message.to_string())
    }
}

impl From<reqwest::Error> for MediaLibraryError {
    fn from(value: reqwest::Error) -> Self {
        Self::network(value)
    }
}

/// A repository payload that failed validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {entity} record {id}: {reason}")]
pub struct InvalidRecord {
    pub entity: Entity,
    pub id: i64,
    pub reason: String,
}

impl InvalidRecord {
    pub fn new(entity: Entity, id: i64, reason: impl Into<String>) -> Self {
        Self { entity, id, reason: reason.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        let err: MediaLibraryError = ValidationError::NotAnImage.into();
        assert_eq!(err.to_string(), "validation error: not an image");
        assert_eq!(MediaLibraryError::NotFound(Entity::Section).to_string(), "section not found");
        assert_eq!(MediaLibraryError::network("connection refused").to_string(), "network error: connection refused");
    }
}
