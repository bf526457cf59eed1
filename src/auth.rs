use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("bearer token is missing")]
    MissingToken,
    #[error("bearer token is invalid")]
    InvalidToken,
}

/// Opaque bearer credential handed out by the auth collaborator.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Blank tokens are treated as no credential at all.
    pub fn bearer(token: impl Into<String>) -> Option<Self> {
        let token = token.into().trim().to_string();
        if token.is_empty() {
            return None;
        }
        Some(Self(token))
    }

    pub fn token(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

pub trait CredentialProvider: Send + Sync {
    fn credential(&self) -> Option<Credential>;
}

/// Credential fixed at startup, e.g. from `MEDIA_API_TOKEN`.
#[derive(Clone, Debug, Default)]
pub struct StaticCredential(Option<Credential>);

impl StaticCredential {
    pub fn new(token: Option<String>) -> Self {
        Self(token.and_then(Credential::bearer))
    }

    pub fn anonymous() -> Self {
        Self(None)
    }
}

impl CredentialProvider for StaticCredential {
    fn credential(&self) -> Option<Credential> {
        self.0.clone()
    }
}

/// Strips the `Bearer ` scheme from an `Authorization` header value.
pub fn parse_bearer(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() { None } else { Some(token) }
}

pub fn is_token_valid(token: Option<&str>, expected_token: &str) -> Result<(), AuthError> {
    match token {
        None => Err(AuthError::MissingToken),
        Some(token) if token == expected_token => Ok(()),
        Some(_) => Err(AuthError::InvalidToken),
    }
}
