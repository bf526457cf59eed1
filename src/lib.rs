pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod entities;
pub mod error;
pub mod http;
pub mod logging;
pub mod manager;
pub mod object_store;
pub mod repository;

pub use crate::error::{MediaLibraryError, Result, ValidationError};
pub use crate::manager::{FetchStatus, MediaLibraryManager, ViewState};
