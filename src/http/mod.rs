//! Development backend serving the content repository REST API from an
//! in-memory [`Catalog`].

use std::sync::Arc;
use anyhow::Context;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::{Extension, Router};
use log::info;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
pub use error::ApiError;
use crate::auth::{is_token_valid, parse_bearer};
use crate::repository::Catalog;

mod error;
mod media;
mod sections;

pub type Result<T, E = ApiError> = std::result::Result<T, E>;

#[derive(Clone)]
pub struct ApiContext {
    catalog: Arc<Catalog>,
    token: Option<Arc<str>>,
}

impl ApiContext {
    /// Without a token every mutation is accepted.
    pub fn new(catalog: Arc<Catalog>, token: Option<String>) -> Self {
        Self { catalog, token: token.map(Arc::from) }
    }

    fn authorize(&self, headers: &HeaderMap) -> Result<()> {
        let Some(expected) = &self.token else {
            return Ok(());
        };
        let token = headers.get(AUTHORIZATION)
            .and_then(|x| x.to_str().ok())
            .and_then(parse_bearer);
        is_token_valid(token, expected)?;
        Ok(())
    }
}

pub fn router(ctx: ApiContext) -> Router {
    sections::router()
        .merge(media::router())
        .layer(CorsLayer::new()
            .allow_methods(Any)
            .allow_headers(Any)
            .allow_origin(Any))
        .layer(
            ServiceBuilder::new()
                .layer(Extension(ctx))
                .layer(TraceLayer::new_for_http()),
        )
}

pub async fn serve(addr: &str, ctx: ApiContext) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await
        .with_context(|| format!("failed to bind to {}", addr))?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router(ctx))
        .await
        .context("error running HTTP server")
}
