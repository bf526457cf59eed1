use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use http::StatusCode;
use log::{debug, warn};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use crate::api::{MEDIA_PATH, MEDIA_SECTIONS_PATH, MEDIA_UPLOAD_PATH};
use crate::auth::Credential;
use crate::entities::*;
use crate::error::{Entity, InvalidRecord, MediaLibraryError, Result};
use crate::repository::ContentRepository;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub api_url: String,
    pub timeout: Duration,
}

impl ApiConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// [`ContentRepository`] talking to the school site's REST backend.
#[derive(Clone, Debug)]
pub struct HttpContentRepository {
    client: Client,
    config: Arc<ApiConfig>,
}

impl HttpContentRepository {
    pub fn new(config: ApiConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config: Arc::new(config) })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_url, path)
    }

    async fn send(&self, request: RequestBuilder, entity: Entity) -> Result<Response> {
        let res = request.send().await?;
        let status = res.status();
        debug!("{} {}", status, res.url());
        if status.is_success() {
            return Ok(res);
        }
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(MediaLibraryError::Auth),
            StatusCode::NOT_FOUND => Err(MediaLibraryError::NotFound(entity)),
            _ => {
                let body = res.text().await.unwrap_or_default();
                Err(MediaLibraryError::network(format!("{}: {}", status, body.trim())))
            }
        }
    }

    async fn parse<R, T>(&self, res: Response) -> Result<T>
    where
        R: DeserializeOwned,
        T: TryFrom<R, Error = InvalidRecord>,
    {
        let record: R = res.json().await?;
        T::try_from(record).map_err(MediaLibraryError::network)
    }

    async fn parse_list<R, T>(&self, res: Response) -> Result<Vec<T>>
    where
        R: DeserializeOwned,
        T: TryFrom<R, Error = InvalidRecord>,
    {
        let records: Vec<R> = res.json().await?;
        let items = records.into_iter()
            .filter_map(|x| T::try_from(x).map_err(|e| warn!("Skipping {}", e)).ok())
            .collect();
        Ok(items)
    }
}

#[async_trait]
impl ContentRepository for HttpContentRepository {
    async fn list_sections(&self) -> Result<Vec<MediaSection>> {
        let request = self.client.get(self.url(MEDIA_SECTIONS_PATH));
        let res = self.send(request, Entity::Section).await?;
        self.parse_list::<SectionRecord, MediaSection>(res).await
    }

    async fn create_section(&self, form: &SectionForm, credential: &Credential) -> Result<MediaSection> {
        let request = self.client.post(self.url(MEDIA_SECTIONS_PATH))
            .bearer_auth(credential.token())
            .json(form);
        let res = self.send(request, Entity::Section).await?;
        self.parse::<SectionRecord, MediaSection>(res).await
    }

    async fn update_section(&self, id: SectionId, form: &SectionForm, credential: &Credential) -> Result<MediaSection> {
        let url = format!("{}/{}", self.url(MEDIA_SECTIONS_PATH), id);
        let request = self.client.put(url)
            .bearer_auth(credential.token())
            .json(form);
        let res = self.send(request, Entity::Section).await?;
        self.parse::<SectionRecord, MediaSection>(res).await
    }

    async fn delete_section(&self, id: SectionId, credential: &Credential) -> Result<()> {
        let url = format!("{}/{}", self.url(MEDIA_SECTIONS_PATH), id);
        let request = self.client.delete(url).bearer_auth(credential.token());
        self.send(request, Entity::Section).await?;
        Ok(())
    }

    async fn list_media(&self, section_id: Option<SectionId>) -> Result<Vec<MediaItem>> {
        let mut request = self.client.get(self.url(MEDIA_PATH));
        if let Some(section_id) = section_id {
            request = request.query(&[("section_id", section_id)]);
        }
        let res = self.send(request, Entity::Media).await?;
        self.parse_list::<MediaRecord, MediaItem>(res).await
    }

    async fn upload_media(&self, upload: &MediaUpload, section_id: SectionId, credential: &Credential) -> Result<MediaItem> {
        let part = Part::bytes(upload.data.clone())
            .file_name(upload.file_name.clone())
            .mime_str(&upload.content_type)?;
        let form = Form::new()
            .part("file", part)
            .text("section_id", section_id.to_string());
        let request = self.client.post(self.url(MEDIA_UPLOAD_PATH))
            .bearer_auth(credential.token())
            .multipart(form);
        let res = self.send(request, Entity::Section).await?;
        self.parse::<MediaRecord, MediaItem>(res).await
    }

    async fn update_media_section(&self, id: MediaId, section_id: SectionId, credential: &Credential) -> Result<MediaItem> {
        let url = format!("{}/{}", self.url(MEDIA_PATH), id);
        let request = self.client.put(url)
            .bearer_auth(credential.token())
            .json(&json!({ "section_id": section_id }));
        let res = self.send(request, Entity::Media).await?;
        self.parse::<MediaRecord, MediaItem>(res).await
    }

    async fn delete_media(&self, id: MediaId, credential: &Credential) -> Result<()> {
        let url = format!("{}/{}", self.url(MEDIA_PATH), id);
        let request = self.client.delete(url).bearer_auth(credential.token());
        self.send(request, Entity::Media).await?;
        Ok(())
    }
}
