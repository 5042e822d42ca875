use std::future::Future;

use anyhow::{Context, Result};
use reqwest::Client;

use crate::model::{Podcast, PodcastGenre};

const API_KEY_HEADER: &str = "X-ListenAPI-Key";

/// Read-only podcast directory
pub trait DirectoryApi {
    fn best_podcasts(&self) -> impl Future<Output = Result<PodcastGenre>> + Send;
    fn genre_podcasts(&self, genre_id: u32) -> impl Future<Output = Result<PodcastGenre>> + Send;
    fn podcast(&self, id: &str) -> impl Future<Output = Result<Podcast>> + Send;
}

#[derive(Clone)]
pub struct HttpDirectory {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpDirectory {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = self.endpoint(path);
        crate::log_api_request!("directory", url = %url);

        let mut request = self.client.get(&url).query(query);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let result = async {
            let response = request
                .send()
                .await
                .with_context(|| format!("Request to {url} failed"))?
                .error_for_status()
                .with_context(|| format!("Directory rejected {url}"))?;
            response
                .json::<T>()
                .await
                .with_context(|| format!("Malformed response from {url}"))
        }
        .await;

        crate::log_api_result!(path, result);
        result
    }
}

impl DirectoryApi for HttpDirectory {
    async fn best_podcasts(&self) -> Result<PodcastGenre> {
        self.get_json("best_podcasts", &[]).await
    }

    async fn genre_podcasts(&self, genre_id: u32) -> Result<PodcastGenre> {
        self.get_json("best_podcasts", &[("genre_id", genre_id.to_string())])
            .await
    }

    async fn podcast(&self, id: &str) -> Result<Podcast> {
        self.get_json(&format!("podcasts/{id}"), &[]).await
    }
}
