//! REST client for a Supabase-compatible backend.
//!
//! Table access goes through PostgREST under `/rest/v1`, blobs through the
//! storage API under `/storage/v1`.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use super::rows::{NewCommentRow, NewImageRow, NewLikeRow, NewPostRow, PostRow};
use super::{Bucket, RemoteError, RemoteStore};
use crate::config::RemoteConfig;
use crate::models::{NewComment, NewPost, Post, PostId};

const POSTS_SELECT: &str = "*,comments(*),likes(*),post_images(*)";

pub struct RestStore {
    base: String,
    anon_key: String,
    http_client: Client,
}

impl RestStore {
    pub fn new(cfg: &RemoteConfig) -> Result<Self, RemoteError> {
        let parsed = Url::parse(&cfg.url)?;
        let base = parsed.as_str().trim_end_matches('/').to_string();

        let http_client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        info!(url = %base, "REST store initialized");

        Ok(Self {
            base,
            anon_key: cfg.anon_key.clone(),
            http_client,
        })
    }

    /// Public URL of an object previously written with `upload_blob`.
    pub fn public_url(&self, bucket: Bucket, path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base, bucket, path)
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base, table)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
    }

    async fn insert_rows<T: Serialize + Sync>(
        &self,
        table: &str,
        rows: &[T],
    ) -> Result<Response, RemoteError> {
        debug!(table, rows = rows.len(), "Inserting rows");
        let response = self
            .authorized(self.http_client.post(self.table_url(table)))
            .json(rows)
            .send()
            .await?;
        check(response).await
    }
}

/// Turn a non-2xx response into `RemoteError::Status`.
async fn check(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(RemoteError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl RemoteStore for RestStore {
    async fn query_posts(&self) -> Result<Vec<Post>, RemoteError> {
        let response = self
            .authorized(self.http_client.get(self.table_url("posts")))
            .query(&[("select", POSTS_SELECT), ("order", "created_at.desc")])
            .send()
            .await?;
        let body = check(response).await?.bytes().await?;
        let rows: Vec<PostRow> = serde_json::from_slice(&body)?;
        debug!(count = rows.len(), "Fetched posts");
        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn insert_post(&self, post: &NewPost) -> Result<Post, RemoteError> {
        let response = self
            .authorized(self.http_client.post(self.table_url("posts")))
            .header("Prefer", "return=representation")
            .json(&[NewPostRow::from(post)])
            .send()
            .await?;
        let body = check(response).await?.bytes().await?;
        let rows: Vec<PostRow> = serde_json::from_slice(&body)?;
        rows.into_iter()
            .next()
            .map(Post::from)
            .ok_or(RemoteError::EmptyResponse)
    }

    async fn insert_comment(&self, comment: &NewComment) -> Result<(), RemoteError> {
        self.insert_rows("comments", &[NewCommentRow::from(comment)])
            .await?;
        Ok(())
    }

    async fn insert_like(&self, post_id: &PostId) -> Result<(), RemoteError> {
        self.insert_rows("likes", &[NewLikeRow { post_id }]).await?;
        Ok(())
    }

    async fn link_image(&self, post_id: &PostId, url: &str) -> Result<(), RemoteError> {
        self.insert_rows(
            "post_images",
            &[NewImageRow {
                post_id,
                image_url: url,
            }],
        )
        .await?;
        Ok(())
    }

    async fn upload_blob(
        &self,
        bucket: Bucket,
        path: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, RemoteError> {
        let size = bytes.len();
        let upload_url = format!("{}/storage/v1/object/{}/{}", self.base, bucket, path);
        let response = self
            .authorized(self.http_client.post(upload_url))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;
        check(response).await?;

        info!(%bucket, path, size, "Uploaded blob");
        Ok(self.public_url(bucket, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(url: &str) -> RestStore {
        RestStore::new(&RemoteConfig {
            url: url.to_string(),
            anon_key: "key".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn public_url_joins_bucket_and_path() {
        let store = store("https://abc.supabase.co/");
        assert_eq!(
            store.public_url(Bucket::Audio, "voice-1.wav"),
            "https://abc.supabase.co/storage/v1/object/public/audio/voice-1.wav"
        );
    }

    #[test]
    fn rejects_unparseable_endpoint() {
        let result = RestStore::new(&RemoteConfig {
            url: "not a url".to_string(),
            anon_key: String::new(),
        });
        assert!(matches!(result, Err(RemoteError::InvalidEndpoint(_))));
    }
}
