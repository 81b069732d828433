// Remote store seam - every side effect against the hosted backend goes through here
pub mod memory;
pub mod rest;
mod rows;

use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use thiserror::Error;

use crate::models::{NewComment, NewPost, Post, PostId};

pub use memory::MemoryStore;
pub use rest::RestStore;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Backend unavailable")]
    Unavailable,

    #[error("Backend returned no rows")]
    EmptyResponse,

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
}

/// Blob storage buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Images,
    Audio,
}

impl Bucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Images => "images",
            Bucket::Audio => "audio",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Every post with nested comments, likes and images, newest first.
    async fn query_posts(&self) -> Result<Vec<Post>, RemoteError>;

    /// Insert a post and return the stored row.
    async fn insert_post(&self, post: &NewPost) -> Result<Post, RemoteError>;

    async fn insert_comment(&self, comment: &NewComment) -> Result<(), RemoteError>;

    async fn insert_like(&self, post_id: &PostId) -> Result<(), RemoteError>;

    async fn link_image(&self, post_id: &PostId, url: &str) -> Result<(), RemoteError>;

    /// Store a binary object and return its public URL.
    async fn upload_blob(
        &self,
        bucket: Bucket,
        path: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, RemoteError>;
}
