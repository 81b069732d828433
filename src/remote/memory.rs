// In-process store with the same semantics as the REST backend
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use super::{Bucket, RemoteError, RemoteStore};
use crate::models::{Comment, NewComment, NewPost, Post, PostId, PostImage};

const PUBLIC_BASE: &str = "https://memory.local";

#[derive(Default)]
struct Tables {
    posts: Vec<Post>,
    blobs: HashMap<(Bucket, String), (Bytes, String)>,
}

pub struct MemoryStore {
    tables: Mutex<Tables>,
    available: AtomicBool,
    uploads_available: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            available: AtomicBool::new(true),
            uploads_available: AtomicBool::new(true),
        }
    }

    /// When false every call fails with `RemoteError::Unavailable`.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// When false only `upload_blob` fails.
    pub fn set_uploads_available(&self, available: bool) {
        self.uploads_available.store(available, Ordering::SeqCst);
    }

    /// Bytes and content type of a stored blob.
    pub async fn blob(&self, bucket: Bucket, path: &str) -> Option<(Bytes, String)> {
        let tables = self.tables.lock().await;
        tables.blobs.get(&(bucket, path.to_string())).cloned()
    }

    fn ensure_available(&self) -> Result<(), RemoteError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RemoteError::Unavailable)
        }
    }
}

fn unknown_post(post_id: &PostId) -> RemoteError {
    RemoteError::Status {
        status: 409,
        body: format!("post {} does not exist", post_id),
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn query_posts(&self) -> Result<Vec<Post>, RemoteError> {
        self.ensure_available()?;
        let tables = self.tables.lock().await;
        let mut posts = tables.posts.clone();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(posts)
    }

    async fn insert_post(&self, post: &NewPost) -> Result<Post, RemoteError> {
        self.ensure_available()?;
        let stored = Post {
            id: PostId::new(Uuid::now_v7().to_string()),
            author: post.author.clone(),
            text: post.text.clone(),
            category: post.category,
            created_at: Utc::now(),
            like_count: 0,
            images: Vec::new(),
            comments: Vec::new(),
        };
        self.tables.lock().await.posts.push(stored.clone());
        debug!(id = %stored.id, "Inserted post");
        Ok(stored)
    }

    async fn insert_comment(&self, comment: &NewComment) -> Result<(), RemoteError> {
        self.ensure_available()?;
        let mut tables = self.tables.lock().await;
        let post = tables
            .posts
            .iter_mut()
            .find(|p| p.id == comment.post_id)
            .ok_or_else(|| unknown_post(&comment.post_id))?;
        post.comments.push(Comment {
            id: Uuid::now_v7().to_string(),
            post_id: comment.post_id.clone(),
            author: Some(comment.author.clone()),
            text: comment.text.clone(),
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn insert_like(&self, post_id: &PostId) -> Result<(), RemoteError> {
        self.ensure_available()?;
        let mut tables = self.tables.lock().await;
        let post = tables
            .posts
            .iter_mut()
            .find(|p| &p.id == post_id)
            .ok_or_else(|| unknown_post(post_id))?;
        post.like_count += 1;
        Ok(())
    }

    async fn link_image(&self, post_id: &PostId, url: &str) -> Result<(), RemoteError> {
        self.ensure_available()?;
        let mut tables = self.tables.lock().await;
        let post = tables
            .posts
            .iter_mut()
            .find(|p| &p.id == post_id)
            .ok_or_else(|| unknown_post(post_id))?;
        post.images.push(PostImage {
            id: Uuid::now_v7().to_string(),
            post_id: post_id.clone(),
            url: url.to_string(),
        });
        Ok(())
    }

    async fn upload_blob(
        &self,
        bucket: Bucket,
        path: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, RemoteError> {
        self.ensure_available()?;
        if !self.uploads_available.load(Ordering::SeqCst) {
            return Err(RemoteError::Status {
                status: 503,
                body: "storage unavailable".to_string(),
            });
        }
        self.tables
            .lock()
            .await
            .blobs
            .insert((bucket, path.to_string()), (bytes, content_type.to_string()));
        Ok(format!(
            "{}/storage/v1/object/public/{}/{}",
            PUBLIC_BASE, bucket, path
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    fn new_post(text: &str) -> NewPost {
        NewPost {
            author: "Anonymous".into(),
            text: text.into(),
            category: Category::General,
        }
    }

    #[tokio::test]
    async fn posts_come_back_newest_first() {
        let store = MemoryStore::new();
        store.insert_post(&new_post("first")).await.unwrap();
        store.insert_post(&new_post("second")).await.unwrap();

        let posts = store.query_posts().await.unwrap();
        assert_eq!(posts[0].text, "second");
        assert_eq!(posts[1].text, "first");
    }

    #[tokio::test]
    async fn likes_accumulate_without_dedup() {
        let store = MemoryStore::new();
        let post = store.insert_post(&new_post("x")).await.unwrap();
        for _ in 0..3 {
            store.insert_like(&post.id).await.unwrap();
        }
        assert_eq!(store.query_posts().await.unwrap()[0].like_count, 3);
    }

    #[tokio::test]
    async fn unavailable_store_fails_every_call() {
        let store = MemoryStore::new();
        store.set_available(false);
        assert!(matches!(
            store.query_posts().await,
            Err(RemoteError::Unavailable)
        ));
    }

    #[tokio::test]
    async fn comment_on_missing_post_is_rejected() {
        let store = MemoryStore::new();
        let result = store
            .insert_comment(&NewComment {
                post_id: PostId::new("missing"),
                author: "Anonymous".into(),
                text: "hi".into(),
            })
            .await;
        assert!(matches!(result, Err(RemoteError::Status { status: 409, .. })));
    }

    #[tokio::test]
    async fn uploaded_blob_is_kept_with_content_type() {
        let store = MemoryStore::new();
        let url = store
            .upload_blob(Bucket::Audio, "voice-1.wav", Bytes::from_static(b"RIFF"), "audio/wav")
            .await
            .unwrap();
        assert_eq!(url, "https://memory.local/storage/v1/object/public/audio/voice-1.wav");
        let (bytes, content_type) = store.blob(Bucket::Audio, "voice-1.wav").await.unwrap();
        assert_eq!(&bytes[..], b"RIFF");
        assert_eq!(content_type, "audio/wav");
    }
}
