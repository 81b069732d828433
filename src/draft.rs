use bytes::Bytes;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::ValidationError;
use crate::models::{author_or_anonymous, Category, NewPost};

/// An image picked from the local filesystem, not yet uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalImage {
    pub file_name: String,
    pub bytes: Bytes,
}

impl LocalImage {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    pub async fn load(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        Ok(Self::new(file_name, bytes))
    }

    pub fn extension(&self) -> Option<&str> {
        Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
    }

    pub fn content_type(&self) -> String {
        mime_guess::from_path(&self.file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    }

    /// Storage path inside the images bucket: `posts/<random>.<ext>`.
    pub fn upload_path(&self) -> String {
        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(16)
            .map(char::from)
            .collect();
        match self.extension() {
            Some(ext) => format!("posts/{}.{}", token.to_lowercase(), ext),
            None => format!("posts/{}", token.to_lowercase()),
        }
    }
}

/// The post being composed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub author: String,
    pub text: String,
    pub category: Category,
    pub image: Option<LocalImage>,
}

/// A draft shared between the composer and a capture session.
pub type SharedDraft = Arc<Mutex<Draft>>;

impl Draft {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn shared(self) -> SharedDraft {
        Arc::new(Mutex::new(self))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.text.trim().is_empty() {
            return Err(ValidationError::EmptyPost);
        }
        Ok(())
    }

    pub fn to_new_post(&self) -> Result<NewPost, ValidationError> {
        self.validate()?;
        Ok(NewPost {
            author: author_or_anonymous(Some(&self.author)).to_string(),
            text: self.text.clone(),
            category: self.category,
        })
    }

    pub fn clear(&mut self) {
        *self = Draft::default();
    }

    /// Reset after `submitted` was posted. Text appended to the draft since
    /// then is carried over into the fresh draft.
    pub fn clear_submitted(&mut self, submitted: &str) {
        let pending = self
            .text
            .strip_prefix(submitted)
            .unwrap_or_default()
            .to_string();
        self.clear();
        self.text = pending;
    }
}

/// Pending comment for one post.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentDraft {
    pub author: String,
    pub text: String,
}

impl CommentDraft {
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}
