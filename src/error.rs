use std::fmt;

use crate::capture::CaptureError;
use crate::remote::RemoteError;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter something to post!")]
    EmptyPost,
}

/// The remote call a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Refresh,
    CreatePost,
    UploadImage,
    LinkImage,
    AddComment,
    AddLike,
    UploadAudio,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Refresh => "refresh",
            Operation::CreatePost => "create post",
            Operation::UploadImage => "upload image",
            Operation::LinkImage => "link image",
            Operation::AddComment => "add comment",
            Operation::AddLike => "add like",
            Operation::UploadAudio => "upload audio",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{op} failed: {source}")]
    Remote {
        op: Operation,
        #[source]
        source: RemoteError,
    },

    #[error(transparent)]
    Capture(#[from] CaptureError),
}

impl FeedError {
    pub fn remote(op: Operation, source: RemoteError) -> Self {
        FeedError::Remote { op, source }
    }

    /// The blocking message a UI should show, or `None` when the failure is
    /// only logged.
    pub fn user_alert(&self) -> Option<String> {
        match self {
            FeedError::Validation(e) => Some(e.to_string()),
            FeedError::Remote {
                op: Operation::CreatePost,
                ..
            } => Some("Error creating post.".to_string()),
            FeedError::Remote { .. } => None,
            FeedError::Capture(e) => e.user_alert(),
        }
    }
}

pub type FeedResult<T> = Result<T, FeedError>;
