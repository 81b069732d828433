// Wire rows for the posts / comments / likes / post_images tables
use chrono::{DateTime, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

use crate::models::{
    deserialize_row_id, Category, Comment, NewComment, NewPost, Post, PostId, PostImage,
    ANONYMOUS,
};

#[derive(Debug, Deserialize)]
pub(crate) struct PostRow {
    pub id: PostId,
    pub username: Option<String>,
    #[serde(default)]
    pub problem: Option<String>,
    #[serde(default)]
    pub category: Option<Category>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub comments: Option<Vec<CommentRow>>,
    #[serde(default)]
    pub likes: Option<Vec<IgnoredAny>>,
    #[serde(default)]
    pub post_images: Option<Vec<ImageRow>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommentRow {
    #[serde(deserialize_with = "deserialize_row_id")]
    pub id: String,
    pub post_id: PostId,
    pub username: Option<String>,
    #[serde(default)]
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ImageRow {
    #[serde(deserialize_with = "deserialize_row_id")]
    pub id: String,
    pub post_id: PostId,
    pub image_url: String,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        let author = match row.username {
            Some(name) if !name.trim().is_empty() => name,
            _ => ANONYMOUS.to_string(),
        };
        Post {
            id: row.id,
            author,
            text: row.problem.unwrap_or_default(),
            category: row.category.unwrap_or_default(),
            created_at: row.created_at,
            like_count: row.likes.map(|likes| likes.len() as u64).unwrap_or(0),
            images: row
                .post_images
                .unwrap_or_default()
                .into_iter()
                .map(PostImage::from)
                .collect(),
            comments: row
                .comments
                .unwrap_or_default()
                .into_iter()
                .map(Comment::from)
                .collect(),
        }
    }
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: row.id,
            post_id: row.post_id,
            author: row.username,
            text: row.comment,
            created_at: row.created_at,
        }
    }
}

impl From<ImageRow> for PostImage {
    fn from(row: ImageRow) -> Self {
        PostImage {
            id: row.id,
            post_id: row.post_id,
            url: row.image_url,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct NewPostRow<'a> {
    pub username: &'a str,
    pub problem: &'a str,
    pub category: &'a str,
}

impl<'a> From<&'a NewPost> for NewPostRow<'a> {
    fn from(post: &'a NewPost) -> Self {
        NewPostRow {
            username: &post.author,
            problem: &post.text,
            category: post.category.as_str(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct NewCommentRow<'a> {
    pub post_id: &'a PostId,
    pub username: &'a str,
    pub comment: &'a str,
}

impl<'a> From<&'a NewComment> for NewCommentRow<'a> {
    fn from(comment: &'a NewComment) -> Self {
        NewCommentRow {
            post_id: &comment.post_id,
            username: &comment.author,
            comment: &comment.text,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct NewLikeRow<'a> {
    pub post_id: &'a PostId,
}

#[derive(Debug, Serialize)]
pub(crate) struct NewImageRow<'a> {
    pub post_id: &'a PostId,
    pub image_url: &'a str,
}
