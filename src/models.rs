use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::codec::{self, Segment};

/// Display name used whenever an author left their name blank.
pub const ANONYMOUS: &str = "Anonymous";

/// Server-assigned post identifier.
///
/// The backend may hand out integer or string keys; both are kept in their
/// string form so the client never depends on the column type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PostId(pub String);

impl PostId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PostId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for PostId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Self(deserialize_row_id(deserializer)?))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(i64),
    Str(String),
}

/// Accepts either a numeric or a textual primary key.
pub(crate) fn deserialize_row_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Int(id) => id.to_string(),
        RawId::Str(id) => id,
    })
}

/// The fixed set of post categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    #[default]
    General,
    Study,
    Campus,
    Event,
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::General,
        Category::Study,
        Category::Campus,
        Category::Event,
        Category::Other,
    ];

    /// Value stored in the remote `category` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "General",
            Self::Study => "Study",
            Self::Campus => "Campus",
            Self::Event => "Event",
            Self::Other => "Other",
        }
    }

    /// Human label shown in the category picker.
    pub fn label(&self) -> &'static str {
        match self {
            Self::General => "General",
            Self::Study => "Study",
            Self::Campus => "Campus Life",
            Self::Event => "Events",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s) || c.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown category: {}", s))
    }
}

// Rows written by other clients may carry categories this build doesn't know.
impl From<String> for Category {
    fn from(value: String) -> Self {
        value.parse().unwrap_or(Category::Other)
    }
}

impl From<Category> for String {
    fn from(value: Category) -> String {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub author: String,
    /// Raw stored text, possibly carrying embedded voice references.
    pub text: String,
    pub category: Category,
    pub created_at: DateTime<Utc>,
    pub like_count: u64,
    pub images: Vec<PostImage>,
    pub comments: Vec<Comment>,
}

impl Post {
    /// Prose with every voice reference stripped out.
    pub fn clean_text(&self) -> String {
        codec::clean_text(&self.text)
    }

    pub fn voice_references(&self) -> Vec<String> {
        codec::extract_references(&self.text)
    }

    pub fn segments(&self) -> Vec<Segment> {
        codec::segments(&self.text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub post_id: PostId,
    pub author: Option<String>,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn author_name(&self) -> &str {
        author_or_anonymous(self.author.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostImage {
    pub id: String,
    pub post_id: PostId,
    pub url: String,
}

/// A post ready to be inserted; the author is already defaulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub author: String,
    pub text: String,
    pub category: Category,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub post_id: PostId,
    pub author: String,
    pub text: String,
}

pub fn author_or_anonymous(author: Option<&str>) -> &str {
    match author.map(str::trim) {
        Some(name) if !name.is_empty() => name,
        _ => ANONYMOUS,
    }
}

/// Comments shown for a post: all of them when expanded, otherwise the
/// first `limit` in stored order.
pub fn visible_comments(comments: &[Comment], expanded: bool, limit: usize) -> &[Comment] {
    if expanded {
        comments
    } else {
        &comments[..comments.len().min(limit)]
    }
}
