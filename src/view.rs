// Render-ready views of posts for a UI or the terminal
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write;

use crate::capture::Playback;
use crate::codec::Segment;
use crate::models::{self, Comment, Post, PostId};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostView {
    pub id: PostId,
    pub author: String,
    pub category: &'static str,
    pub body: String,
    pub segments: Vec<Segment>,
    pub voice_references: Vec<String>,
    pub image_urls: Vec<String>,
    pub like_count: u64,
    pub comment_count: usize,
    pub created_at: String,
    pub comments: Vec<CommentView>,
    /// Label of the expand/collapse control, if the post offers one.
    pub toggle_label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentView {
    pub author: String,
    pub text: String,
    pub created_at: String,
}

impl From<&Comment> for CommentView {
    fn from(comment: &Comment) -> Self {
        CommentView {
            author: comment.author_name().to_string(),
            text: comment.text.clone(),
            created_at: format_relative_time(&comment.created_at),
        }
    }
}

impl PostView {
    pub fn build(post: &Post, expanded: bool, collapsed_count: usize) -> Self {
        let comments = models::visible_comments(&post.comments, expanded, collapsed_count)
            .iter()
            .map(CommentView::from)
            .collect();

        Self {
            id: post.id.clone(),
            author: post.author.clone(),
            category: post.category.label(),
            body: post.clean_text(),
            segments: post.segments(),
            voice_references: post.voice_references(),
            image_urls: post.images.iter().map(|image| image.url.clone()).collect(),
            like_count: post.like_count,
            comment_count: post.comments.len(),
            created_at: format_relative_time(&post.created_at),
            comments,
            toggle_label: toggle_label(post.comments.len(), expanded, collapsed_count),
        }
    }

    /// Plain-text card for terminal output.
    pub fn render(&self, playback: &Playback) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "#{} @{} [{}] {}",
            self.id, self.author, self.category, self.created_at
        );
        if !self.body.is_empty() {
            let _ = writeln!(out, "  {}", self.body);
        }
        for url in &self.voice_references {
            let _ = writeln!(out, "  {} {}", playback.button_label(url), url);
        }
        for url in &self.image_urls {
            let _ = writeln!(out, "  🖼 {}", url);
        }
        let _ = writeln!(
            out,
            "  ❤️ {}  Comments ({})",
            self.like_count, self.comment_count
        );
        for comment in &self.comments {
            let _ = writeln!(
                out,
                "    @{}: {} ({})",
                comment.author, comment.text, comment.created_at
            );
        }
        if let Some(label) = &self.toggle_label {
            let _ = writeln!(out, "    [{}]", label);
        }
        out
    }
}

fn toggle_label(total: usize, expanded: bool, collapsed_count: usize) -> Option<String> {
    if total <= collapsed_count {
        return None;
    }
    Some(if expanded {
        "Show Less".to_string()
    } else {
        format!("Show {} More Comments", total - collapsed_count)
    })
}

pub fn format_relative_time(dt: &DateTime<Utc>) -> String {
    format_relative_time_at(dt, Utc::now())
}

pub fn format_relative_time_at(dt: &DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now.signed_duration_since(*dt);

    let minutes = diff.num_minutes().max(0);
    if minutes < 60 {
        return format!("{}m ago", minutes);
    }

    let hours = diff.num_hours();
    if hours < 24 {
        return format!("{}h ago", hours);
    }

    dt.format("%b %-d, %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, PostImage};
    use chrono::{Duration, TimeZone};

    fn post(comments: usize) -> Post {
        let id = PostId::new("9");
        Post {
            id: id.clone(),
            author: "Anonymous".into(),
            text: "Lost keys 🔊 Voice message: https://x/y.wav".into(),
            category: Category::Campus,
            created_at: Utc::now() - Duration::minutes(5),
            like_count: 3,
            images: vec![PostImage {
                id: "1".into(),
                post_id: id.clone(),
                url: "https://img/1.png".into(),
            }],
            comments: (0..comments)
                .map(|n| Comment {
                    id: n.to_string(),
                    post_id: id.clone(),
                    author: None,
                    text: format!("c{}", n),
                    created_at: Utc::now(),
                })
                .collect(),
        }
    }

    #[test]
    fn format_relative_time_minutes() {
        let dt = Utc::now() - Duration::minutes(5);
        assert_eq!(format_relative_time(&dt), "5m ago");
    }

    #[test]
    fn format_relative_time_fresh_is_zero_minutes() {
        assert_eq!(format_relative_time(&Utc::now()), "0m ago");
    }

    #[test]
    fn format_relative_time_hours() {
        let dt = Utc::now() - Duration::hours(3);
        assert_eq!(format_relative_time(&dt), "3h ago");
    }

    #[test]
    fn format_relative_time_old_date() {
        let dt = Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 1, 17, 12, 0, 0).unwrap();
        assert_eq!(format_relative_time_at(&dt, now), "Jan 15, 2025");
    }

    #[test]
    fn view_splits_body_and_voice() {
        let view = PostView::build(&post(0), false, 2);
        assert_eq!(view.body, "Lost keys");
        assert_eq!(view.voice_references, vec!["https://x/y.wav"]);
        assert_eq!(view.category, "Campus Life");
        assert_eq!(view.toggle_label, None);
    }

    #[test]
    fn toggle_label_reflects_hidden_comments() {
        let collapsed = PostView::build(&post(5), false, 2);
        assert_eq!(collapsed.comments.len(), 2);
        assert_eq!(collapsed.toggle_label.as_deref(), Some("Show 3 More Comments"));

        let expanded = PostView::build(&post(5), true, 2);
        assert_eq!(expanded.comments.len(), 5);
        assert_eq!(expanded.toggle_label.as_deref(), Some("Show Less"));
    }

    #[test]
    fn render_marks_playing_reference() {
        let view = PostView::build(&post(1), false, 2);
        let mut playback = Playback::new();
        assert!(view.render(&playback).contains("▶️ Play https://x/y.wav"));

        playback.select("https://x/y.wav");
        let card = view.render(&playback);
        assert!(card.contains("⏸️ Pause https://x/y.wav"));
        assert!(card.contains("@Anonymous: c0"));
        assert!(card.contains("❤️ 3"));
    }
}
