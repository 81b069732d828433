use std::collections::{HashMap, HashSet};

use crate::draft::CommentDraft;
use crate::models::PostId;

/// Per-post view state that never leaves the client.
#[derive(Debug, Default)]
pub struct UiState {
    expanded: HashSet<PostId>,
    comment_drafts: HashMap<PostId, CommentDraft>,
}

impl UiState {
    /// Flip the expansion flag and return the new value.
    pub fn toggle_expansion(&mut self, post_id: &PostId) -> bool {
        if self.expanded.remove(post_id) {
            false
        } else {
            self.expanded.insert(post_id.clone());
            true
        }
    }

    pub fn is_expanded(&self, post_id: &PostId) -> bool {
        self.expanded.contains(post_id)
    }

    pub fn comment_draft(&self, post_id: &PostId) -> CommentDraft {
        self.comment_drafts.get(post_id).cloned().unwrap_or_default()
    }

    pub fn comment_draft_mut(&mut self, post_id: &PostId) -> &mut CommentDraft {
        self.comment_drafts.entry(post_id.clone()).or_default()
    }

    pub fn clear_comment_draft(&mut self, post_id: &PostId) {
        self.comment_drafts.remove(post_id);
    }
}
