//! The client-side feed.
//!
//! [`FeedStore`] owns the last fetched snapshot of posts, the per-post UI
//! state, and every timer that refreshes the snapshot. Writes never touch the
//! snapshot directly: they go to the remote store and schedule a delayed
//! refetch.

mod poller;
mod ui;

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::FeedConfig;
use crate::draft::{CommentDraft, LocalImage, SharedDraft};
use crate::error::{FeedError, FeedResult, Operation};
use crate::models::{self, author_or_anonymous, Comment, NewComment, NewPost, Post, PostId};
use crate::remote::{Bucket, RemoteStore};
use crate::view::PostView;

pub use poller::Poller;
pub use ui::UiState;

struct Snapshot {
    posts: Arc<Vec<Post>>,
    /// Ticket of the refresh that produced `posts`.
    ticket: u64,
}

struct Inner {
    remote: Arc<dyn RemoteStore>,
    settings: FeedConfig,
    snapshot: RwLock<Snapshot>,
    ui: Mutex<UiState>,
    next_ticket: AtomicU64,
    /// Post submissions currently in flight.
    submitting: AtomicUsize,
    version: watch::Sender<u64>,
    shutdown: watch::Sender<bool>,
}

#[derive(Clone)]
pub struct FeedStore {
    inner: Arc<Inner>,
}

impl FeedStore {
    pub fn new(remote: Arc<dyn RemoteStore>, settings: FeedConfig) -> Self {
        let (version, _) = watch::channel(0);
        let (shutdown, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                remote,
                settings,
                snapshot: RwLock::new(Snapshot {
                    posts: Arc::new(Vec::new()),
                    ticket: 0,
                }),
                ui: Mutex::new(UiState::default()),
                next_ticket: AtomicU64::new(0),
                submitting: AtomicUsize::new(0),
                version,
                shutdown,
            }),
        }
    }

    pub fn settings(&self) -> &FeedConfig {
        &self.inner.settings
    }

    /// The current snapshot, newest post first.
    pub async fn posts(&self) -> Arc<Vec<Post>> {
        self.inner.snapshot.read().await.posts.clone()
    }

    pub async fn post(&self, post_id: &PostId) -> Option<Post> {
        self.posts().await.iter().find(|p| &p.id == post_id).cloned()
    }

    /// Receives the snapshot version every time a refresh is applied.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.version.subscribe()
    }

    pub fn is_submitting(&self) -> bool {
        self.inner.submitting.load(Ordering::SeqCst) > 0
    }

    pub fn is_shut_down(&self) -> bool {
        *self.inner.shutdown.borrow()
    }

    /// Refetch everything and replace the snapshot.
    ///
    /// Returns `Ok(false)` when a later refresh already landed. On failure the
    /// previous snapshot stays in place.
    pub async fn refresh(&self) -> FeedResult<bool> {
        let ticket = self.inner.next_ticket.fetch_add(1, Ordering::SeqCst) + 1;

        let posts = match self.inner.remote.query_posts().await {
            Ok(posts) => posts,
            Err(e) => {
                warn!(error = %e, ticket, "Feed refresh failed, keeping previous snapshot");
                return Err(FeedError::remote(Operation::Refresh, e));
            }
        };

        let mut snapshot = self.inner.snapshot.write().await;
        if ticket < snapshot.ticket {
            debug!(ticket, applied = snapshot.ticket, "Discarding stale refresh");
            return Ok(false);
        }
        let count = posts.len();
        snapshot.posts = Arc::new(posts);
        snapshot.ticket = ticket;
        drop(snapshot);

        self.inner.version.send_modify(|v| *v += 1);
        debug!(ticket, count, "Feed snapshot applied");
        Ok(true)
    }

    /// Refresh after the configured delay unless the store shuts down first.
    pub fn schedule_refresh(&self) -> JoinHandle<()> {
        let store = self.clone();
        let delay = self.inner.settings.refresh_delay();
        let shutdown = self.inner.shutdown.subscribe();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = shutdown_requested(shutdown) => {
                    debug!("Delayed refresh cancelled");
                }
                _ = async {
                    tokio::time::sleep(delay).await;
                    let _ = store.refresh().await;
                } => {}
            }
        })
    }

    /// Stop the polling loop and every pending delayed refresh.
    pub fn shutdown(&self) {
        if !self.inner.shutdown.send_replace(true) {
            info!("Feed store shut down");
        }
    }

    pub(crate) fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.inner.shutdown.subscribe()
    }

    /// Submit the draft as a new post. On success the submitted part of the
    /// draft is cleared; anything appended meanwhile (a voice reference that
    /// finished during the insert) stays. On failure the draft is untouched.
    pub async fn create_post(&self, draft: &SharedDraft) -> FeedResult<Post> {
        let (new_post, image) = {
            let draft = draft.lock().await;
            (draft.to_new_post()?, draft.image.clone())
        };

        self.inner.submitting.fetch_add(1, Ordering::SeqCst);
        let result = self.submit_post(&new_post, image).await;
        self.inner.submitting.fetch_sub(1, Ordering::SeqCst);

        match result {
            Ok(post) => {
                draft.lock().await.clear_submitted(&new_post.text);
                info!(id = %post.id, category = %post.category, "Post created");
                self.schedule_refresh();
                Ok(post)
            }
            Err(e) => {
                warn!(error = %e, "Post creation failed, draft kept");
                Err(e)
            }
        }
    }

    async fn submit_post(&self, new_post: &NewPost, image: Option<LocalImage>) -> FeedResult<Post> {
        let remote = &self.inner.remote;
        let post = remote
            .insert_post(new_post)
            .await
            .map_err(|e| FeedError::remote(Operation::CreatePost, e))?;

        if let Some(image) = image {
            let path = image.upload_path();
            let content_type = image.content_type();
            match remote
                .upload_blob(Bucket::Images, &path, image.bytes, &content_type)
                .await
            {
                Ok(url) => {
                    if let Err(e) = remote.link_image(&post.id, &url).await {
                        warn!(error = %FeedError::remote(Operation::LinkImage, e), id = %post.id, "Image not linked");
                    }
                }
                Err(e) => {
                    warn!(error = %FeedError::remote(Operation::UploadImage, e), path = %path, "Image not uploaded");
                }
            }
        }

        Ok(post)
    }

    /// Add a comment. Blank text is ignored.
    pub async fn add_comment(&self, post_id: &PostId, text: &str, author: &str) -> FeedResult<()> {
        if text.trim().is_empty() {
            return Ok(());
        }

        let comment = NewComment {
            post_id: post_id.clone(),
            author: author_or_anonymous(Some(author)).to_string(),
            text: text.to_string(),
        };
        if let Err(e) = self.inner.remote.insert_comment(&comment).await {
            warn!(error = %e, post_id = %post_id, "Comment failed");
            return Err(FeedError::remote(Operation::AddComment, e));
        }

        self.inner.ui.lock().await.clear_comment_draft(post_id);
        debug!(post_id = %post_id, "Comment added");
        self.schedule_refresh();
        Ok(())
    }

    /// Submit the pending comment draft for a post.
    pub async fn submit_comment_draft(&self, post_id: &PostId) -> FeedResult<()> {
        let draft = self.comment_draft(post_id).await;
        self.add_comment(post_id, &draft.text, &draft.author).await
    }

    pub async fn comment_draft(&self, post_id: &PostId) -> CommentDraft {
        self.inner.ui.lock().await.comment_draft(post_id)
    }

    pub async fn set_comment_text(&self, post_id: &PostId, text: impl Into<String>) {
        self.inner.ui.lock().await.comment_draft_mut(post_id).text = text.into();
    }

    pub async fn set_comment_author(&self, post_id: &PostId, author: impl Into<String>) {
        self.inner.ui.lock().await.comment_draft_mut(post_id).author = author.into();
    }

    /// Record one more like. Repeated calls keep counting.
    pub async fn add_like(&self, post_id: &PostId) -> FeedResult<()> {
        if let Err(e) = self.inner.remote.insert_like(post_id).await {
            warn!(error = %e, post_id = %post_id, "Like failed");
            return Err(FeedError::remote(Operation::AddLike, e));
        }
        debug!(post_id = %post_id, "Like added");
        self.schedule_refresh();
        Ok(())
    }

    pub async fn toggle_comment_expansion(&self, post_id: &PostId) -> bool {
        self.inner.ui.lock().await.toggle_expansion(post_id)
    }

    pub async fn is_expanded(&self, post_id: &PostId) -> bool {
        self.inner.ui.lock().await.is_expanded(post_id)
    }

    pub async fn visible_comments(&self, post: &Post) -> Vec<Comment> {
        let expanded = self.is_expanded(&post.id).await;
        models::visible_comments(
            &post.comments,
            expanded,
            self.inner.settings.collapsed_comment_count,
        )
        .to_vec()
    }

    /// Comments hidden while the post is collapsed.
    pub async fn hidden_comment_count(&self, post: &Post) -> usize {
        if self.is_expanded(&post.id).await {
            return 0;
        }
        post.comments
            .len()
            .saturating_sub(self.inner.settings.collapsed_comment_count)
    }

    /// Render-ready views of the whole snapshot.
    pub async fn views(&self) -> Vec<PostView> {
        let posts = self.posts().await;
        let ui = self.inner.ui.lock().await;
        posts
            .iter()
            .map(|post| {
                PostView::build(
                    post,
                    ui.is_expanded(&post.id),
                    self.inner.settings.collapsed_comment_count,
                )
            })
            .collect()
    }
}

/// Resolves once shutdown is requested or the sender is gone.
pub(crate) async fn shutdown_requested(mut rx: watch::Receiver<bool>) {
    while !*rx.borrow_and_update() {
        if rx.changed().await.is_err() {
            return;
        }
    }
}
