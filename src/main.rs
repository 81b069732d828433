use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use campus_feed::capture::{CaptureSession, Playback, WavFileInput};
use campus_feed::config::{Cli, Command, Config};
use campus_feed::draft::{Draft, LocalImage};
use campus_feed::feed::FeedStore;
use campus_feed::models::{Category, PostId};
use campus_feed::remote::{MemoryStore, RemoteStore, RestStore};
use campus_feed::FeedError;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse CLI args and load config
    let cli = Cli::parse();
    let config = Config::load(&cli)?;

    let remote: Arc<dyn RemoteStore> = if cli.offline {
        tracing::info!("Using in-memory backend");
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(RestStore::new(&config.remote)?)
    };
    let store = FeedStore::new(remote.clone(), config.feed.clone());

    let result = match cli.command {
        Command::Watch { once } => watch(&store, once).await,
        Command::Post {
            text,
            author,
            category,
            image,
            voice,
        } => {
            let draft = PostArgs {
                text,
                author,
                category,
                image,
                voice,
            };
            post(&store, remote, &config, draft).await
        }
        Command::Comment {
            post_id,
            text,
            author,
        } => {
            let post_id = PostId::new(post_id);
            store
                .add_comment(&post_id, &text, author.as_deref().unwrap_or(""))
                .await
                .map_err(alert)?;
            settle_and_print(&store).await;
            Ok(())
        }
        Command::Like { post_id, times } => {
            let post_id = PostId::new(post_id);
            for _ in 0..times {
                store.add_like(&post_id).await.map_err(alert)?;
            }
            settle_and_print(&store).await;
            Ok(())
        }
    };

    store.shutdown();
    result
}

struct PostArgs {
    text: String,
    author: Option<String>,
    category: Category,
    image: Option<PathBuf>,
    voice: Option<PathBuf>,
}

async fn watch(store: &FeedStore, once: bool) -> anyhow::Result<()> {
    if once {
        store.refresh().await.map_err(alert)?;
        print_feed(store).await;
        return Ok(());
    }

    let mut updates = store.subscribe();
    let poller = store.start_polling();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                print_feed(store).await;
            }
        }
    }
    store.shutdown();
    poller.join().await;
    Ok(())
}

async fn post(
    store: &FeedStore,
    remote: Arc<dyn RemoteStore>,
    config: &Config,
    args: PostArgs,
) -> anyhow::Result<()> {
    let mut draft = Draft::new(args.text);
    draft.author = args.author.unwrap_or_default();
    draft.category = args.category;
    if let Some(path) = args.image {
        draft.image = Some(LocalImage::load(&path).await?);
    }
    let draft = draft.shared();

    if let Some(path) = args.voice {
        let mut session = CaptureSession::new(
            Arc::new(WavFileInput::new(path)),
            remote,
            draft.clone(),
            config.capture.file_prefix.clone(),
        );
        session.start().await.map_err(|e| alert(e.into()))?;
        session.stop().await.map_err(|e| alert(e.into()))?;
    }

    let created = store.create_post(&draft).await.map_err(alert)?;
    println!("Created post #{}", created.id);
    settle_and_print(store).await;
    Ok(())
}

/// Wait for the delayed refresh a write schedules, then print.
async fn settle_and_print(store: &FeedStore) {
    let mut updates = store.subscribe();
    let wait = store.settings().refresh_delay() * 2;
    if tokio::time::timeout(wait, updates.changed()).await.is_err() {
        tracing::warn!("Feed did not refresh in time");
    }
    print_feed(store).await;
}

async fn print_feed(store: &FeedStore) {
    let playback = Playback::new();
    let views = store.views().await;
    if views.is_empty() {
        println!("(no posts yet)");
        return;
    }
    for view in views {
        println!("{}", view.render(&playback));
    }
}

/// Print the blocking message, if any, and hand the error back.
fn alert(err: FeedError) -> anyhow::Error {
    if let Some(message) = err.user_alert() {
        eprintln!("{}", message);
    }
    err.into()
}
