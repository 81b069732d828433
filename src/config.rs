use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::models::Category;

/// Local development endpoint of the hosted backend.
pub const DEFAULT_URL: &str = "http://localhost:54321";

pub const URL_ENV: &str = "CAMPUS_FEED_URL";
pub const ANON_KEY_ENV: &str = "CAMPUS_FEED_ANON_KEY";

#[derive(Parser, Debug)]
#[command(name = "campus-feed", about = "A polling campus social feed client")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend endpoint
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Backend anon key
    #[arg(long, global = true)]
    pub key: Option<String>,

    /// Use an in-memory backend instead of the remote one
    #[arg(long, global = true)]
    pub offline: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Poll the feed and print it on every update
    Watch {
        /// Print one snapshot and exit
        #[arg(long)]
        once: bool,
    },

    /// Create a post
    Post {
        #[arg(default_value = "")]
        text: String,

        #[arg(short, long)]
        author: Option<String>,

        #[arg(long, default_value_t = Category::General)]
        category: Category,

        /// Image file to attach
        #[arg(long)]
        image: Option<PathBuf>,

        /// WAV file to record as a voice message
        #[arg(long)]
        voice: Option<PathBuf>,
    },

    /// Comment on a post
    Comment {
        post_id: String,
        text: String,

        #[arg(short, long)]
        author: Option<String>,
    },

    /// Like a post
    Like {
        post_id: String,

        #[arg(long, default_value_t = 1)]
        times: u32,
    },
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub remote: RemoteConfig,
    pub feed: FeedConfig,
    pub capture: CaptureConfig,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct RemoteConfig {
    pub url: String,
    pub anon_key: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct FeedConfig {
    pub poll_interval_secs: u64,
    pub refresh_delay_ms: u64,
    pub collapsed_comment_count: usize,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct CaptureConfig {
    pub file_prefix: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            anon_key: String::new(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5,
            refresh_delay_ms: 1000,
            collapsed_comment_count: 2,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            file_prefix: "voice-".to_string(),
        }
    }
}

impl FeedConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn refresh_delay(&self) -> Duration {
        Duration::from_millis(self.refresh_delay_ms)
    }
}

impl Config {
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        Self::load_with_env(cli, |name| std::env::var(name).ok())
    }

    /// File, then environment, then CLI flags.
    pub fn load_with_env<F>(cli: &Cli, env: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| Self::config_dir().join("config.toml"));

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        config.apply_env(env);

        // CLI overrides
        if let Some(ref url) = cli.url {
            config.remote.url = url.clone();
        }
        if let Some(ref key) = cli.key {
            config.remote.anon_key = key.clone();
        }

        if config.remote.anon_key.is_empty() && !cli.offline {
            tracing::warn!(
                "No anon key configured; set {} or remote.anon_key",
                ANON_KEY_ENV
            );
        }

        Ok(config)
    }

    pub fn apply_env<F>(&mut self, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = env(URL_ENV).filter(|v| !v.is_empty()) {
            self.remote.url = url;
        }
        if let Some(key) = env(ANON_KEY_ENV).filter(|v| !v.is_empty()) {
            self.remote.anon_key = key;
        }
    }

    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("campus-feed")
    }
}
