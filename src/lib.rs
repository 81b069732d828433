// Library exports for campus-feed
// The binary and integration tests use these modules

pub mod capture;
pub mod codec;
pub mod config;
pub mod draft;
pub mod error;
pub mod feed;
pub mod models;
pub mod remote;
pub mod view;

pub use error::{FeedError, FeedResult};
pub use feed::FeedStore;
