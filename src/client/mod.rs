//! Client core of the discussion forum.
//!
//! Keeps a local copy of the posts on the current page and turns user actions
//! into [`ForumApi`] calls. State is only ever replaced with what the server
//! answered; nothing is applied optimistically.
pub mod api;
pub mod config;
pub mod controller;
pub mod error;
pub mod http;
pub mod identity;
pub mod sorting;
pub mod store;

pub use api::ForumApi;
pub use config::ClientConfig;
pub use controller::{EditState, ForumController, Notice, Operation, ReplyPanel};
pub use error::{ForumError, ForumResult};
pub use http::HttpForumApi;
pub use identity::IdentityContext;
pub use sorting::{SortCriterion, sort};
pub use store::ForumStore;
