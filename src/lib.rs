//! Client for a property ("매물") note-taking backend.
//!
//! The crate wraps the REST service behind [`api::PropertyApi`], keeps
//! session and cached records in [`store::AppStore`], and synchronizes map
//! markers with the visible viewport in [`map::ViewportWatcher`].

pub mod api;
pub mod config;
pub mod draft;
pub mod error;
pub mod map;
pub mod models;
pub mod session;
pub mod store;

pub use error::{ApiError, ApiResult};
