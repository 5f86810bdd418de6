//! Core library for gymdesk.
//!
//! Everything that is not presentation lives here: the REST client and
//! per-resource services, data models, JWT session handling, the role-based
//! route guard, pagination state, form schemas with validation, and the
//! on-disk snapshot cache. The terminal front end in `gymdesk-tui` is a thin
//! layer over these modules.

pub mod api;
pub mod auth;
pub mod billing;
pub mod cache;
pub mod config;
pub mod dashboard;
pub mod forms;
pub mod guard;
pub mod models;
pub mod pagination;
pub mod utils;

pub use api::{ApiClient, ApiError, ResourceApi};
pub use auth::{Role, Session, SessionData};
pub use config::Config;
pub use guard::{Access, Route};
pub use pagination::{Page, PageQuery};
