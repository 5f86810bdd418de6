//! REST API client module for the gym-management backend.
//!
//! `ApiClient` owns the HTTP connection pool and bearer token. Per-resource
//! services are exposed as `ResourceApi<R>` handles borrowed from the
//! client (`api.resource::<Member>()`), with resource-specific endpoints
//! layered on top in `services`.

pub mod client;
pub mod error;
pub mod resource;
pub mod services;

pub use client::ApiClient;
pub use error::{api_error, ApiError};
pub use resource::{Resource, ResourceApi};
