//! # API Shared
//!
//! Shared definitions for the ledger's invocation surfaces.
//!
//! Contains:
//! - Request/response types (`types` module), with OpenAPI schemas
//! - Shared services like `HealthService`
//! - Authentication utilities
//!
//! Used by `api-rest`.

pub mod auth;
pub mod health;
pub mod types;

pub use health::HealthService;
pub use types::*;
