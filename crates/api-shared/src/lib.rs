//! # API Shared
//!
//! Shared wire types and services for the QuackHub APIs.
//!
//! Contains:
//! - Request and response bodies (`messages` module), with OpenAPI schemas
//! - Shared services like `HealthService`
//!
//! Used by `api-rest` and by anything else that speaks the same JSON.

pub mod health;
pub mod messages;

pub use health::HealthService;
pub use messages::*;
