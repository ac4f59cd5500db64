//! Shared types for the BMR membership backend
//!
//! Error codes, the response envelope, time helpers and the closed domain
//! enums (workflow statuses, payment method/status, roles and permissions).

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};
