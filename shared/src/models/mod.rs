//! Domain models shared between the server and API clients
//!
//! Closed enums only; database row types live in `bmr-server::db`.

pub mod payment;
pub mod profile;
pub mod role;
pub mod status;

// Re-exports
pub use payment::*;
pub use profile::*;
pub use role::*;
pub use status::*;
