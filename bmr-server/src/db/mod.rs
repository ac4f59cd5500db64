//! Database access layer
//!
//! One module per table group. Functions take `&PgPool` for single
//! statements and `&mut PgConnection` when they must run inside a caller's
//! transaction.

pub mod audit;
pub mod infos;
pub mod logs;
pub mod lookups;
pub mod memberships;
pub mod payments;
pub mod profiles;
pub mod refresh_tokens;
pub mod roles;
pub mod statuses;
pub mod users;
