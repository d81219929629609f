//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod audit_repo;
pub mod event_repo;
pub mod user_repo;
pub mod venue_repo;

pub use audit_repo::AuditLogRepo;
pub use event_repo::EventRepo;
pub use user_repo::UserRepo;
pub use venue_repo::VenueRepo;

/// Outcome of a conditional status write.
#[derive(Debug)]
pub enum TransitionWrite<T> {
    /// The row still had the expected status; both writes committed.
    Applied(T, crate::models::status_history::StatusHistory),
    /// The row exists but its status changed since it was read.
    Stale,
    /// No row with that id.
    Missing,
}
