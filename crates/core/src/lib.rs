//! Domain rules for the HTW event-submission portal.
//!
//! This crate has zero I/O: it holds the fixed vocabularies, the event and
//! venue status edge tables, role checks, field validation, review-queue
//! filter derivation, dashboard statistics, and audit hashing. The DB, event
//! and API crates all build on it.

pub mod actor;
pub mod audit;
pub mod dashboard;
pub mod edges;
pub mod error;
pub mod event_validation;
pub mod event_workflow;
pub mod hashing;
pub mod pagination;
pub mod queue;
pub mod roles;
pub mod types;
pub mod venue_workflow;
pub mod vocabulary;
