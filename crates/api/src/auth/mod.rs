//! Authentication primitives.
//!
//! - [`jwt`]: access-token validation against the identity provider's secret.

pub mod jwt;
