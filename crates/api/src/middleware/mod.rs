//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`]: identity from a JWT Bearer token.
//! - [`current_user::CurrentUser`]: the onboarded user and their [`Actor`](htw_core::actor::Actor).
//! - [`rbac::RequireStaff`], [`rbac::RequireEventHost`]: role gates.

pub mod auth;
pub mod current_user;
pub mod rbac;
