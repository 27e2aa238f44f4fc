//! # Phaseplan Shared Library
//!
//! Domain types, persistence and business rules shared by the Phaseplan
//! API server and its tests.
//!
//! ## Module Organization
//!
//! - `models`: Database models (users, projects, phases, tasks)
//! - `db`: Connection pool and migrations
//! - `auth`: Credentials, session tokens, reset tokens and ownership checks
//! - `budget`: Hour allocation rules across a project's phases
//! - `completion`: Phase/task completion state machine
//! - `mailer`: Out-of-band delivery of password reset links

pub mod auth;
pub mod budget;
pub mod completion;
pub mod db;
pub mod mailer;
pub mod models;

/// Current version of the Phaseplan shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
