//! # stride_core
//!
//! Identity and admin-session logic for Stride: the client-side token
//! provider and the server-side authorization gate.

pub mod auth;
pub mod client;
pub mod clock;
pub mod config;
pub mod models;
pub mod session;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_not_empty() {
        assert!(!version().is_empty());
    }
}
