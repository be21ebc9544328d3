//! Request handlers.

pub mod admin;
pub mod health;
