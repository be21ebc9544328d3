//! Server-side admin sessions.
//!
//! [`gate::AuthorizationGate`] decides per request whether a verified caller
//! may act as an admin; [`cache::AdminSessionCache`] remembers recent grants
//! so the privilege lookup runs at most once per subject per session window.

pub mod cache;
pub mod gate;

pub use cache::AdminSessionCache;
pub use gate::{AuthorizationGate, GateConfig, GateError, PrivilegeLookup};
