//! Domain services built on top of the key/value cache.
//!
//! The `web` layer depends on this crate rather than on `cache` directly; cache errors
//! are translated into [`error::Error`] here so HTTP status mapping only has to know
//! about domain error kinds.

pub mod error;
pub mod session;

pub use session::{Session, SessionManager};

/// Identifier of a user in the relational store. Only carried, never interpreted.
pub type UserId = i64;
