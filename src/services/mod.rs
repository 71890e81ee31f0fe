//! Device-side business logic
//!
//! Kept separate from HTTP concerns so it can be tested without a server.

pub mod config_store;
