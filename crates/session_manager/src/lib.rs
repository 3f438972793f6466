//! # Session Manager
//!
//! Tracks which task list each chat user has selected as active.
//! State is process-wide and in-memory; nothing survives a restart.

pub mod memory;
pub mod store;

// Re-exports
pub use memory::InMemorySessionStore;
pub use store::SessionStore;
