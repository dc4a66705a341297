//! The session: one engine handle and the conversation it has seen.
//!
//! A `Session` owns the initialization orchestrator, the history manager
//! and the request router, and exposes completion, embedding, rewind and
//! release on top of them.

mod chat;
mod embed;
mod manager;
mod state;


pub use manager::Session;
pub use state::SessionStatus;
