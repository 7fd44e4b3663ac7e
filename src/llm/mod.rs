//! Outbound chat-model calls.

pub mod provider;

pub use provider::{ChatProvider, HttpChatProvider};
