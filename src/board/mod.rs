//! Board Module
//!
//! The shared board is an ordered queue of live events (text snippets and
//! file announcements) plus the sequence counter that stamps every broadcast.

pub mod queue;
pub mod types;

pub use queue::MessageQueue;
pub use types::*;
