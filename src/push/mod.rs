//! Push Module
//!
//! Fan-out of serialized board events to connected viewers.

pub mod hub;

pub use hub::{PushHub, Subscription};
