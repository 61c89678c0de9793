//! Upload Session Module
//!
//! One session per dropped file, identified by an unguessable hex token:
//!
//! 1. Client announces a file and receives a session token
//! 2. Chunks are appended sequentially over the same connection
//! 3. Finish freezes the byte count and starts the retention window
//! 4. The file is served until it expires or is removed

pub mod store;
pub mod types;

pub use store::SessionStore;
pub use types::*;
