//! File serving module
//!
//! Read-only path: resolves byte ranges against stored files and builds
//! streaming responses. Independent of the write path.

pub mod range;
pub mod respond;

pub use range::{resolve, RangePlan};
pub use respond::file_response;
