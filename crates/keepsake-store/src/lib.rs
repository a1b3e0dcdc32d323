//! In-memory content-addressed photo store.
//!
//! This crate owns every photo and feeling record for the lifetime of a
//! conversational session. Uploaded photos are deduplicated by a content
//! hash computed over a canonical re-encoding of their pixel data, so the
//! same picture uploaded twice (even in different containers) resolves to
//! one stored photo.

pub mod error;
pub mod hash;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use hash::content_hash;
pub use store::PhotoStore;
