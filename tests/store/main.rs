//! Integration tests for the vector store.
//!
//! These exercise the public `VectorStore` API end to end: search
//! ordering and thresholds, rebuild-on-delete, the result cache, shared
//! access from many threads, and the open/close lifecycle.

#[path = "../common/mod.rs"]
mod common;

mod cache;
mod concurrency;
mod scenario;
