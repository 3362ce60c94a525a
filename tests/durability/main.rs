//! Integration tests for snapshot durability.
//!
//! These exercise behaviors that need a real store lifecycle
//! (open → write → close or crash → reopen): periodic checkpoints,
//! shutdown saves, and fallback to an empty store when the snapshot
//! pair on disk is damaged.

#[path = "../common/mod.rs"]
mod common;

mod checkpoints;
mod restart;
