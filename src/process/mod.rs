// src/process/mod.rs

//! Cancellable lifetimes and supervised groups of concurrent tasks.

pub mod context;
pub mod group;

pub use context::{Context, Done};
pub use group::ProcessGroup;
