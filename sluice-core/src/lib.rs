//! Sluice Core
//!
//! Core types and abstractions for the Sluice pipeline builder.
//!
//! This crate contains:
//! - Domain types: the declarative document consumed by the orchestrator
//!   (pipelines, jobs, step fragments, resources)
//! - The execution context switch (local vs. remote)
//! - Name normalization and well-known directory names
//! - A blocking subprocess helper shared by resources and secret managers

pub mod command;
pub mod context;
pub mod domain;
pub mod naming;

pub use command::{CommandError, capture};
pub use context::ExecutionContext;
pub use naming::{CACHE_DIR, SCRIPT_DIR, normalize_name};
