//! Declarative document types
//!
//! This module contains the structures that make up the document handed to
//! the external orchestrator. They are pure data: the engine builds them from
//! its pipeline graph and serializes them, nothing here executes anything.

pub mod job;
pub mod pipeline;
pub mod resource;
