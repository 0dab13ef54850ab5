//! Colloquy Core Types and Definitions
//!
//! This crate provides the foundational types for persisting dialogue graphs.
//! It includes:
//!
//! - **Identifiers**: Element ids and validated names ([`identifier`] module)
//! - **Geometry**: Opaque editor coordinates ([`geometry::Position`])
//! - **Payloads**: Uninterpreted typed handles for event/audio data ([`payload`] module)
//! - **Snapshots**: The editor's view of a graph ([`snapshot`] module)
//! - **Records**: The persisted document and materialized entities ([`record`] module)
//! - **Resolution**: Call-scoped id binding tables ([`resolver`] module)

pub mod geometry;
pub mod identifier;
pub mod payload;
pub mod record;
pub mod resolver;
pub mod snapshot;
