//! Genogram domain model.
//!
//! # Responsibility
//! - Define canonical data structures used by the graph engine.
//! - Keep wire naming out of the model; `file` owns the JSON shape.
//!
//! # Invariants
//! - Every entity is identified by a stable typed id.
//! - Children attach to relationships, never directly to two parents.
//!
//! # See also
//! - crate::store for referential invariants across collections.

pub mod annotation;
pub mod geometry;
pub mod household;
pub mod ids;
pub mod person;
pub mod relationship;
