//! Domain model for contact notes.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep records plain values so grouping has no hidden storage coupling.
//!
//! # Invariants
//! - Every note is identified by a stable `NoteId`.

pub mod note;
