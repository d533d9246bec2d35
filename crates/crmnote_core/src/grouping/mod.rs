//! Record deduplication: clusters notes that refer to the same person.
//!
//! # Responsibility
//! - Derive normalized identifiers (email, telephone, first+last name).
//! - Union notes sharing any identifier into connected components.
//!
//! # Invariants
//! - Only exact matches on normalized identifiers link notes.
//! - Output is a partition of the input; nothing is merged or rewritten.

pub mod engine;
pub mod identifier;
