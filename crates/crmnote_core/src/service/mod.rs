//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls, grouping and notifications into use-case
//!   level APIs.
//! - Keep transport layers decoupled from storage details.

pub mod note_service;
