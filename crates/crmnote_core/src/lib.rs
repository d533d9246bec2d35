//! Core domain logic for crmnote.
//! Contact notes, their storage, update fan-out, and grouping of notes
//! that refer to the same person.

pub mod db;
pub mod grouping;
pub mod logging;
pub mod model;
pub mod notify;
pub mod repo;
pub mod service;

pub use grouping::engine::{group_indices, group_notes, group_notes_with, Closure};
pub use grouping::identifier::{identifiers, Identifier, IdentifierSet};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::note::{Note, NoteDraft, NoteId, NoteValidationError};
pub use notify::registry::{
    BroadcastReport, ClientId, ClientRegistry, SinkError, UpdateEvent, UpdateSink,
};
pub use repo::note_repo::{NoteRepository, RepoError, RepoResult, SqliteNoteRepository};
pub use service::note_service::{GroupedNotes, NoteService, NoteServiceError};

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
