//! Note use-case service.
//!
//! # Responsibility
//! - Provide create/update/delete/get/list APIs over a `NoteRepository`.
//! - Produce grouped views of the full note set via the grouping engine.
//! - Publish update events after successful writes.
//!
//! # Invariants
//! - Drafts are canonicalized (`NoteDraft::normalize`) before any
//!   repository call; the repository re-checks what it stores.
//! - Every write is read back; a missing read-back is `InconsistentState`.
//! - Events are published only after the write committed.
//! - Log lines carry ids and counts, never contact field values.

use crate::grouping::engine::{group_notes_with, Closure};
use crate::model::note::{Note, NoteDraft, NoteId, NoteValidationError};
use crate::notify::registry::{ClientRegistry, UpdateEvent};
use crate::repo::note_repo::{NoteRepository, RepoError, RepoResult};
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Service error for note use-cases.
#[derive(Debug)]
pub enum NoteServiceError {
    /// Draft failed field validation.
    InvalidInput(NoteValidationError),
    /// Target note does not exist.
    NoteNotFound(NoteId),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(err) => write!(f, "invalid note input: {err}"),
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent note state: {details}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidInput(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for NoteServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NoteNotFound(id),
            RepoError::Validation(err) => Self::InvalidInput(err),
            other => Self::Repo(other),
        }
    }
}

impl From<NoteValidationError> for NoteServiceError {
    fn from(value: NoteValidationError) -> Self {
        Self::InvalidInput(value)
    }
}

/// Grouped view of all stored notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupedNotes {
    /// Groups in seed order, each sorted newest-first.
    pub groups: Vec<Vec<Note>>,
    /// Number of notes in the snapshot that was grouped.
    pub note_count: usize,
}

/// Note service facade over repository implementations.
pub struct NoteService<R: NoteRepository> {
    repo: R,
    updates: Option<Arc<ClientRegistry>>,
}

impl<R: NoteRepository> NoteService<R> {
    /// Creates a service that publishes no events.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            updates: None,
        }
    }

    /// Creates a service that publishes write events to `updates`.
    pub fn with_updates(repo: R, updates: Arc<ClientRegistry>) -> Self {
        Self {
            repo,
            updates: Some(updates),
        }
    }

    /// Creates one note stamped with the current time.
    pub fn create_note(&mut self, draft: NoteDraft) -> Result<Note, NoteServiceError> {
        self.create_note_at(draft, now_epoch_ms())
    }

    /// Creates one note with a caller-provided creation time (imports).
    pub fn create_note_at(
        &mut self,
        draft: NoteDraft,
        created_at: i64,
    ) -> Result<Note, NoteServiceError> {
        let draft = draft.normalize()?;
        let note = Note::from_draft(draft, created_at);
        let id = self.repo.create_note(&note)?;
        let created = self
            .repo
            .get_note(id)?
            .ok_or(NoteServiceError::InconsistentState(
                "created note not found in read-back",
            ))?;

        info!("event=note_create module=service status=ok note_id={id}");
        self.publish(UpdateEvent::NoteCreated { id });
        Ok(created)
    }

    /// Replaces editable fields of one note.
    ///
    /// Labels are replaced only when `draft.labels` is `Some`.
    pub fn update_note(
        &mut self,
        id: NoteId,
        draft: NoteDraft,
        is_done: Option<bool>,
    ) -> Result<Note, NoteServiceError> {
        let draft = draft.normalize()?;
        self.repo.update_note(id, &draft, is_done)?;
        let updated = self
            .repo
            .get_note(id)?
            .ok_or(NoteServiceError::InconsistentState(
                "updated note not found in read-back",
            ))?;

        info!("event=note_update module=service status=ok note_id={id}");
        self.publish(UpdateEvent::NoteUpdated { id });
        Ok(updated)
    }

    /// Deletes one note.
    pub fn delete_note(&mut self, id: NoteId) -> Result<(), NoteServiceError> {
        if !self.repo.delete_note(id)? {
            return Err(NoteServiceError::NoteNotFound(id));
        }

        info!("event=note_delete module=service status=ok note_id={id}");
        self.publish(UpdateEvent::NoteDeleted { id });
        Ok(())
    }

    pub fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
        self.repo.get_note(id)
    }

    /// Lists all notes newest-first.
    pub fn list_notes(&self) -> RepoResult<Vec<Note>> {
        self.repo.list_notes()
    }

    pub fn list_labels(&self) -> RepoResult<Vec<String>> {
        self.repo.list_labels()
    }

    /// Groups every stored note by shared email, telephone or name.
    ///
    /// The snapshot is read in one transaction; grouping itself is pure.
    pub fn grouped_notes(&self, closure: Closure) -> Result<GroupedNotes, NoteServiceError> {
        let started_at = Instant::now();
        let notes = self.repo.snapshot_notes()?;
        let groups = group_notes_with(&notes, closure);

        info!(
            "event=notes_grouped module=service status=ok closure={closure:?} notes={} groups={} duration_ms={}",
            notes.len(),
            groups.len(),
            started_at.elapsed().as_millis()
        );
        Ok(GroupedNotes {
            groups,
            note_count: notes.len(),
        })
    }

    fn publish(&self, event: UpdateEvent) {
        if let Some(updates) = self.updates.as_ref() {
            let report = updates.broadcast(&event);
            debug!(
                "event=note_publish module=service status=ok kind={} delivered={}",
                event.name(),
                report.delivered
            );
        }
    }
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
        })
}
