//! Note/label repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist contact notes and their label links.
//! - Hand out consistent note snapshots for batch consumers (grouping).
//!
//! # Invariants
//! - Label replacement happens in the same transaction as the field write.
//! - Label names are normalized to lowercase before persistence.
//! - `snapshot_notes` reads notes and labels inside one read transaction.
//! - Both write paths validate their input before touching storage; callers
//!   that accept raw input canonicalize it first (`NoteDraft::normalize`).

use crate::db::DbError;
use crate::model::note::{normalize_labels, Note, NoteDraft, NoteId, NoteValidationError};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const NOTE_SELECT_SQL: &str = "SELECT
    id,
    first_name,
    last_name,
    email,
    telephone,
    address,
    note_text,
    custom_date,
    gender,
    is_done,
    created_at
FROM notes";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for note persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(NoteValidationError),
    Db(DbError),
    NotFound(NoteId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted note data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<NoteValidationError> for RepoError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for contact notes.
pub trait NoteRepository {
    /// Validates and inserts one note with its labels and returns its id.
    fn create_note(&mut self, note: &Note) -> RepoResult<NoteId>;
    /// Validates and replaces all editable fields.
    ///
    /// `draft.labels = None` keeps the stored labels, `Some` replaces the
    /// full set. `is_done = None` keeps the stored flag.
    fn update_note(&mut self, id: NoteId, draft: &NoteDraft, is_done: Option<bool>)
        -> RepoResult<()>;
    /// Deletes one note; returns `false` when it did not exist.
    fn delete_note(&mut self, id: NoteId) -> RepoResult<bool>;
    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>>;
    /// Lists all notes ordered by `created_at DESC, id ASC`.
    fn list_notes(&self) -> RepoResult<Vec<Note>>;
    /// Reads every note inside one read transaction, in storage order.
    fn snapshot_notes(&self) -> RepoResult<Vec<Note>>;
    /// Returns all known label names sorted by name.
    fn list_labels(&self) -> RepoResult<Vec<String>>;
}

/// SQLite-backed note repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn create_note(&mut self, note: &Note) -> RepoResult<NoteId> {
        note.validate()?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO notes (
                id,
                first_name,
                last_name,
                email,
                telephone,
                address,
                note_text,
                custom_date,
                gender,
                is_done,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11);",
            params![
                note.id.to_string(),
                note.first_name.as_deref(),
                note.last_name.as_deref(),
                note.email.as_deref(),
                note.telephone.as_deref(),
                note.address.as_deref(),
                note.note_text.as_str(),
                note.custom_date.as_deref(),
                note.gender.as_deref(),
                bool_to_int(note.is_done),
                note.created_at,
            ],
        )?;
        replace_labels_in_tx(&tx, &note.id.to_string(), &normalize_labels(&note.labels))?;
        tx.commit()?;

        Ok(note.id)
    }

    fn update_note(
        &mut self,
        id: NoteId,
        draft: &NoteDraft,
        is_done: Option<bool>,
    ) -> RepoResult<()> {
        draft.validate()?;

        let id_text = id.to_string();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE notes
             SET
                first_name = ?2,
                last_name = ?3,
                email = ?4,
                telephone = ?5,
                address = ?6,
                note_text = ?7,
                custom_date = ?8,
                gender = ?9,
                is_done = COALESCE(?10, is_done)
             WHERE id = ?1;",
            params![
                id_text.as_str(),
                draft.first_name.as_deref(),
                draft.last_name.as_deref(),
                draft.email.as_deref(),
                draft.telephone.as_deref(),
                draft.address.as_deref(),
                draft.note_text.as_str(),
                draft.custom_date.as_deref(),
                draft.gender.as_deref(),
                is_done.map(bool_to_int),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        if let Some(labels) = draft.labels.as_deref() {
            replace_labels_in_tx(&tx, &id_text, &normalize_labels(labels))?;
        }
        tx.commit()?;
        Ok(())
    }

    fn delete_note(&mut self, id: NoteId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM notes WHERE id = ?1;", [id.to_string()])?;
        Ok(changed > 0)
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            let mut note = parse_note_row(row)?;
            note.labels = load_labels_for_note(self.conn, &note.id.to_string())?;
            return Ok(Some(note));
        }

        Ok(None)
    }

    fn list_notes(&self) -> RepoResult<Vec<Note>> {
        query_notes(
            self.conn,
            &format!("{NOTE_SELECT_SQL} ORDER BY created_at DESC, id ASC;"),
        )
    }

    fn snapshot_notes(&self) -> RepoResult<Vec<Note>> {
        let tx = self.conn.unchecked_transaction()?;
        let notes = query_notes(&tx, &format!("{NOTE_SELECT_SQL} ORDER BY rowid ASC;"))?;
        tx.commit()?;
        Ok(notes)
    }

    fn list_labels(&self) -> RepoResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM labels ORDER BY name COLLATE NOCASE ASC;")?;
        let mut rows = stmt.query([])?;
        let mut labels = Vec::new();
        while let Some(row) = rows.next()? {
            let value: String = row.get("name")?;
            labels.push(value.to_lowercase());
        }
        Ok(labels)
    }
}

fn query_notes(conn: &Connection, sql: &str) -> RepoResult<Vec<Note>> {
    let mut labels_by_note = load_all_labels(conn)?;
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([])?;
    let mut notes = Vec::new();
    while let Some(row) = rows.next()? {
        let mut note = parse_note_row(row)?;
        note.labels = labels_by_note
            .remove(&note.id.to_string())
            .unwrap_or_default();
        notes.push(note);
    }
    Ok(notes)
}

fn parse_note_row(row: &Row<'_>) -> RepoResult<Note> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{id_text}` in notes.id")))?;
    let is_done: i64 = row.get("is_done")?;

    Ok(Note {
        id,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        email: row.get("email")?,
        telephone: row.get("telephone")?,
        address: row.get("address")?,
        note_text: row.get("note_text")?,
        custom_date: row.get("custom_date")?,
        gender: row.get("gender")?,
        is_done: int_to_bool(is_done)?,
        created_at: row.get("created_at")?,
        labels: Vec::new(),
    })
}

fn replace_labels_in_tx(tx: &Transaction<'_>, note_id: &str, labels: &[String]) -> RepoResult<()> {
    tx.execute("DELETE FROM note_labels WHERE note_id = ?1;", [note_id])?;
    for label in labels {
        tx.execute(
            "INSERT OR IGNORE INTO labels (name) VALUES (?1);",
            [label.as_str()],
        )?;
        tx.execute(
            "INSERT INTO note_labels (note_id, label_id)
             SELECT ?1, id
             FROM labels
             WHERE name = ?2 COLLATE NOCASE;",
            params![note_id, label.as_str()],
        )?;
    }
    Ok(())
}

fn load_labels_for_note(conn: &Connection, note_id: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT l.name
         FROM note_labels nl
         INNER JOIN labels l ON l.id = nl.label_id
         WHERE nl.note_id = ?1
         ORDER BY l.name COLLATE NOCASE ASC;",
    )?;
    let mut rows = stmt.query([note_id])?;
    let mut labels = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        labels.push(value.to_lowercase());
    }
    Ok(labels)
}

fn load_all_labels(conn: &Connection) -> RepoResult<HashMap<String, Vec<String>>> {
    let mut stmt = conn.prepare(
        "SELECT nl.note_id, l.name
         FROM note_labels nl
         INNER JOIN labels l ON l.id = nl.label_id
         ORDER BY nl.note_id ASC, l.name COLLATE NOCASE ASC;",
    )?;
    let mut rows = stmt.query([])?;
    let mut by_note: HashMap<String, Vec<String>> = HashMap::new();
    while let Some(row) = rows.next()? {
        let note_id: String = row.get(0)?;
        let name: String = row.get(1)?;
        by_note.entry(note_id).or_default().push(name.to_lowercase());
    }
    Ok(by_note)
}

fn bool_to_int(value: bool) -> i64 {
    i64::from(value)
}

fn int_to_bool(value: i64) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid is_done value `{other}`"
        ))),
    }
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    for table in ["notes", "labels", "note_labels"] {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::InvalidData(format!(
                "missing required table `{table}`; open the database via db::open_db"
            )));
        }
    }
    Ok(())
}
