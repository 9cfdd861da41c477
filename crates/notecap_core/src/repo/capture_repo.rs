//! Durable capture state repository and SQLite implementation.
//!
//! # Responsibility
//! - Persist the single pending `CaptureTarget` across process death.
//! - Persist deferred permission actions until the prompt they wait on is
//!   answered or superseded.
//!
//! # Invariants
//! - At most one pending capture row exists (`slot = 1`).
//! - At most one deferred action exists per permission.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::model::media::{CaptureTarget, MediaKind, RequestId};
use crate::permission::{Continuation, DeferredAction, Permission};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for durable capture state.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// A pending capture is already stored under another request id.
    SlotOccupied(RequestId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::SlotOccupied(id) => write!(f, "pending capture slot occupied by {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted capture state: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::SlotOccupied(_) | Self::InvalidData(_) => None,
        }
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

/// Repository interface for durable capture state.
pub trait CaptureStateRepository: Send {
    /// Loads the pending capture, if any.
    fn load_pending(&self) -> RepoResult<Option<CaptureTarget>>;
    /// Stores `target` as the pending capture. Fails when the slot is taken.
    fn save_pending(&self, target: &CaptureTarget) -> RepoResult<()>;
    /// Clears the pending capture when it matches `request_id`.
    fn clear_pending(&self, request_id: RequestId) -> RepoResult<bool>;
    /// Records `action` unless one is already stored for its permission.
    fn record_deferred(&self, action: &DeferredAction) -> RepoResult<bool>;
    /// Stores `action`, replacing any action left for its permission.
    fn replace_deferred(&self, action: &DeferredAction) -> RepoResult<()>;
    /// Drops the deferred action for `permission`, if any.
    fn clear_deferred(&self, permission: Permission) -> RepoResult<bool>;
    /// Loads the deferred action for `permission` without removing it.
    fn load_deferred(&self, permission: Permission) -> RepoResult<Option<DeferredAction>>;
    /// Removes and returns the deferred action for `permission`.
    fn take_deferred(&self, permission: Permission) -> RepoResult<Option<DeferredAction>>;
}

/// SQLite-backed capture state store.
///
/// Owns its connection: the store lives as long as the coordinator.
pub struct SqliteCaptureStateRepository {
    conn: Connection,
}

impl SqliteCaptureStateRepository {
    /// Wraps a migrated connection (see `db::open_db`).
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl CaptureStateRepository for SqliteCaptureStateRepository {
    fn load_pending(&self) -> RepoResult<Option<CaptureTarget>> {
        let mut stmt = self.conn.prepare(
            "SELECT request_id, kind, uri, file_path, allocated_at
             FROM pending_captures
             WHERE slot = 1;",
        )?;
        let mut rows = stmt.query([])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_pending_row(row)?)),
            None => Ok(None),
        }
    }

    fn save_pending(&self, target: &CaptureTarget) -> RepoResult<()> {
        if !target.kind.is_camera_capture() {
            return Err(RepoError::InvalidData(format!(
                "kind `{}` cannot be a capture target",
                target.kind.as_str()
            )));
        }
        let file_path = target.file_path.to_str().ok_or_else(|| {
            RepoError::InvalidData("capture file path is not valid UTF-8".to_string())
        })?;

        let changed = self.conn.execute(
            "INSERT INTO pending_captures (slot, request_id, kind, uri, file_path, allocated_at)
             VALUES (1, ?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(slot) DO NOTHING;",
            params![
                target.request_id.to_string(),
                target.kind.as_str(),
                target.uri.as_str(),
                file_path,
                target.allocated_at,
            ],
        )?;

        if changed == 0 {
            let occupant = self
                .load_pending()?
                .map_or(target.request_id, |pending| pending.request_id);
            return Err(RepoError::SlotOccupied(occupant));
        }
        Ok(())
    }

    fn clear_pending(&self, request_id: RequestId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM pending_captures WHERE request_id = ?1;",
            [request_id.to_string()],
        )?;
        Ok(changed > 0)
    }

    fn record_deferred(&self, action: &DeferredAction) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "INSERT INTO deferred_actions (permission, kind, continuation, recorded_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(permission) DO NOTHING;",
            params![
                action.permission.as_str(),
                action.kind.as_str(),
                action.continuation.as_str(),
                action.recorded_at,
            ],
        )?;
        Ok(changed > 0)
    }

    fn replace_deferred(&self, action: &DeferredAction) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO deferred_actions (permission, kind, continuation, recorded_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(permission) DO UPDATE SET
                kind = excluded.kind,
                continuation = excluded.continuation,
                recorded_at = excluded.recorded_at;",
            params![
                action.permission.as_str(),
                action.kind.as_str(),
                action.continuation.as_str(),
                action.recorded_at,
            ],
        )?;
        Ok(())
    }

    fn clear_deferred(&self, permission: Permission) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM deferred_actions WHERE permission = ?1;",
            [permission.as_str()],
        )?;
        Ok(changed > 0)
    }

    fn load_deferred(&self, permission: Permission) -> RepoResult<Option<DeferredAction>> {
        let row = self
            .conn
            .query_row(
                "SELECT permission, kind, continuation, recorded_at
                 FROM deferred_actions
                 WHERE permission = ?1;",
                [permission.as_str()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(permission, kind, continuation, recorded_at)| {
            parse_deferred(&permission, &kind, &continuation, recorded_at)
        })
        .transpose()
    }

    fn take_deferred(&self, permission: Permission) -> RepoResult<Option<DeferredAction>> {
        let action = self.load_deferred(permission)?;
        if action.is_some() {
            self.clear_deferred(permission)?;
        }
        Ok(action)
    }
}

fn parse_pending_row(row: &Row<'_>) -> RepoResult<CaptureTarget> {
    let id_text: String = row.get("request_id")?;
    let request_id = Uuid::parse_str(&id_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid uuid `{id_text}` in pending_captures.request_id"
        ))
    })?;

    let kind_text: String = row.get("kind")?;
    let kind = MediaKind::parse(&kind_text)
        .filter(|kind| kind.is_camera_capture())
        .ok_or_else(|| {
            RepoError::InvalidData(format!("invalid kind `{kind_text}` in pending_captures.kind"))
        })?;

    let file_path: String = row.get("file_path")?;
    Ok(CaptureTarget {
        request_id,
        kind,
        uri: row.get("uri")?,
        file_path: PathBuf::from(file_path),
        allocated_at: row.get("allocated_at")?,
    })
}

fn parse_deferred(
    permission: &str,
    kind: &str,
    continuation: &str,
    recorded_at: i64,
) -> RepoResult<DeferredAction> {
    let permission = Permission::parse(permission).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid permission `{permission}` in deferred_actions.permission"
        ))
    })?;
    let kind = MediaKind::parse(kind).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid kind `{kind}` in deferred_actions.kind"))
    })?;
    let continuation = Continuation::parse(continuation).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid continuation `{continuation}` in deferred_actions.continuation"
        ))
    })?;
    Ok(DeferredAction {
        permission,
        kind,
        continuation,
        recorded_at,
    })
}
