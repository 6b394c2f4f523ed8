//! Repository error envelope.
//!
//! Every storage failure is classified into a `RepoErrorKind` so callers can
//! pick a user-facing message without inspecting SQLite codes.

use crate::db::DbError;
use crate::model::devotion::DevotionId;
use rusqlite::ErrorCode;
use thiserror::Error;

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("{0}")]
    Db(#[from] DbError),
    #[error("devotion not found: {0}")]
    NotFound(DevotionId),
    #[error("missing required table `{0}`; open the store through `db::open_db`")]
    MissingRequiredTable(&'static str),
    #[error("invalid persisted data: {0}")]
    InvalidData(String),
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Coarse failure classes exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoErrorKind {
    NotFound,
    PermissionDenied,
    Network,
    Unknown,
}

impl RepoErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not-found",
            Self::PermissionDenied => "permission-denied",
            Self::Network => "network",
            Self::Unknown => "unknown",
        }
    }

    /// Generic message suitable for an inline error or dialog.
    pub fn user_message(self) -> &'static str {
        match self {
            Self::NotFound => "That devotion no longer exists.",
            Self::PermissionDenied => "You do not have permission to do that.",
            Self::Network => "Could not reach the devotion store. Please try again.",
            Self::Unknown => "Something went wrong. Please try again.",
        }
    }
}

impl RepoError {
    pub fn kind(&self) -> RepoErrorKind {
        match self {
            Self::NotFound(_) => RepoErrorKind::NotFound,
            Self::Db(DbError::Sqlite(err)) => classify_sqlite(err),
            Self::Db(DbError::CreateDir { source, .. })
                if source.kind() == std::io::ErrorKind::PermissionDenied =>
            {
                RepoErrorKind::PermissionDenied
            }
            Self::Db(DbError::UnsupportedSchemaVersion { .. })
            | Self::Db(DbError::CreateDir { .. })
            | Self::MissingRequiredTable(_)
            | Self::InvalidData(_) => RepoErrorKind::Unknown,
        }
    }
}

fn classify_sqlite(err: &rusqlite::Error) -> RepoErrorKind {
    match err.sqlite_error_code() {
        Some(
            ErrorCode::DatabaseBusy
            | ErrorCode::DatabaseLocked
            | ErrorCode::CannotOpen
            | ErrorCode::SystemIoFailure
            | ErrorCode::FileLockingProtocolFailed
            | ErrorCode::OperationInterrupted,
        ) => RepoErrorKind::Network,
        Some(
            ErrorCode::PermissionDenied
            | ErrorCode::ReadOnly
            | ErrorCode::AuthorizationForStatementDenied,
        ) => RepoErrorKind::PermissionDenied,
        _ => RepoErrorKind::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::{RepoError, RepoErrorKind};
    use crate::db::DbError;
    use rusqlite::ffi;
    use std::io::{self, ErrorKind};
    use std::path::PathBuf;
    use uuid::Uuid;

    fn sqlite_failure(code: i32) -> RepoError {
        rusqlite::Error::SqliteFailure(ffi::Error::new(code), None).into()
    }

    #[test]
    fn sqlite_codes_map_to_kinds() {
        assert_eq!(sqlite_failure(ffi::SQLITE_BUSY).kind(), RepoErrorKind::Network);
        assert_eq!(sqlite_failure(ffi::SQLITE_CANTOPEN).kind(), RepoErrorKind::Network);
        assert_eq!(
            sqlite_failure(ffi::SQLITE_READONLY).kind(),
            RepoErrorKind::PermissionDenied
        );
        assert_eq!(
            sqlite_failure(ffi::SQLITE_PERM).kind(),
            RepoErrorKind::PermissionDenied
        );
        assert_eq!(
            sqlite_failure(ffi::SQLITE_CONSTRAINT).kind(),
            RepoErrorKind::Unknown
        );
    }

    #[test]
    fn semantic_errors_map_to_kinds() {
        assert_eq!(
            RepoError::NotFound(Uuid::new_v4()).kind(),
            RepoErrorKind::NotFound
        );
        assert_eq!(
            RepoError::InvalidData("bad".to_string()).kind(),
            RepoErrorKind::Unknown
        );
        assert_eq!(RepoErrorKind::PermissionDenied.as_str(), "permission-denied");
    }

    #[test]
    fn directory_errors_map_by_io_kind() {
        let create_dir = |kind: ErrorKind| -> RepoError {
            DbError::CreateDir {
                path: PathBuf::from("/srv/devotions"),
                source: io::Error::from(kind),
            }
            .into()
        };
        assert_eq!(
            create_dir(ErrorKind::PermissionDenied).kind(),
            RepoErrorKind::PermissionDenied
        );
        assert_eq!(create_dir(ErrorKind::Other).kind(), RepoErrorKind::Unknown);
    }
}
