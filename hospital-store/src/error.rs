use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("{entity} already exists: {detail}")]
    Conflict { entity: &'static str, detail: String },

    #[error("{0}")]
    Other(String),
}

impl StoreError {
    /// Translate constraint failures of an insert into `Conflict` / `NotFound`.
    ///
    /// `referenced` names the parent row checked by a foreign key.
    pub(crate) fn from_insert(
        err: rusqlite::Error,
        entity: &'static str,
        referenced: Option<(&'static str, String)>,
    ) -> Self {
        if let rusqlite::Error::SqliteFailure(ref failure, ref message) = err
            && failure.code == ErrorCode::ConstraintViolation
        {
            match failure.extended_code {
                rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    return StoreError::Conflict {
                        entity,
                        detail: message.clone().unwrap_or_else(|| "duplicate key".to_string()),
                    };
                }
                rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                    if let Some((parent, key)) = referenced {
                        return StoreError::NotFound { entity: parent, key };
                    }
                }
                _ => {}
            }
        }
        StoreError::Sqlite(err)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
