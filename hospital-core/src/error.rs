use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CoreError {
    #[error("Unknown search field: {field}")]
    UnknownFilter { field: String },

    #[error("At least one search field is required")]
    EmptyFilter,

    #[error("Validation error: {message}")]
    Validation { message: String },
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        CoreError::Validation {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
