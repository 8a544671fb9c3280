use std::path::PathBuf;

use thiserror::Error;

/// Schema violations found while reading a tier or terminology record.
///
/// These abort the table build that hit them; everything else in the
/// generator is recovered from locally.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("{file}: record {key:?} is missing field {field:?}")]
    MissingField {
        file: PathBuf,
        key: String,
        field: &'static str,
    },

    #[error("{file}: record {key:?} field {field:?} is not a string")]
    InvalidField {
        file: PathBuf,
        key: String,
        field: &'static str,
    },

    #[error("{file}: record {key:?} is not an object")]
    NotAnObject { file: PathBuf, key: String },
}
