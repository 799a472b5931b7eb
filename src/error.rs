//! Defines [`Error`], representing all failures returned by this crate.
use std::fmt::{Debug, Display, Formatter};
use std::path::PathBuf;

/// Many different operations in this crate return this error type.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// Returned when an input path does not point to an existing file or directory.
    InvalidInputPath(PathBuf),
    /// Returned when a requested column is not part of a file's schema.
    ColumnNotFound {
        /// The requested column name.
        column: String,
        /// The names the file's schema does contain.
        available: Vec<String>,
    },
    /// Returned when a row group cannot be decoded.
    CorruptData {
        /// Index of the offending row group.
        row_group: usize,
        source: arrow2::error::Error,
    },
    /// Returned when a row-group span reaches beyond the file.
    OutOfRange {
        start: usize,
        end: usize,
        row_groups: usize,
    },
    /// Returned when a dataset description stored in a file footer is not valid JSON.
    Metadata(serde_json::Error),
    /// Triggered by the columnar engine outside of row-group decoding.
    Engine(arrow2::error::Error),
    /// Wrapper for IO errors.
    Io(std::io::Error),
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::Io(error)
    }
}

impl From<arrow2::error::Error> for Error {
    fn from(error: arrow2::error::Error) -> Self {
        Error::Engine(error)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidInputPath(path) => {
                write!(f, "Input path \"{}\" does not exist", path.display())
            }
            Error::ColumnNotFound { column, available } => {
                write!(
                    f,
                    "Column \"{}\" does not exist in the file (available: {})",
                    column,
                    available.join(", ")
                )
            }
            Error::CorruptData { row_group, source } => {
                write!(f, "Row group {} cannot be decoded: {}", row_group, source)
            }
            Error::OutOfRange {
                start,
                end,
                row_groups,
            } => {
                write!(
                    f,
                    "Row groups {}..{} are out of range: the file has {} row groups",
                    start, end, row_groups
                )
            }
            Error::Metadata(source) => {
                write!(f, "Dataset metadata is not valid JSON: {}", source)
            }
            Error::Engine(source) => write!(f, "Arrow error: {}", source),
            Error::Io(source) => write!(f, "Io error: {}", source),
        }
    }
}

impl std::error::Error for Error {}

/// Typedef for a [`std::result::Result`] of an [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
