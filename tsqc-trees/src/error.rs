use thiserror::Error;

/// Errors raised while decoding, validating or analysing a tree sequence.
#[derive(Debug, Error)]
pub enum Error {
    /// The bytes are not a kastore container, or not a tskit one.
    ///
    /// This is the only kind a caller may want to recover from, for example by
    /// trying another container format.
    #[error("File format error: {0}")]
    FileFormat(String),

    /// The kastore major version is not supported.
    #[error("Unsupported kastore version {major}.{minor}")]
    Version { major: u16, minor: u16 },

    /// The container claims to be kastore, but its layout is broken.
    #[error("Corrupt kastore container: {0}")]
    Corrupt(String),

    /// A required column is absent.
    #[error("Required column is missing: {0:?}")]
    MissingColumn(String),

    /// A column is stored with an unexpected element type.
    #[error("Column {key:?} has type {found}, expected {expected}")]
    ColumnType { key: String, found: &'static str, expected: &'static str },

    /// The tables do not describe a valid tree sequence.
    #[error("Bad {table} table: {reason}")]
    BadTable { table: &'static str, reason: String },

    /// Statistics windows must run from 0 to the sequence length, strictly increasing.
    #[error("Bad windows: {0}")]
    BadWindows(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns `true` if the input was not recognized as a tree sequence file at all.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// use tsqc_trees::TreeSequence;
    /// let result = TreeSequence::from_bytes(b"definitely not a tree sequence");
    /// assert!(result.unwrap_err().is_file_format());
    /// ```
    pub fn is_file_format(&self) -> bool {
        matches!(self, Error::FileFormat(_))
    }

    pub(crate) fn bad_table(table: &'static str, reason: impl Into<String>) -> Self {
        Error::BadTable { table, reason: reason.into() }
    }
}
