//! Error types for query building, type inference and compilation.

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed builder arguments, raised at construction time.
    Builder,
    /// Type mismatch or missing type information.
    Type,
    /// Failure while rendering a node to SQL.
    Compile,
    /// Failure to open a database connection.
    Connect,
    /// Failure reported by the database while executing a statement.
    Execution,
}

/// Errors produced by the query layer and its collaborators.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Generic builder error.
    #[error("Query builder error: {0}")]
    Builder(String),

    /// A table path had no segments, or an empty one.
    #[error("Table path must be a non-empty sequence of non-empty names")]
    EmptyTablePath,

    /// A column placeholder was bound twice.
    #[error("Already resolved: {0}")]
    AlreadyResolved(String),

    /// A name could not be found in the schema it was looked up in.
    #[error("Column '{column}' not found in {table}")]
    UnknownColumn {
        /// The relation that was searched.
        table: String,
        /// The requested column name.
        column: String,
    },

    /// More than one joined relation provides the column.
    #[error("Column '{0}' is ambiguous between joined tables")]
    AmbiguousColumn(String),

    /// Incompatible operand or branch types.
    #[error("Type error: {0}")]
    Type(String),

    /// A column's type was requested on a relation without a schema.
    #[error("Schema required for table {0}")]
    SchemaRequired(String),

    /// Generic compile error.
    #[error("Compile error: {0}")]
    Compile(String),

    /// A column placeholder was compiled before being bound.
    #[error("Column not resolved: {0}")]
    Unresolved(String),

    /// A column matches several aliases of the current join scope.
    #[error("Too many aliases for column {0}")]
    TooManyAliases(String),

    /// A parameter was referenced but not supplied to the compiler.
    #[error("Missing parameter: {0}")]
    MissingParam(String),

    /// The database could not be connected to.
    #[error("Connection error: {0}")]
    Connect(String),

    /// The database rejected a statement.
    #[error("Execution error: {message}")]
    Execution {
        /// The statement that failed.
        sql: String,
        /// The message reported by the database.
        message: String,
    },
}

impl Error {
    /// Returns the broad category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Builder(_)
            | Self::EmptyTablePath
            | Self::AlreadyResolved(_)
            | Self::UnknownColumn { .. }
            | Self::AmbiguousColumn(_) => ErrorKind::Builder,
            Self::Type(_) | Self::SchemaRequired(_) => ErrorKind::Type,
            Self::Compile(_)
            | Self::Unresolved(_)
            | Self::TooManyAliases(_)
            | Self::MissingParam(_) => ErrorKind::Compile,
            Self::Connect(_) => ErrorKind::Connect,
            Self::Execution { .. } => ErrorKind::Execution,
        }
    }
}

/// Result type for query operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(Error::EmptyTablePath.kind(), ErrorKind::Builder);
        assert_eq!(
            Error::SchemaRequired(String::from("t")).kind(),
            ErrorKind::Type
        );
        assert_eq!(
            Error::TooManyAliases(String::from("id")).kind(),
            ErrorKind::Compile
        );
        assert_eq!(
            Error::Connect(String::from("no such file")).kind(),
            ErrorKind::Connect
        );
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            Error::TooManyAliases(String::from("id")).to_string(),
            "Too many aliases for column id"
        );
        let err = Error::UnknownColumn {
            table: String::from("\"users\""),
            column: String::from("age"),
        };
        assert_eq!(err.to_string(), "Column 'age' not found in \"users\"");
    }
}
