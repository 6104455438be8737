//! Error types for pgtable

use thiserror::Error;

/// Boxed error returned by user callbacks (value extractors, post-processing).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias for pgtable operations
pub type TableResult<T> = Result<T, TableError>;

/// Error types for table operations
#[derive(Debug, Error)]
pub enum TableError {
    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Row not found, or a delete that affected no rows
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique constraint violation
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation
    #[error("Check constraint violation: {0}")]
    CheckViolation(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// A field's value extractor failed before the statement ran
    #[error("could not get arg for field {field}: {source}")]
    FieldValue {
        field: String,
        #[source]
        source: BoxError,
    },

    /// The post-process callback rejected a hydrated record
    #[error("post process record error: {0}")]
    PostProcess(#[source] BoxError),

    /// No statement was supplied or derivable for this operation
    #[error("no {operation} statement configured for table '{table}'")]
    MissingStatement {
        table: String,
        operation: &'static str,
    },

    /// Descriptor or identifier validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration loading error
    #[error("Config error: {0}")]
    Config(String),

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),
}

impl TableError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn field_value(field: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::FieldValue {
            field: field.into(),
            source: source.into(),
        }
    }

    pub fn post_process(source: impl Into<BoxError>) -> Self {
        Self::PostProcess(source.into())
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this error came from the post-process callback rather than storage
    pub fn is_post_process(&self) -> bool {
        matches!(self, Self::PostProcess(_))
    }

    /// Check if this is a unique violation error
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation(_))
    }

    /// Translate a tokio_postgres error into the table error vocabulary.
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            let constraint = db_err.constraint().unwrap_or("unknown");
            let message = db_err.message();

            match db_err.code().code() {
                "23505" => return Self::UniqueViolation(format!("{}: {}", constraint, message)),
                "23503" => {
                    return Self::ForeignKeyViolation(format!("{}: {}", constraint, message));
                }
                "23514" => return Self::CheckViolation(format!("{}: {}", constraint, message)),
                _ => {}
            }
        }
        if err.is_closed() {
            return Self::Connection(err.to_string());
        }
        Self::Query(err)
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for TableError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Rejected;

    impl std::fmt::Display for Rejected {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("rejected")
        }
    }

    impl std::error::Error for Rejected {}

    #[test]
    fn field_value_names_the_field() {
        let err = TableError::field_value("email", "bad address");
        assert_eq!(
            err.to_string(),
            "could not get arg for field email: bad address"
        );
        assert!(!err.is_not_found());
    }

    #[test]
    fn post_process_is_distinct_from_storage_errors() {
        let err = TableError::post_process(Rejected);
        assert!(err.is_post_process());
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "post process record error: rejected");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn missing_statement_message() {
        let err = TableError::MissingStatement {
            table: "users".to_string(),
            operation: "upsert",
        };
        assert_eq!(
            err.to_string(),
            "no upsert statement configured for table 'users'"
        );
    }
}
