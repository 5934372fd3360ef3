use thiserror::Error;

/// The main error type for inventory operations.
///
/// This enum represents all possible errors that can occur while the core
/// resolves, mutates or aggregates inventory records. Every variant maps to a
/// distinguishable [`ErrorKind`] so that callers can render failures without
/// matching on message text.
#[derive(Error, Debug)]
pub enum InventoryError {
    /// A referenced record does not resolve in the store
    ///
    /// # Fields
    /// * `kind` - The kind of record that was looked up (e.g. "Cluster")
    /// * `id` - The identifier (or identifiers) that failed to resolve
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Represents validation failures with detailed context
    ///
    /// # Fields
    /// * `source` - The underlying validation error
    #[error("Validation error: {source}")]
    Validation { source: ValidationError },

    /// The persistence layer could not complete a read or write
    ///
    /// # Fields
    /// * `0` - A description of the storage failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// A deletion ordering could not be produced (for example a cycle in
    /// interface parent links). The whole batch is aborted.
    ///
    /// # Fields
    /// * `0` - A description of the violated ordering constraint
    #[error("Ordering violation: {0}")]
    OrderingViolation(String),
}

impl InventoryError {
    /// Builds a `NotFound` error for a single identifier.
    pub fn not_found(kind: &'static str, id: impl std::fmt::Display) -> Self {
        InventoryError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Builds a `NotFound` error listing every identifier that failed to resolve.
    pub fn not_found_many<I, T>(kind: &'static str, ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: std::fmt::Display,
    {
        let id = ids
            .into_iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        InventoryError::NotFound { kind, id }
    }

    /// Returns the coarse category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            InventoryError::NotFound { .. } => ErrorKind::NotFound,
            InventoryError::Validation { .. } => ErrorKind::Validation,
            InventoryError::Storage(_) => ErrorKind::Storage,
            InventoryError::OrderingViolation(_) => ErrorKind::OrderingViolation,
        }
    }
}

impl From<ValidationError> for InventoryError {
    fn from(error: ValidationError) -> Self {
        InventoryError::Validation { source: error }
    }
}

impl From<std::io::Error> for InventoryError {
    fn from(error: std::io::Error) -> Self {
        InventoryError::Storage(error.to_string())
    }
}

impl From<serde_json::Error> for InventoryError {
    fn from(error: serde_json::Error) -> Self {
        InventoryError::Storage(format!("Malformed snapshot: {}", error))
    }
}

/// Coarse error categories exposed to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Storage,
    OrderingViolation,
}

/// Specialized error type for validation failures.
///
/// This enum provides detailed context about why a validation
/// failed, including field-specific errors and format violations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Represents a validation failure for a specific field
    ///
    /// # Fields
    /// * `field` - The name of the field that failed validation
    /// * `message` - A detailed message about why validation failed
    #[error("Field '{field}' validation failed: {message}")]
    Field { field: String, message: String },

    /// Represents format/syntax validation failures
    ///
    /// # Fields
    /// * `0` - Description of the format violation
    #[error("Format error: {0}")]
    Format(String),

    /// Represents violations of domain constraints
    ///
    /// # Fields
    /// * `0` - Description of the constraint violation
    #[error("Domain constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Type alias for Results that may fail with an InventoryError
pub type InventoryResult<T> = Result<T, InventoryError>;
