use thiserror::Error;

/// Error types for call routing operations
///
/// Covers the failure modes of the routing engine and its stores. Reservation
/// conflicts are expected under concurrency and are recovered internally by
/// the engine; they only escape through the store traits, never through
/// `initiate_call`.
///
/// # Examples
///
/// ```
/// use callgrid_call_engine::{CallCenterError, Result};
///
/// fn release_operator(known: bool) -> Result<()> {
///     if !known {
///         return Err(CallCenterError::not_found("operator op-42"));
///     }
///     Ok(())
/// }
///
/// match release_operator(false) {
///     Err(CallCenterError::NotFound(msg)) => println!("client error: {}", msg),
///     other => println!("{:?}", other),
/// }
/// ```
#[derive(Error, Debug)]
pub enum CallCenterError {
    /// An atomic state transition lost a race
    ///
    /// Returned by `reserve` when the operator is no longer ONLINE (a
    /// concurrent caller won, or the operator went offline). Handled by
    /// falling back to the queue, never surfaced by `initiate_call`.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A referenced operator or call does not exist (or is already closed)
    ///
    /// Surfaced to the caller as a client-visible failure and never retried:
    /// ending an unknown or already-completed call, releasing an unknown
    /// operator.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Persistence failure
    ///
    /// Store unavailable, query failure or transaction abort. The failed
    /// operation leaves no partial state behind.
    #[error("Database error: {0}")]
    Database(String),

    /// Queue-related errors
    ///
    /// Backlog capacity exceeded or an inconsistent backlog operation.
    #[error("Queue error: {0}")]
    Queue(String),

    /// Routing errors
    ///
    /// Assignment coordination problems that are not reservation conflicts.
    #[error("Routing error: {0}")]
    Routing(String),

    /// Configuration validation errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid input validation errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Unexpected internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for CallCenterError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for CallCenterError {
    fn from(err: anyhow::Error) -> Self {
        // Unexpected errors from lower-level components map to Internal.
        Self::Internal(err.to_string())
    }
}

impl CallCenterError {
    /// Create a new Conflict error with the provided message
    pub fn conflict<S: Into<String>>(msg: S) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create a new NotFound error with the provided message
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new Database error with the provided message
    pub fn database<S: Into<String>>(msg: S) -> Self {
        Self::Database(msg.into())
    }

    /// Create a new Queue error with the provided message
    pub fn queue<S: Into<String>>(msg: S) -> Self {
        Self::Queue(msg.into())
    }

    /// Create a new Routing error with the provided message
    pub fn routing<S: Into<String>>(msg: S) -> Self {
        Self::Routing(msg.into())
    }

    /// Create a new Configuration error with the provided message
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a new InvalidInput error with the provided message
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new Internal error with the provided message
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }
}

/// Result type for call routing operations
pub type Result<T> = std::result::Result<T, CallCenterError>;
