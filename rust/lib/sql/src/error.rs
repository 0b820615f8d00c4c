use thiserror::Error;

use todolist_core::ServiceError;

#[derive(Error, Debug)]
pub enum SQLError {
    #[error("query error: {0}")]
    Query(String),

    #[error("execution error: {0}")]
    Execution(String),

    #[error("connection error: {0}")]
    Connection(String),

    /// A UNIQUE or PRIMARY KEY constraint rejected the write.
    #[error("constraint violation: {0}")]
    Constraint(String),
}

impl From<SQLError> for ServiceError {
    fn from(e: SQLError) -> Self {
        match e {
            SQLError::Constraint(m) => ServiceError::Conflict(m),
            other => ServiceError::Storage(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_becomes_conflict() {
        let err: ServiceError = SQLError::Constraint("UNIQUE constraint failed: users.email".into()).into();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[test]
    fn other_failures_become_storage() {
        let err: ServiceError = SQLError::Query("no such table: todos".into()).into();
        assert!(matches!(err, ServiceError::Storage(ref m) if m == "query error: no such table: todos"));
        assert_eq!(err.public_message(), "internal server error");
    }
}
