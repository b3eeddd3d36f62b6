use thiserror::Error;

/// Error from registering a rollback step.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransactionError {
    /// The backing ledger has already executed its rollback; no further
    /// steps can be registered on it.
    #[error("rollback already executed")]
    RollbackAlreadyExecuted,
}
