use crate::transaction::{FailureHandler, IsolationLevel, Transaction};

/// Configures and runs a transaction.
///
/// Defaults match [`Transaction::execute`]: [`IsolationLevel::Attach`] and a
/// failure handler that discards rollback-step errors.
///
/// ```
/// use ambit_tx::{IsolationLevel, Transaction};
///
/// let result: anyhow::Result<()> = Transaction::builder()
///     .isolation(IsolationLevel::Suppress)
///     .on_rollback_failure(|error| eprintln!("compensation failed: {error:#}"))
///     .run(|_tx| Ok(()));
/// assert!(result.is_ok());
/// ```
#[must_use]
pub struct TransactionBuilder {
    isolation: IsolationLevel,
    on_rollback_failure: FailureHandler,
}

impl TransactionBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            isolation: IsolationLevel::default(),
            on_rollback_failure: Box::new(|_| {}),
        }
    }

    /// Sets how the transaction relates to the ambient ledger.
    pub fn isolation(mut self, level: IsolationLevel) -> Self {
        self.isolation = level;
        self
    }

    /// Sets the handler invoked once per rollback step that fails.
    ///
    /// Rollback-step errors never propagate out of a rollback; this handler
    /// is the only place they surface.
    pub fn on_rollback_failure<H>(mut self, handler: H) -> Self
    where
        H: Fn(anyhow::Error) + 'static,
    {
        self.on_rollback_failure = Box::new(handler);
        self
    }

    /// Runs `action` in a fresh transaction.
    ///
    /// The transaction commits iff `action` returns `Ok`. On `Err`, or if
    /// `action` unwinds, release rolls the ledger back before the result
    /// reaches the caller.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `action`, unchanged.
    pub fn run<T, E, A>(self, action: A) -> Result<T, E>
    where
        A: FnOnce(&Transaction) -> Result<T, E>,
    {
        let transaction = Transaction::begin(self.isolation, self.on_rollback_failure);
        let result = action(&transaction);
        if result.is_ok() {
            transaction.commit();
        }
        drop(transaction);
        result
    }
}

impl Default for TransactionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
