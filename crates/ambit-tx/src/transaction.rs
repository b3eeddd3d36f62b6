use std::cell::Cell;
use std::rc::Rc;

use ambit_scope::{Scope, ScopeGuard};

use crate::builder::TransactionBuilder;
use crate::error::TransactionError;
use crate::ledger::RollbackLedger;

/// How a transaction relates to the ambient rollback ledger.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IsolationLevel {
    /// Join the ambient ledger, creating it if none exists. Every attached
    /// transaction on the thread shares one ledger, so a failure anywhere in
    /// the chain unwinds all accumulated compensations together.
    #[default]
    Attach,
    /// Use a private ledger, independent of any ambient one. This is the
    /// only way to get a compensation unit that rolls back alone.
    Suppress,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Active,
    Committed,
    Disposing,
}

pub(crate) type FailureHandler = Box<dyn Fn(anyhow::Error)>;

/// A unit of work that accumulates compensating actions and executes them in
/// reverse order unless it commits.
///
/// Transactions are only obtained inside the closure passed to
/// [`Transaction::execute`] (or a [`TransactionBuilder`] run): returning
/// `Ok` commits, returning `Err` or unwinding rolls back, and release is
/// guaranteed on every exit path.
pub struct Transaction {
    ledger: Rc<RollbackLedger>,
    /// `Some` iff this transaction pushed the ambient ledger entry itself;
    /// only the owner pops it.
    ambient_guard: Option<ScopeGuard<RollbackLedger>>,
    on_rollback_failure: FailureHandler,
    state: Cell<State>,
}

impl Transaction {
    pub(crate) fn begin(level: IsolationLevel, on_rollback_failure: FailureHandler) -> Self {
        let (ledger, ambient_guard) = match level {
            IsolationLevel::Attach => {
                let guard = if Scope::<RollbackLedger>::in_scope() {
                    None
                } else {
                    Some(Scope::create(RollbackLedger::new()))
                };
                let ledger =
                    Scope::<RollbackLedger>::try_current().expect("an ambient ledger is in scope");
                (ledger, guard)
            }
            IsolationLevel::Suppress => (Rc::new(RollbackLedger::new()), None),
        };
        Self {
            ledger,
            ambient_guard,
            on_rollback_failure,
            state: Cell::new(State::Active),
        }
    }

    /// Runs `action` in a new transaction at the default [`Attach`] level,
    /// with rollback-step failures discarded.
    ///
    /// Commits iff `action` returns `Ok`; on `Err` the ledger rolls back and
    /// the action's error is returned to the caller after release completes.
    ///
    /// [`Attach`]: IsolationLevel::Attach
    ///
    /// # Errors
    ///
    /// Returns the error produced by `action`, unchanged.
    pub fn execute<T, E, A>(action: A) -> Result<T, E>
    where
        A: FnOnce(&Transaction) -> Result<T, E>,
    {
        TransactionBuilder::new().run(action)
    }

    /// Runs `action` in a new transaction at `level`, with rollback-step
    /// failures discarded.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `action`, unchanged.
    pub fn execute_with<T, E, A>(level: IsolationLevel, action: A) -> Result<T, E>
    where
        A: FnOnce(&Transaction) -> Result<T, E>,
    {
        TransactionBuilder::new().isolation(level).run(action)
    }

    /// Configures a transaction run with a non-default isolation level or
    /// rollback-failure handler.
    #[must_use]
    pub fn builder() -> TransactionBuilder {
        TransactionBuilder::new()
    }

    /// Registers a compensating step on this transaction's ledger.
    ///
    /// Steps run in reverse registration order when the unit of work does
    /// not commit. Under [`IsolationLevel::Attach`] the ledger may be shared
    /// with enclosing transactions, so the step joins one interleaved list
    /// for the whole chain.
    ///
    /// # Errors
    ///
    /// Returns [`TransactionError::RollbackAlreadyExecuted`] when the shared
    /// ledger has already rolled back.
    pub fn add_rollback<F>(&self, step: F) -> Result<(), TransactionError>
    where
        F: FnOnce() -> anyhow::Result<()> + 'static,
    {
        self.ledger.add(None, Box::new(step))
    }

    /// Like [`Transaction::add_rollback`], with a name that shows up in log
    /// events and in the error forwarded to the failure handler when the
    /// step fails.
    ///
    /// # Errors
    ///
    /// Returns [`TransactionError::RollbackAlreadyExecuted`] when the shared
    /// ledger has already rolled back.
    pub fn add_named_rollback<F>(&self, name: &'static str, step: F) -> Result<(), TransactionError>
    where
        F: FnOnce() -> anyhow::Result<()> + 'static,
    {
        self.ledger.add(Some(name), Box::new(step))
    }

    /// The ledger backing this transaction: shared with the enclosing chain
    /// under [`IsolationLevel::Attach`], private under
    /// [`IsolationLevel::Suppress`].
    #[must_use]
    pub fn ledger(&self) -> &RollbackLedger {
        &self.ledger
    }

    pub(crate) fn commit(&self) {
        if self.state.get() == State::Active {
            self.state.set(State::Committed);
        }
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        let prior = self.state.replace(State::Disposing);
        if prior == State::Disposing {
            return;
        }

        if prior != State::Committed {
            self.ledger.rollback(self.on_rollback_failure.as_ref());
        }

        // The owner pops the ambient entry only after rollback, so rollback
        // observes the ledger while it is still ambient.
        drop(self.ambient_guard.take());
    }
}
