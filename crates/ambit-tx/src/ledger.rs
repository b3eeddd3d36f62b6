use std::cell::{Cell, RefCell};

use tracing::{debug, warn};

use crate::error::TransactionError;

pub(crate) type RollbackFn = Box<dyn FnOnce() -> anyhow::Result<()>>;

struct RollbackStep {
    name: Option<&'static str>,
    run: RollbackFn,
}

/// Ordered collection of compensating actions, shared by every transaction
/// attached to it.
///
/// Steps execute in reverse registration order, exactly once: the `executed`
/// flag is one-shot, so nested transactions sharing a ledger cannot roll it
/// back twice, and registration after rollback is rejected.
#[derive(Default)]
pub struct RollbackLedger {
    steps: RefCell<Vec<RollbackStep>>,
    executed: Cell<bool>,
}

impl RollbackLedger {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(
        &self,
        name: Option<&'static str>,
        run: RollbackFn,
    ) -> Result<(), TransactionError> {
        if self.executed.get() {
            return Err(TransactionError::RollbackAlreadyExecuted);
        }
        self.steps.borrow_mut().push(RollbackStep { name, run });
        Ok(())
    }

    /// Runs every registered step in reverse registration order.
    ///
    /// A failing step is forwarded to `on_failure` and does not stop the
    /// remaining steps. The second and later invocations are no-ops.
    pub(crate) fn rollback(&self, on_failure: &dyn Fn(anyhow::Error)) {
        if self.executed.get() {
            return;
        }

        let steps = self.steps.take();
        debug!(steps = steps.len(), "rolling back");

        for (index, step) in steps.into_iter().enumerate().rev() {
            if let Err(error) = (step.run)() {
                warn!(step = step.name, index, "rollback step failed");
                let context = match step.name {
                    Some(name) => format!("rollback step '{name}' failed"),
                    None => format!("rollback step #{index} failed"),
                };
                on_failure(error.context(context));
            }
        }

        self.executed.set(true);
    }

    /// True once this ledger's rollback has run.
    #[must_use]
    pub fn has_executed(&self) -> bool {
        self.executed.get()
    }

    /// Number of steps currently registered and not yet executed.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.steps.borrow().len()
    }
}
