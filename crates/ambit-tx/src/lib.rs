//! Compensating-action transactions over an ambient rollback ledger.
//!
//! A unit of work registers compensating steps as it goes; if it does not
//! commit, because it returned an error or unwound, the steps execute in
//! reverse registration order. The ledger holding the steps is published on
//! the ambient scope stack ([`ambit_scope`]), so nested transactions on the
//! same thread share one ledger by default ([`IsolationLevel::Attach`]): a
//! failure anywhere in an attached chain unwinds every accumulated
//! compensation in the chain. [`IsolationLevel::Suppress`] opts a
//! transaction out into a private ledger.
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use ambit_tx::Transaction;
//!
//! let balance = Rc::new(Cell::new(100));
//!
//! let result: anyhow::Result<()> = Transaction::execute(|tx| {
//!     balance.set(balance.get() - 30);
//!     let undo = Rc::clone(&balance);
//!     tx.add_rollback(move || {
//!         undo.set(undo.get() + 30);
//!         Ok(())
//!     })?;
//!     anyhow::bail!("debit rejected")
//! });
//!
//! assert!(result.is_err());
//! assert_eq!(balance.get(), 100);
//! ```
//!
//! Rollback steps that themselves fail are absorbed: each failure is
//! forwarded to the configured handler
//! ([`TransactionBuilder::on_rollback_failure`]) and the remaining steps
//! still run, so one broken compensation cannot block the rest of the
//! unwind.

mod builder;
mod error;
mod ledger;
mod transaction;

pub use builder::TransactionBuilder;
pub use error::TransactionError;
pub use ledger::RollbackLedger;
pub use transaction::{IsolationLevel, Transaction};
