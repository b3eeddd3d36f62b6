//! Integration tests for ledger sharing and isolation across nested
//! transactions.

use std::cell::Cell;
use std::rc::Rc;

use ambit_scope::Scope;
use ambit_tx::{IsolationLevel, RollbackLedger, Transaction};

fn decrement_by(counter: Rc<Cell<i32>>, amount: i32) -> impl FnOnce() -> anyhow::Result<()> {
    move || {
        counter.set(counter.get() - amount);
        Ok(())
    }
}

#[test]
fn nested_attached_transactions_commit_together() {
    let value = Rc::new(Cell::new(0));

    let result: anyhow::Result<()> = Transaction::execute(|outer| {
        value.set(value.get() + 1);
        outer.add_rollback(decrement_by(Rc::clone(&value), 1))?;

        Transaction::execute(|inner| {
            value.set(value.get() + 1);
            inner.add_rollback(decrement_by(Rc::clone(&value), 1))
        })?;

        value.set(value.get() + 1);
        Ok(())
    });

    assert!(result.is_ok());
    assert_eq!(value.get(), 3);
}

#[test]
fn an_inner_failure_unwinds_the_whole_attached_chain() {
    let value = Rc::new(Cell::new(0));

    let result: anyhow::Result<()> = Transaction::execute(|outer| {
        value.set(value.get() + 1);
        outer.add_rollback(decrement_by(Rc::clone(&value), 1))?;

        Transaction::execute(|inner| {
            value.set(value.get() + 1);
            inner.add_rollback(decrement_by(Rc::clone(&value), 1))?;
            anyhow::bail!("inner unit failed")
        })?;

        value.set(value.get() + 1);
        Ok(())
    });

    // The inner failure rolled back the outer step as well, including the
    // increment applied before the inner transaction even started.
    assert!(result.is_err());
    assert_eq!(value.get(), 0);
}

#[test]
fn attached_transactions_grow_one_shared_ledger() {
    let result: anyhow::Result<()> = Transaction::execute(|outer| {
        outer.add_rollback(|| Ok(()))?;
        assert_eq!(outer.ledger().pending(), 1);

        let inner_result: anyhow::Result<()> = Transaction::execute(|inner| {
            inner.add_rollback(|| Ok(()))?;
            Ok(())
        });
        inner_result?;

        // The inner transaction committed without rolling back; its step
        // stays on the shared ledger for the rest of the chain.
        assert_eq!(outer.ledger().pending(), 2);
        Ok(())
    });

    assert!(result.is_ok());
}

#[test]
fn the_outermost_transaction_owns_the_ambient_entry() {
    assert!(!Scope::<RollbackLedger>::in_scope());

    let result: anyhow::Result<()> = Transaction::execute(|_outer| {
        assert!(Scope::<RollbackLedger>::in_scope());

        let inner_result: anyhow::Result<()> = Transaction::execute(|_inner| Ok(()));
        inner_result?;

        // The inner release did not pop the entry it never owned.
        assert!(Scope::<RollbackLedger>::in_scope());
        Ok(())
    });

    assert!(result.is_ok());
    assert!(!Scope::<RollbackLedger>::in_scope());
}

#[test]
fn rollback_observes_the_ledger_while_it_is_still_ambient() {
    let observed = Rc::new(Cell::new(false));

    let seen = Rc::clone(&observed);
    let result: anyhow::Result<()> = Transaction::execute(|tx| {
        tx.add_rollback(move || {
            seen.set(Scope::<RollbackLedger>::in_scope());
            Ok(())
        })?;
        anyhow::bail!("abort")
    });

    // The owner pops the ambient entry only after rollback has run.
    assert!(result.is_err());
    assert!(observed.get());
    assert!(!Scope::<RollbackLedger>::in_scope());
}

#[test]
fn the_ambient_entry_is_popped_on_the_error_path() {
    let result: anyhow::Result<()> = Transaction::execute(|_tx| anyhow::bail!("failed"));

    assert!(result.is_err());
    assert!(!Scope::<RollbackLedger>::in_scope());
}

#[test]
fn a_suppressed_failure_rolls_back_only_its_own_steps() {
    let value = Rc::new(Cell::new(0));

    let result: anyhow::Result<()> = Transaction::execute(|outer| {
        value.set(value.get() + 1);
        outer.add_rollback(decrement_by(Rc::clone(&value), 1))?;

        let suppressed: anyhow::Result<()> =
            Transaction::execute_with(IsolationLevel::Suppress, |inner| {
                value.set(value.get() + 10);
                inner.add_rollback(decrement_by(Rc::clone(&value), 10))?;
                anyhow::bail!("suppressed unit failed")
            });

        // The private ledger unwound alone; the chain's own step is intact
        // and the failure stays contained.
        assert!(suppressed.is_err());
        assert_eq!(value.get(), 1);
        assert_eq!(outer.ledger().pending(), 1);
        Ok(())
    });

    assert!(result.is_ok());
    assert_eq!(value.get(), 1);
}

#[test]
fn a_suppressed_transaction_never_joins_the_ambient_ledger() {
    let result: anyhow::Result<()> = Transaction::execute(|outer| {
        let suppressed: anyhow::Result<()> =
            Transaction::execute_with(IsolationLevel::Suppress, |inner| {
                inner.add_rollback(|| Ok(()))?;
                Ok(())
            });
        suppressed?;

        assert_eq!(outer.ledger().pending(), 0);
        Ok(())
    });

    assert!(result.is_ok());
}

#[test]
fn suppress_never_publishes_an_ambient_entry() {
    let result: anyhow::Result<()> = Transaction::execute_with(IsolationLevel::Suppress, |_tx| {
        assert!(!Scope::<RollbackLedger>::in_scope());
        Ok(())
    });

    assert!(result.is_ok());
}
