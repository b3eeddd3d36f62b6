use std::any;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::error::ScopeError;
use crate::registry;

/// Entry point to the ambient stack for values of type `T`.
///
/// Each thread owns one stack per value type. The most recently pushed,
/// not-yet-released entry is the *current* one; nested calls read it via
/// [`Scope::current`] without any parameter threading.
///
/// `Scope` is never instantiated; all operations are associated functions.
pub struct Scope<T: 'static> {
    _value: PhantomData<fn() -> T>,
}

impl<T: 'static> Scope<T> {
    /// Publishes `value` as the current entry, taking ownership of it.
    ///
    /// The stack's handle is the owning one: once the entry is released (and
    /// every [`Rc`] handed out by [`Scope::current`] is gone), the value is
    /// dropped and its own cleanup runs.
    pub fn create(value: T) -> ScopeGuard<T> {
        ScopeGuard::new(registry::push(Rc::new(value)))
    }

    /// Publishes a shared `value` as the current entry without taking
    /// ownership.
    ///
    /// Releasing the entry only detaches it from the stack; the value's
    /// cleanup is never triggered from here because the caller keeps its own
    /// handle alive.
    pub fn create_transparent(value: Rc<T>) -> ScopeGuard<T> {
        ScopeGuard::new(registry::push(value))
    }

    /// True iff a live entry for `T` exists on the current thread.
    #[must_use]
    pub fn in_scope() -> bool {
        registry::is_active::<T>()
    }

    /// Value of the current entry for `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeError::OutOfScope`] when no live entry exists.
    pub fn current() -> Result<Rc<T>, ScopeError> {
        registry::top::<T>().ok_or_else(|| ScopeError::OutOfScope {
            type_name: any::type_name::<T>(),
        })
    }

    /// Value of the current entry for `T`, or `None` out of scope.
    #[must_use]
    pub fn try_current() -> Option<Rc<T>> {
        registry::top::<T>()
    }
}

/// Handle to one pushed scope entry.
///
/// Dropping the guard releases the entry, but only when it is still the top
/// of its stack: releasing a non-top entry is a silent no-op. The skipped
/// entry stays on the stack and becomes current again once the entries above
/// it are popped. Stack discipline is the well-nested caller's
/// responsibility; the identity check only keeps a misuse from corrupting
/// the stack.
#[must_use = "the scope entry is released when the guard is dropped"]
pub struct ScopeGuard<T: 'static> {
    serial: u64,
    // Ties the guard to the thread that pushed the entry (`!Send`).
    _value: PhantomData<Rc<T>>,
}

impl<T: 'static> ScopeGuard<T> {
    fn new(serial: u64) -> Self {
        Self {
            serial,
            _value: PhantomData,
        }
    }

    /// Releases the entry now. Equivalent to dropping the guard; provided as
    /// the explicit spelling.
    pub fn release(self) {
        drop(self);
    }
}

impl<T: 'static> Drop for ScopeGuard<T> {
    fn drop(&mut self) {
        registry::pop_if_top::<T>(self.serial);
    }
}
