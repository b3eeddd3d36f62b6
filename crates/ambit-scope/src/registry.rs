use std::any::{Any, TypeId};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

thread_local! {
    /// One stack per published value type, owned by the current thread.
    static STACKS: RefCell<HashMap<TypeId, Vec<Frame>>> = RefCell::new(HashMap::new());

    /// Source of frame identities for the current thread.
    static NEXT_SERIAL: Cell<u64> = const { Cell::new(0) };
}

/// One pushed entry. `serial` is the identity the guard compares against the
/// top of the stack at release time.
struct Frame {
    serial: u64,
    value: Rc<dyn Any>,
}

/// Pushes `value` onto the current thread's stack for `T` and returns the
/// new frame's identity.
pub(crate) fn push<T: 'static>(value: Rc<T>) -> u64 {
    let serial = NEXT_SERIAL.with(|next| {
        let serial = next.get();
        next.set(serial + 1);
        serial
    });
    STACKS.with(|stacks| {
        stacks
            .borrow_mut()
            .entry(TypeId::of::<T>())
            .or_default()
            .push(Frame { serial, value });
    });
    serial
}

/// Value of the most recently pushed, not-yet-popped entry for `T`.
pub(crate) fn top<T: 'static>() -> Option<Rc<T>> {
    let value = STACKS.with(|stacks| {
        let stacks = stacks.borrow();
        let stack = stacks.get(&TypeId::of::<T>())?;
        stack.last().map(|frame| Rc::clone(&frame.value))
    })?;
    Some(
        value
            .downcast::<T>()
            .unwrap_or_else(|_| unreachable!("stacks are keyed by TypeId")),
    )
}

pub(crate) fn is_active<T: 'static>() -> bool {
    STACKS.with(|stacks| {
        stacks
            .borrow()
            .get(&TypeId::of::<T>())
            .is_some_and(|stack| !stack.is_empty())
    })
}

/// Pops the entry identified by `serial` iff it is the current top of the
/// stack for `T`. Anything else is a no-op: the stack is never repaired on
/// behalf of a caller that released out of order.
pub(crate) fn pop_if_top<T: 'static>(serial: u64) {
    let frame = STACKS.with(|stacks| {
        let mut stacks = stacks.borrow_mut();
        let stack = stacks.get_mut(&TypeId::of::<T>())?;
        if stack.last().is_none_or(|frame| frame.serial != serial) {
            return None;
        }
        let frame = stack.pop();
        if stack.is_empty() {
            stacks.remove(&TypeId::of::<T>());
        }
        frame
    });
    // The frame is dropped here, after the registry borrow has been
    // released: the value's own drop may re-enter the scope API.
    drop(frame);
}
