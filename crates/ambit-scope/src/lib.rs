//! Execution-context-local scope stacks for ambient value publication.
//!
//! This crate lets a frame publish a value that code deeper in the call
//! chain can retrieve without explicit parameter threading. Each thread owns
//! one LIFO stack per value type; the innermost live entry is the *current*
//! one. Entries are released through RAII guards, and releasing an entry
//! that is no longer on top is a harmless no-op rather than an error.
//!
//! ```
//! use ambit_scope::Scope;
//!
//! struct RequestId(u64);
//!
//! let guard = Scope::create(RequestId(7));
//! assert!(Scope::<RequestId>::in_scope());
//! assert_eq!(Scope::<RequestId>::current()?.0, 7);
//!
//! guard.release();
//! assert!(!Scope::<RequestId>::in_scope());
//! # Ok::<(), ambit_scope::ScopeError>(())
//! ```

mod error;
mod registry;
mod scope;

pub use error::ScopeError;
pub use scope::{Scope, ScopeGuard};
