use thiserror::Error;

/// Error from reading the ambient scope stack.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ScopeError {
    /// No live entry exists for the requested value type on this thread.
    #[error("out of scope ({type_name})")]
    OutOfScope {
        /// Type of the value that was requested.
        type_name: &'static str,
    },
}
