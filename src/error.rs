use thiserror::Error;

/// Errors reported by [`TrieEnumerator`](crate::TrieEnumerator) mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TrieError {
    /// The enumerator is not positioned on an item (not started, exhausted,
    /// or the current item was already removed).
    #[error("enumerator is not positioned on an item")]
    NoCurrent,

    /// A replacement value does not compare equal to the value it replaces,
    /// so lookups would no longer find it.
    #[error("replacement value is not equal to the current value")]
    ValueMismatch,
}

/// Result type for enumerator mutations.
pub type Result<T> = std::result::Result<T, TrieError>;
