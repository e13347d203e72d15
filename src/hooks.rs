//! Lifecycle hook plumbing.
//!
//! Hooks either let an operation proceed (possibly with a transformed value)
//! or abort it with a fully formed reply. The two cases are explicit variants
//! rather than sentinel values, so an aborting hook cannot be mistaken for a
//! transforming one.

use crate::envelope::Reply;

/// Outcome of a lifecycle hook.
#[derive(Debug)]
pub enum HookOutcome<T> {
    /// Continue the operation with this (possibly transformed) value.
    Proceed(T),
    /// Stop the operation; the reply is returned to the client as-is.
    Abort(Reply),
}

/// Which single-record operation a shared hook is running for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordAction {
    Retrieve,
    EditData,
    Delete,
    ToggleStatus,
}

impl RecordAction {
    /// Past-tense verb for success messages ("product deleted").
    #[must_use]
    pub fn past_tense(self) -> &'static str {
        match self {
            Self::Retrieve => "retrieved",
            Self::EditData => "retrieved for editing",
            Self::Delete => "deleted",
            Self::ToggleStatus => "status updated",
        }
    }
}
