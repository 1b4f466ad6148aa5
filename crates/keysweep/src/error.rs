//! Error types for keyspace enumeration and worker supervision.
//!
//! Every fallible operation in this crate reports one of four cases:
//! - `InvalidArgument`: a malformed alphabet, length, bound, buffer or worker
//!   count was supplied by the caller.
//! - `OutOfRange`: an ordinal at or beyond the keyspace total was requested,
//!   or an exhausted enumerator was asked for another value.
//! - `Overflow`: the keyspace is too large to be counted in an [`Ordinal`].
//! - `RuntimeFailure`: the operating system refused to spawn a worker or to
//!   report its termination.
//!
//! [`Ordinal`]: crate::Ordinal

/// A result type defaulting to the crate-wide [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All errors `keysweep` can produce.
#[derive(Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The caller supplied an argument that violates a documented
    /// precondition.
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// A position or an enumerator advance fell outside the valid range.
    #[error("out of range: {reason}")]
    OutOfRange { reason: String },

    /// `base^length` does not fit in an [`Ordinal`](crate::Ordinal).
    #[error("keyspace of {base}^{length} exceeds the ordinal range")]
    Overflow { length: usize, base: usize },

    /// A worker process could not be spawned or observed.
    #[error("runtime failure: {context}")]
    RuntimeFailure { context: String },
}

impl Error {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    pub(crate) fn out_of_range(reason: impl Into<String>) -> Self {
        Self::OutOfRange {
            reason: reason.into(),
        }
    }

    pub(crate) fn runtime(context: impl Into<String>) -> Self {
        Self::RuntimeFailure {
            context: context.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_reason() {
        let err = Error::invalid("alphabet must contain at least one symbol");
        assert_eq!(
            err.to_string(),
            "invalid argument: alphabet must contain at least one symbol"
        );
    }

    #[test]
    fn overflow_display_names_base_and_length() {
        let err = Error::Overflow {
            length: 14,
            base: 26,
        };
        assert_eq!(
            err.to_string(),
            "keyspace of 26^14 exceeds the ordinal range"
        );
    }
}
