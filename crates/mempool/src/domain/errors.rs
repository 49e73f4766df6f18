//! Mempool error types.
//!
//! Defines all error conditions for the Mempool subsystem.

use super::entities::Hash;

/// The outcome of a validator-side verification, or the sentinel success
/// value. Carried directly in `VerifyTxRsp`/`TxVerifyResult` rather than as
/// a `Result`, since a `VerifyBlockReply` reports one per transaction
/// regardless of outcome.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ErrorCode {
    /// Verification succeeded.
    #[error("no error")]
    NoError,
    /// Opaque rejection reason reported by a validator (e.g. "bad signature").
    #[error("validator rejected: {0}")]
    Validator(String),
    /// No validator of the required kind was registered when dispatch was attempted.
    #[error("no eligible validator registered")]
    NoValidator,
}

impl ErrorCode {
    /// Whether this code represents success.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::NoError)
    }
}

/// Outcome of `Mempool::submit`.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MempoolError {
    /// A transaction with this hash is already known to the pool.
    #[error("duplicate transaction: {0:x?}")]
    Duplicate(Hash),

    /// The pool is at `max_capacity` and cannot admit more entries.
    #[error("mempool at capacity ({capacity})")]
    CapacityFull {
        /// The configured capacity that was reached.
        capacity: usize,
    },

    /// The `Pending` queue is at `max_pending`.
    #[error("too many pending transactions ({limit})")]
    TooManyPending {
        /// The configured pending limit that was reached.
        limit: usize,
    },

    /// Gas price is below the configured admission floor.
    #[error("gas price {price} below minimum {minimum}")]
    GasPriceTooLow {
        /// The price offered by the transaction.
        price: u64,
        /// The configured floor.
        minimum: u64,
    },

    /// Gas limit is below the configured admission floor for this kind of transaction.
    #[error("gas limit {limit} below minimum {minimum}")]
    GasLimitTooLow {
        /// The limit offered by the transaction.
        limit: u64,
        /// The configured floor.
        minimum: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_no_error_is_ok() {
        assert!(ErrorCode::NoError.is_ok());
        assert!(!ErrorCode::Validator("bad sig".into()).is_ok());
    }

    #[test]
    fn duplicate_display_includes_hash() {
        let err = MempoolError::Duplicate([0xab; 32]);
        assert!(err.to_string().contains("ab"));
    }

    #[test]
    fn capacity_full_display_includes_limit() {
        let err = MempoolError::CapacityFull { capacity: 22_000 };
        assert!(err.to_string().contains("22000"));
    }
}
