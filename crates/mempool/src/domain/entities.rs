//! Core domain entities for the Mempool subsystem.
//!
//! Defines the transaction lifecycle and related types.

pub use shared_types::{Hash, Transaction};

/// Monotonic timestamp in seconds, used for the `Checking` timeout sweep.
pub type Timestamp = u64;

/// The kind of verification a validator performs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VerifyType {
    /// Checks that depend only on the transaction itself (signature, shape).
    Stateless,
    /// Checks that depend on current blockchain state at a height.
    Stateful,
}

/// Lifecycle stage of a `TxEntry`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Admitted, waiting for checking-queue room.
    Pending,
    /// A verification request is outstanding (or about to be sent).
    Checking,
    /// Both stateless and stateful checks have succeeded.
    Passed,
    /// Discarded; the entry is a stale pointer other structures may still hold.
    Invalid,
}

/// One known transaction, keyed in the table by `tx.hash()`.
///
/// Invariant: `stage == Passed` implies `pass_stateless && pass_stateful`
/// (enforced by `Mempool::on_verify_response`, never constructed otherwise).
#[derive(Clone, Debug)]
pub struct TxEntry {
    /// The transaction payload itself.
    pub tx: Transaction,
    /// Cached gas price, kept alongside the entry for statistics.
    pub gas: u64,
    /// Current lifecycle stage.
    pub stage: Stage,
    /// Whether the stateless check has succeeded.
    pub pass_stateless: bool,
    /// Whether the stateful check has succeeded.
    pub pass_stateful: bool,
    /// Height at which the stateful proof was obtained (0 if none).
    pub verify_height: u64,
    /// Timestamp of the most recent transition into `Checking`.
    pub entered_checking_at: Timestamp,
    /// True iff this tx arrived from the local HTTP/RPC submitter.
    pub from_local_client: bool,
}

impl TxEntry {
    /// Construct a freshly-submitted entry in `Pending`.
    #[must_use]
    pub fn new_pending(tx: Transaction, from_local_client: bool) -> Self {
        let gas = tx.gas_price;
        Self {
            tx,
            gas,
            stage: Stage::Pending,
            pass_stateless: false,
            pass_stateful: false,
            verify_height: 0,
            entered_checking_at: 0,
            from_local_client,
        }
    }

    /// Construct a freshly-submitted entry placed directly in `Checking`.
    #[must_use]
    pub fn new_checking(tx: Transaction, from_local_client: bool, now: Timestamp) -> Self {
        let mut entry = Self::new_pending(tx, from_local_client);
        entry.stage = Stage::Checking;
        entry.entered_checking_at = now;
        entry
    }

    /// Whether both checks have succeeded.
    #[must_use]
    pub fn is_fully_passed(&self) -> bool {
        self.pass_stateless && self.pass_stateful
    }

    /// Hash of the underlying transaction.
    #[must_use]
    pub fn hash(&self) -> Hash {
        self.tx.hash()
    }
}

/// The outcome the mempool reports for `TxEntry` verification, and what
/// consensus reads back per-tx in a `VerifyBlockReply`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifyResult {
    /// The height at which the tx was (re-)verified.
    pub height: u64,
    /// `ErrorCode::NoError` on success.
    pub error_code: crate::domain::errors::ErrorCode,
}

/// One tx's verdict within a `VerifyBlockReply`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxVerifyResult {
    /// The transaction this verdict is about.
    pub hash: Hash,
    /// The height at which the tx was (re-)verified.
    pub height: u64,
    /// `ErrorCode::NoError` on success.
    pub error_code: crate::domain::errors::ErrorCode,
}

/// Consolidated reply to a `VerifyBlock` request, built only by
/// `BlockCoordinator::emit_reply`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifyBlockReply {
    /// One verdict per tx the block asked about.
    pub results: Vec<TxVerifyResult>,
}

/// Outbound request to a validator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifyTxReq {
    /// The transaction to check.
    pub tx: Transaction,
}

/// Inbound verdict from a validator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifyTxRsp {
    /// Hash of the transaction this verdict is about.
    pub hash: Hash,
    /// Which kind of check this verdict covers.
    pub verify_type: VerifyType,
    /// The height the validator checked state at (stateful only).
    pub height: u64,
    /// `ErrorCode::NoError` on success.
    pub error_code: crate::domain::errors::ErrorCode,
}

/// A request the `Mempool` core wants dispatched to a validator. Produced
/// by pure domain operations; sent by `VerificationDispatcher`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchRequest {
    /// Which group of validator should receive this.
    pub verify_type: VerifyType,
    /// The transaction to verify.
    pub tx: Transaction,
}

/// Sent to a validator after it is unregistered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnregisterAck {
    /// The group the validator was removed from.
    pub verify_type: VerifyType,
    /// The validator's id.
    pub id: String,
}

/// A side effect produced by a `Mempool` operation, to be carried out by
/// `MempoolServer` (dispatch a verify request, gossip a tx, or relay a
/// verdict to the in-flight `BlockCoordinator`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MempoolEvent {
    /// Send a verify request to a validator.
    Dispatch(DispatchRequest),
    /// Broadcast a locally-submitted, now-`Passed` tx to peer gossip.
    Gossip(Transaction),
    /// Relay a verdict to the block currently tracked by `BlockCoordinator`.
    BlockResult {
        /// Hash of the tx the verdict is about.
        hash: Hash,
        /// Height at which the verdict was obtained.
        height: u64,
        /// `ErrorCode::NoError` on success.
        error_code: crate::domain::errors::ErrorCode,
    },
}

/// Mempool configuration. Defaults match §6 of the spec.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MempoolConfig {
    /// Upper bound on the `Pending` queue.
    pub max_pending: usize,
    /// Upper bound on concurrent in-flight verifications (`Checking`).
    pub max_checking: usize,
    /// Upper bound on total table entries.
    pub max_capacity: usize,
    /// Cap used by `take_verified` when drawing a batch by count.
    pub max_tx_in_block: usize,
    /// Seconds before a `Checking` entry is retried.
    pub checking_timeout: u64,
    /// Admission floor on gas limit.
    pub min_gas_limit: u64,
    /// Admission floor on gas price.
    pub min_gas_price: u64,
    /// Admission floor on gas limit for deploy-kind (no recipient) txs.
    pub deploy_gas_limit: u64,
}

impl Default for MempoolConfig {
    fn default() -> Self {
        Self {
            max_pending: 20_000,
            max_checking: 2_000,
            max_capacity: 22_000,
            max_tx_in_block: 10_000,
            checking_timeout: 30,
            min_gas_limit: 21_000,
            min_gas_price: 1,
            deploy_gas_limit: 100_000,
        }
    }
}

impl MempoolConfig {
    /// A small config useful for deterministic tests of the boundary
    /// conditions described in §8.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            max_pending: 2,
            max_checking: 1,
            max_capacity: 3,
            max_tx_in_block: 10,
            checking_timeout: 30,
            min_gas_limit: 0,
            min_gas_price: 0,
            deploy_gas_limit: 0,
        }
    }
}

/// Per-outstanding-block tracking (§3 `BlockTracking`). `BlockCoordinator`
/// holds at most one of these at a time.
#[derive(Debug)]
pub struct BlockTracking<H> {
    /// Opaque reply address for the requesting consensus caller.
    pub consensus_handle: H,
    /// Height of the block being verified.
    pub height: u64,
    /// Verdicts known so far, keyed by tx hash.
    pub processed: std::collections::HashMap<Hash, VerifyResult>,
    /// Txs still awaiting a verdict, keyed by tx hash.
    pub unprocessed: std::collections::HashMap<Hash, Transaction>,
}

impl<H> BlockTracking<H> {
    /// True once every tx in the block has a verdict.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.unprocessed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tx(nonce: u64) -> Transaction {
        Transaction {
            from: [1u8; 32],
            to: Some([2u8; 32]),
            value: 0,
            nonce,
            gas_limit: 21_000,
            gas_price: 1,
            data: Vec::new(),
            signature: [0u8; 64],
        }
    }

    #[test]
    fn new_pending_entry_starts_unverified() {
        let entry = TxEntry::new_pending(sample_tx(0), true);
        assert_eq!(entry.stage, Stage::Pending);
        assert!(!entry.pass_stateless);
        assert!(!entry.pass_stateful);
        assert!(!entry.is_fully_passed());
        assert_eq!(entry.verify_height, 0);
    }

    #[test]
    fn new_checking_entry_stamps_timestamp() {
        let entry = TxEntry::new_checking(sample_tx(0), false, 42);
        assert_eq!(entry.stage, Stage::Checking);
        assert_eq!(entry.entered_checking_at, 42);
    }

    #[test]
    fn is_fully_passed_requires_both_flags() {
        let mut entry = TxEntry::new_pending(sample_tx(0), true);
        entry.pass_stateless = true;
        assert!(!entry.is_fully_passed());
        entry.pass_stateful = true;
        assert!(entry.is_fully_passed());
    }

    #[test]
    fn config_defaults_match_spec() {
        let config = MempoolConfig::default();
        assert_eq!(config.max_pending, 20_000);
        assert_eq!(config.max_checking, 2_000);
        assert_eq!(config.checking_timeout, 30);
    }

    #[test]
    fn block_tracking_completes_when_unprocessed_drains() {
        let mut tracking: BlockTracking<()> = BlockTracking {
            consensus_handle: (),
            height: 10,
            processed: std::collections::HashMap::new(),
            unprocessed: std::collections::HashMap::new(),
        };
        assert!(tracking.is_complete());
        tracking.unprocessed.insert([0u8; 32], sample_tx(0));
        assert!(!tracking.is_complete());
    }
}
