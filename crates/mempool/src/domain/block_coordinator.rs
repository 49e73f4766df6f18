//! Tracks the single in-flight block verification request.
//!
//! Pure domain logic: it never calls the consensus handle itself. Instead
//! `emit_reply` hands the handle and the built `VerifyBlockReply` back to
//! the caller (`MempoolServer`), which performs the actual send.

use std::collections::HashMap;

use super::entities::{BlockTracking, Hash, Transaction, TxVerifyResult, VerifyBlockReply, VerifyResult};
use super::errors::ErrorCode;

/// Holds at most one `BlockTracking<C>`. A new `begin_block` call replaces
/// whatever was tracked before.
#[derive(Default)]
pub struct BlockCoordinator<C> {
    tracking: Option<BlockTracking<C>>,
}

impl<C> BlockCoordinator<C> {
    /// Creates an empty coordinator.
    #[must_use]
    pub fn new() -> Self {
        Self { tracking: None }
    }

    /// Starts tracking a new block, replacing any prior tracking. Returns
    /// `Some` immediately if every tx was already resolved by
    /// `classify_block`.
    pub fn begin_block(
        &mut self,
        height: u64,
        verified_now: Vec<TxVerifyResult>,
        unchecked: Vec<Transaction>,
        need_stateful: Vec<Transaction>,
        consensus_handle: C,
    ) -> Option<(C, VerifyBlockReply)> {
        let mut processed = HashMap::new();
        for v in verified_now {
            processed.insert(
                v.hash,
                VerifyResult {
                    height: v.height,
                    error_code: v.error_code,
                },
            );
        }
        let mut unprocessed = HashMap::new();
        for tx in unchecked.into_iter().chain(need_stateful) {
            unprocessed.insert(tx.hash(), tx);
        }
        let complete = unprocessed.is_empty();
        self.tracking = Some(BlockTracking {
            consensus_handle,
            height,
            processed,
            unprocessed,
        });
        if complete {
            self.emit_reply()
        } else {
            None
        }
    }

    /// Records a verdict for `hash`. Emits the reply if this verdict
    /// failed, or if it completed the block. Silently ignored if no
    /// tracked block is waiting on this hash (stale response, or the
    /// block already replied).
    pub fn record_result(&mut self, hash: Hash, height: u64, error_code: ErrorCode) -> Option<(C, VerifyBlockReply)> {
        {
            let tracking = self.tracking.as_mut()?;
            tracking.unprocessed.remove(&hash)?;
            let failed = !error_code.is_ok();
            tracking.processed.insert(hash, VerifyResult { height, error_code });
            if !failed && !tracking.unprocessed.is_empty() {
                return None;
            }
        }
        self.emit_reply()
    }

    /// True iff a block is currently being tracked.
    #[must_use]
    pub fn has_pending_block(&self) -> bool {
        self.tracking.is_some()
    }

    /// True iff `hash` is part of the in-flight block (either resolved or
    /// still awaiting a verdict).
    #[must_use]
    pub fn tracks(&self, hash: &Hash) -> bool {
        self.tracking
            .as_ref()
            .is_some_and(|t| t.processed.contains_key(hash) || t.unprocessed.contains_key(hash))
    }

    fn emit_reply(&mut self) -> Option<(C, VerifyBlockReply)> {
        let tracking = self.tracking.take()?;
        let results = tracking
            .processed
            .into_iter()
            .map(|(hash, v)| TxVerifyResult {
                hash,
                height: v.height,
                error_code: v.error_code,
            })
            .collect();
        Some((tracking.consensus_handle, VerifyBlockReply { results }))
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
    fn begin_block_emits_immediately_when_fully_resolved() {
        let mut coordinator: BlockCoordinator<&'static str> = BlockCoordinator::new();
        let tx = sample_tx(0);
        let verified_now = vec![TxVerifyResult {
            hash: tx.hash(),
            height: 10,
            error_code: ErrorCode::NoError,
        }];
        let reply = coordinator.begin_block(10, verified_now, Vec::new(), Vec::new(), "consensus");
        let (handle, reply) = reply.expect("fully resolved block emits immediately");
        assert_eq!(handle, "consensus");
        assert_eq!(reply.results.len(), 1);
        assert!(!coordinator.has_pending_block());
    }

    #[test]
    fn begin_block_waits_for_unresolved_txs() {
        let mut coordinator: BlockCoordinator<&'static str> = BlockCoordinator::new();
        let a = sample_tx(0);
        let b = sample_tx(1);
        let reply = coordinator.begin_block(10, Vec::new(), vec![a.clone(), b.clone()], Vec::new(), "consensus");
        assert!(reply.is_none());
        assert!(coordinator.has_pending_block());

        assert!(coordinator.record_result(a.hash(), 10, ErrorCode::NoError).is_none());
        let (_, reply) = coordinator
            .record_result(b.hash(), 10, ErrorCode::NoError)
            .expect("last tx completes the block");
        assert_eq!(reply.results.len(), 2);
    }

    #[test]
    fn first_failure_emits_reply_early() {
        let mut coordinator: BlockCoordinator<&'static str> = BlockCoordinator::new();
        let a = sample_tx(0);
        let b = sample_tx(1);
        let c = sample_tx(2);
        coordinator.begin_block(10, Vec::new(), vec![a.clone(), b.clone(), c.clone()], Vec::new(), "consensus");

        let (_, reply) = coordinator
            .record_result(b.hash(), 10, ErrorCode::Validator("bad sig".into()))
            .expect("failure emits immediately");
        assert_eq!(reply.results.len(), 1);
        assert_eq!(reply.results[0].hash, b.hash());

        // c's eventual response is ignored; no block is tracked any more.
        assert!(coordinator.record_result(c.hash(), 10, ErrorCode::NoError).is_none());
        assert!(!coordinator.has_pending_block());
    }
}
