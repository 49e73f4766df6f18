//! The `Mempool` core: the canonical transaction table plus the
//! pending/checking/passed sequences, and quota enforcement.
//!
//! This is pure domain logic: it never performs I/O. Operations that need
//! a validator request sent, a tx gossiped, or a block verdict relayed
//! return `MempoolEvent`s describing the side effect; `MempoolServer`
//! carries them out.
//!
//! The table is authoritative; the three `VecDeque<Hash>` sequences are
//! hints that may point at stale (`Invalid`) entries, reconciled by lazy
//! compaction during `tick`, `take_verified`, and `classify_block` rather
//! than kept perfectly in sync on every mutation.

use std::collections::{HashMap, VecDeque};

use super::entities::{
    DispatchRequest, Hash, MempoolConfig, MempoolEvent, Stage, Timestamp, Transaction, TxEntry,
    TxVerifyResult, VerifyTxRsp, VerifyType,
};
use super::errors::{ErrorCode, MempoolError};

/// The three lists `classify_block` sorts a proposed block's txs into.
#[derive(Debug, Default)]
pub struct ClassifyResult {
    /// Txs already `Passed` and current at the requested height.
    pub verified_now: Vec<TxVerifyResult>,
    /// Txs absent or not yet `Passed`; need a fresh stateless check.
    pub unchecked: Vec<Transaction>,
    /// Txs `Passed` but stale at the requested height; need a fresh stateful check.
    pub need_stateful: Vec<Transaction>,
    /// Verify requests to fire for `unchecked` and `need_stateful`.
    pub dispatch: Vec<DispatchRequest>,
}

/// The canonical mempool store.
#[derive(Debug)]
pub struct Mempool {
    config: MempoolConfig,
    table: HashMap<Hash, TxEntry>,
    pending: VecDeque<Hash>,
    checking: VecDeque<Hash>,
    passed: VecDeque<Hash>,
    pending_count: usize,
    checking_count: usize,
    passed_count: usize,
}

impl Mempool {
    /// Creates an empty mempool under `config`.
    #[must_use]
    pub fn new(config: MempoolConfig) -> Self {
        Self {
            config,
            table: HashMap::new(),
            pending: VecDeque::new(),
            checking: VecDeque::new(),
            passed: VecDeque::new(),
            pending_count: 0,
            checking_count: 0,
            passed_count: 0,
        }
    }

    /// Total known transactions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// True iff no transactions are known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Number of entries in `Pending`.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending_count
    }

    /// Number of entries in `Checking`.
    #[must_use]
    pub fn checking_count(&self) -> usize {
        self.checking_count
    }

    /// Number of entries in `Passed`.
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.passed_count
    }

    /// Looks up an entry by hash.
    #[must_use]
    pub fn get(&self, hash: &Hash) -> Option<&TxEntry> {
        self.table.get(hash)
    }

    /// The configuration this pool was constructed with.
    #[must_use]
    pub fn config(&self) -> &MempoolConfig {
        &self.config
    }

    /// Whether `hash` is currently known.
    #[must_use]
    pub fn contains(&self, hash: &Hash) -> bool {
        self.table.contains_key(hash)
    }

    /// Admits a transaction. §4.3.1.
    pub fn submit(
        &mut self,
        tx: Transaction,
        from_local_client: bool,
        now: Timestamp,
    ) -> Result<(Hash, Option<DispatchRequest>), MempoolError> {
        let hash = tx.hash();
        if self.table.contains_key(&hash) {
            return Err(MempoolError::Duplicate(hash));
        }
        if self.table.len() >= self.config.max_capacity {
            return Err(MempoolError::CapacityFull {
                capacity: self.config.max_capacity,
            });
        }

        if self.checking_count < self.config.max_checking {
            let entry = TxEntry::new_checking(tx.clone(), from_local_client, now);
            self.table.insert(hash, entry);
            self.checking.push_back(hash);
            self.checking_count += 1;
            Ok((
                hash,
                Some(DispatchRequest {
                    verify_type: VerifyType::Stateless,
                    tx,
                }),
            ))
        } else if self.pending_count < self.config.max_pending {
            let entry = TxEntry::new_pending(tx, from_local_client);
            self.table.insert(hash, entry);
            self.pending.push_back(hash);
            self.pending_count += 1;
            Ok((hash, None))
        } else {
            Err(MempoolError::TooManyPending {
                limit: self.config.max_pending,
            })
        }
    }

    /// Applies a validator's verdict. §4.3.2.
    pub fn on_verify_response(&mut self, rsp: VerifyTxRsp) -> Vec<MempoolEvent> {
        let mut events = Vec::new();

        let stage = match self.table.get(&rsp.hash) {
            Some(entry) => entry.stage,
            None => return events,
        };
        if stage == Stage::Invalid {
            return events;
        }

        if !rsp.error_code.is_ok() {
            self.table.remove(&rsp.hash);
            if stage == Stage::Checking {
                self.checking_count -= 1;
            } else if stage == Stage::Pending {
                self.pending_count -= 1;
            }
            events.push(MempoolEvent::BlockResult {
                hash: rsp.hash,
                height: rsp.height,
                error_code: rsp.error_code,
            });
            return events;
        }

        let entry = self.table.get_mut(&rsp.hash).expect("checked present above");
        match rsp.verify_type {
            VerifyType::Stateless => entry.pass_stateless = true,
            VerifyType::Stateful => {
                entry.pass_stateful = true;
                entry.verify_height = rsp.height;
            }
        }

        if entry.is_fully_passed() {
            entry.stage = Stage::Passed;
            let tx = entry.tx.clone();
            let from_local_client = entry.from_local_client;
            let verify_height = entry.verify_height;
            self.checking_count -= 1;
            self.passed_count += 1;
            self.passed.push_back(rsp.hash);
            if from_local_client {
                events.push(MempoolEvent::Gossip(tx));
            }
            events.push(MempoolEvent::BlockResult {
                hash: rsp.hash,
                height: verify_height,
                error_code: ErrorCode::NoError,
            });
        } else if rsp.verify_type == VerifyType::Stateless {
            events.push(MempoolEvent::Dispatch(DispatchRequest {
                verify_type: VerifyType::Stateful,
                tx: entry.tx.clone(),
            }));
        }

        events
    }

    /// Draws a batch of verified transactions for block building. §4.3.3.
    pub fn take_verified(
        &mut self,
        by_count: bool,
        current_height: u64,
        now: Timestamp,
    ) -> (Vec<TxEntry>, Vec<DispatchRequest>) {
        let mut result = Vec::new();
        let mut dispatch = Vec::new();
        let mut kept = VecDeque::new();

        for hash in self.passed.drain(..).collect::<Vec<_>>() {
            let Some(entry) = self.table.get(&hash) else {
                continue;
            };
            if entry.stage != Stage::Passed {
                continue;
            }

            if entry.verify_height < current_height {
                let tx = entry.tx.clone();
                let from_local_client = entry.from_local_client;
                self.passed_count -= 1;
                let mut fresh = TxEntry::new_checking(tx.clone(), from_local_client, now);
                fresh.pass_stateless = true;
                self.table.insert(hash, fresh);
                self.checking.push_back(hash);
                self.checking_count += 1;
                dispatch.push(DispatchRequest {
                    verify_type: VerifyType::Stateful,
                    tx,
                });
                continue;
            }

            if by_count && result.len() >= self.config.max_tx_in_block {
                kept.push_back(hash);
                continue;
            }

            result.push(entry.clone());
            self.passed_count -= 1;
            self.table.get_mut(&hash).expect("checked present above").stage = Stage::Invalid;
        }

        self.passed = kept;
        (result, dispatch)
    }

    /// Sorts a proposed block's txs into resolved/unresolved groups and
    /// fires the verify requests the unresolved ones need. §4.3.4.
    pub fn classify_block(&mut self, txs: &[Transaction], block_height: u64, now: Timestamp) -> ClassifyResult {
        let mut out = ClassifyResult::default();
        let mut reclassified_pending = 0usize;
        let mut reclassified_checking = 0usize;

        for tx in txs {
            let hash = tx.hash();
            let current_stage = self.table.get(&hash).map(|e| e.stage);
            match current_stage {
                Some(Stage::Passed) => {
                    let entry = self.table.get_mut(&hash).expect("checked present above");
                    if entry.verify_height >= block_height {
                        out.verified_now.push(TxVerifyResult {
                            hash,
                            height: entry.verify_height,
                            error_code: ErrorCode::NoError,
                        });
                        entry.stage = Stage::Invalid;
                        self.passed_count -= 1;
                    } else {
                        entry.pass_stateful = false;
                        entry.stage = Stage::Invalid;
                        self.passed_count -= 1;
                        out.need_stateful.push(tx.clone());
                    }
                }
                Some(Stage::Pending) => {
                    reclassified_pending += 1;
                    out.unchecked.push(tx.clone());
                }
                Some(Stage::Checking) => {
                    reclassified_checking += 1;
                    out.unchecked.push(tx.clone());
                }
                _ => out.unchecked.push(tx.clone()),
            }
        }

        self.passed.retain(|h| self.table.get(h).map(|e| e.stage) == Some(Stage::Passed));

        // Txs pulled out of Pending/Checking here are about to get a brand
        // new Checking entry below; drop their stale counters and deque
        // pointers first so they aren't double-counted or double-queued.
        if reclassified_pending > 0 || reclassified_checking > 0 {
            let reclassified: std::collections::HashSet<Hash> =
                out.unchecked.iter().map(Transaction::hash).collect();
            self.pending.retain(|h| !reclassified.contains(h));
            self.checking.retain(|h| !reclassified.contains(h));
            self.pending_count -= reclassified_pending;
            self.checking_count -= reclassified_checking;
        }

        for tx in &out.unchecked {
            let hash = tx.hash();
            self.table.insert(hash, TxEntry::new_checking(tx.clone(), false, now));
            self.checking.push_back(hash);
            self.checking_count += 1;
            out.dispatch.push(DispatchRequest {
                verify_type: VerifyType::Stateless,
                tx: tx.clone(),
            });
        }
        for tx in &out.need_stateful {
            let hash = tx.hash();
            let mut fresh = TxEntry::new_checking(tx.clone(), false, now);
            fresh.pass_stateless = true;
            self.table.insert(hash, fresh);
            self.checking.push_back(hash);
            self.checking_count += 1;
            out.dispatch.push(DispatchRequest {
                verify_type: VerifyType::Stateful,
                tx: tx.clone(),
            });
        }

        out
    }

    /// Drops confirmed transactions from the table. §4.3.5.
    pub fn remove_confirmed(&mut self, hashes: &[Hash]) {
        for hash in hashes {
            if let Some(entry) = self.table.remove(hash) {
                match entry.stage {
                    Stage::Pending => self.pending_count -= 1,
                    Stage::Checking => self.checking_count -= 1,
                    Stage::Passed => self.passed_count -= 1,
                    Stage::Invalid => {}
                }
            }
        }
    }

    /// Periodic maintenance: timeout sweep, pending promotion, compaction. §4.3.6.
    pub fn tick(&mut self, now: Timestamp) -> Vec<DispatchRequest> {
        let mut dispatch = Vec::new();

        // 1. Timeout sweep, oldest first, stop at the first entry still in window.
        let mut refreshed = VecDeque::new();
        while let Some(hash) = self.checking.pop_front() {
            let Some(entry) = self.table.get(&hash) else {
                continue;
            };
            if entry.stage != Stage::Checking {
                continue;
            }
            if now.saturating_sub(entry.entered_checking_at) < self.config.checking_timeout {
                refreshed.push_back(hash);
                refreshed.extend(self.checking.drain(..));
                break;
            }
            let tx = entry.tx.clone();
            let from_local_client = entry.from_local_client;
            self.table.insert(hash, TxEntry::new_checking(tx.clone(), from_local_client, now));
            refreshed.push_back(hash);
            dispatch.push(DispatchRequest {
                verify_type: VerifyType::Stateless,
                tx,
            });
        }
        self.checking = refreshed;

        // 2. Promote from pending while checking has room, one batch per tick.
        let threshold = (self.config.max_checking * 3) / 4;
        if self.checking_count <= threshold && !self.pending.is_empty() {
            let batch_cap = (self.config.max_checking / 4).max(1);
            let mut promoted = 0;
            while promoted < batch_cap {
                let Some(hash) = self.pending.pop_front() else {
                    break;
                };
                let Some(entry) = self.table.get_mut(&hash) else {
                    continue;
                };
                if entry.stage != Stage::Pending {
                    continue;
                }
                entry.stage = Stage::Checking;
                entry.entered_checking_at = now;
                let tx = entry.tx.clone();
                self.pending_count -= 1;
                self.checking.push_back(hash);
                self.checking_count += 1;
                dispatch.push(DispatchRequest {
                    verify_type: VerifyType::Stateless,
                    tx,
                });
                promoted += 1;
            }
        }
        self.pending.retain(|h| self.table.get(h).map(|e| e.stage) == Some(Stage::Pending));

        // 3. Final compaction of checking.
        self.checking.retain(|h| self.table.get(h).map(|e| e.stage) == Some(Stage::Checking));

        dispatch
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
    fn duplicate_submit_is_rejected() {
        let mut pool = Mempool::new(MempoolConfig::default());
        let tx = sample_tx(0);
        pool.submit(tx.clone(), true, 0).unwrap();
        let err = pool.submit(tx, true, 0).unwrap_err();
        assert!(matches!(err, MempoolError::Duplicate(_)));
    }

    #[test]
    fn cap_gate_admits_up_to_pending_plus_checking_then_rejects() {
        let config = MempoolConfig {
            max_pending: 2,
            max_checking: 1,
            max_capacity: 10,
            ..MempoolConfig::for_testing()
        };
        let mut pool = Mempool::new(config);
        let (hash_a, dispatch_a) = pool.submit(sample_tx(0), true, 0).unwrap();
        assert!(dispatch_a.is_some());
        assert_eq!(pool.get(&hash_a).unwrap().stage, Stage::Checking);

        let (hash_b, dispatch_b) = pool.submit(sample_tx(1), true, 0).unwrap();
        assert!(dispatch_b.is_none());
        assert_eq!(pool.get(&hash_b).unwrap().stage, Stage::Pending);

        let (hash_c, _) = pool.submit(sample_tx(2), true, 0).unwrap();
        assert_eq!(pool.get(&hash_c).unwrap().stage, Stage::Pending);

        let err = pool.submit(sample_tx(3), true, 0).unwrap_err();
        assert!(matches!(err, MempoolError::TooManyPending { .. }));
    }

    #[test]
    fn single_tx_path_reaches_passed_and_gossips() {
        let mut pool = Mempool::new(MempoolConfig::default());
        let tx = sample_tx(0);
        let (hash, dispatch) = pool.submit(tx.clone(), true, 0).unwrap();
        assert!(matches!(
            dispatch,
            Some(DispatchRequest {
                verify_type: VerifyType::Stateless,
                ..
            })
        ));

        let events = pool.on_verify_response(VerifyTxRsp {
            hash,
            verify_type: VerifyType::Stateless,
            height: 0,
            error_code: ErrorCode::NoError,
        });
        assert!(matches!(
            events.as_slice(),
            [MempoolEvent::Dispatch(DispatchRequest {
                verify_type: VerifyType::Stateful,
                ..
            })]
        ));

        let events = pool.on_verify_response(VerifyTxRsp {
            hash,
            verify_type: VerifyType::Stateful,
            height: 10,
            error_code: ErrorCode::NoError,
        });
        assert!(events.iter().any(|e| matches!(e, MempoolEvent::Gossip(_))));
        assert_eq!(pool.get(&hash).unwrap().stage, Stage::Passed);
        assert_eq!(pool.get(&hash).unwrap().verify_height, 10);

        let (drawn, _) = pool.take_verified(false, 10, 20);
        assert_eq!(drawn.len(), 1);
        assert_eq!(drawn[0].hash(), hash);
    }

    #[test]
    fn stale_passed_tx_is_requeued_for_stateful_reverify() {
        let mut pool = Mempool::new(MempoolConfig::default());
        let tx = sample_tx(0);
        let (hash, _) = pool.submit(tx, true, 0).unwrap();
        pool.on_verify_response(VerifyTxRsp {
            hash,
            verify_type: VerifyType::Stateless,
            height: 0,
            error_code: ErrorCode::NoError,
        });
        pool.on_verify_response(VerifyTxRsp {
            hash,
            verify_type: VerifyType::Stateful,
            height: 5,
            error_code: ErrorCode::NoError,
        });
        assert_eq!(pool.get(&hash).unwrap().stage, Stage::Passed);

        let (drawn, dispatch) = pool.take_verified(false, 7, 100);
        assert!(drawn.is_empty());
        assert_eq!(dispatch.len(), 1);
        assert_eq!(dispatch[0].verify_type, VerifyType::Stateful);
        assert_eq!(pool.get(&hash).unwrap().stage, Stage::Checking);
        assert!(pool.get(&hash).unwrap().pass_stateless);
        assert!(!pool.get(&hash).unwrap().pass_stateful);

        pool.on_verify_response(VerifyTxRsp {
            hash,
            verify_type: VerifyType::Stateful,
            height: 7,
            error_code: ErrorCode::NoError,
        });
        let (drawn, _) = pool.take_verified(false, 7, 100);
        assert_eq!(drawn.len(), 1);
    }

    #[test]
    fn checking_timeout_is_retried() {
        let config = MempoolConfig {
            checking_timeout: 30,
            ..MempoolConfig::default()
        };
        let mut pool = Mempool::new(config);
        let (hash, _) = pool.submit(sample_tx(0), true, 0).unwrap();

        let dispatch = pool.tick(10);
        assert!(dispatch.is_empty());

        let dispatch = pool.tick(35);
        assert_eq!(dispatch.len(), 1);
        assert_eq!(dispatch[0].verify_type, VerifyType::Stateless);
        assert_eq!(pool.get(&hash).unwrap().entered_checking_at, 35);
    }

    #[test]
    fn tick_promotes_pending_into_checking_room() {
        let config = MempoolConfig {
            max_pending: 10,
            max_checking: 2,
            max_capacity: 20,
            ..MempoolConfig::for_testing()
        };
        let mut pool = Mempool::new(config);
        let hashes: Vec<_> = (0..3).map(|i| pool.submit(sample_tx(i), true, 0).unwrap().0).collect();
        assert_eq!(pool.checking_count(), 2);
        assert_eq!(pool.pending_count(), 1);

        // Resolve the first checking entry so a slot frees up for promotion.
        pool.on_verify_response(VerifyTxRsp {
            hash: hashes[0],
            verify_type: VerifyType::Stateless,
            height: 0,
            error_code: ErrorCode::NoError,
        });
        pool.on_verify_response(VerifyTxRsp {
            hash: hashes[0],
            verify_type: VerifyType::Stateful,
            height: 1,
            error_code: ErrorCode::NoError,
        });
        assert_eq!(pool.checking_count(), 1);

        let dispatch = pool.tick(1);
        assert!(!dispatch.is_empty());
        assert!(pool.checking_count() > 1);
    }

    #[test]
    fn remove_confirmed_drops_entries() {
        let mut pool = Mempool::new(MempoolConfig::default());
        let (hash, _) = pool.submit(sample_tx(0), true, 0).unwrap();
        pool.remove_confirmed(&[hash]);
        assert!(!pool.contains(&hash));
    }

    #[test]
    fn classify_block_separates_passed_unknown_and_stale() {
        let mut pool = Mempool::new(MempoolConfig::default());
        let a = sample_tx(0);
        let (hash_a, _) = pool.submit(a.clone(), true, 0).unwrap();
        pool.on_verify_response(VerifyTxRsp {
            hash: hash_a,
            verify_type: VerifyType::Stateless,
            height: 0,
            error_code: ErrorCode::NoError,
        });
        pool.on_verify_response(VerifyTxRsp {
            hash: hash_a,
            verify_type: VerifyType::Stateful,
            height: 10,
            error_code: ErrorCode::NoError,
        });

        let b = sample_tx(1);
        let result = pool.classify_block(&[a, b], 10, 0);
        assert_eq!(result.verified_now.len(), 1);
        assert_eq!(result.unchecked.len(), 1);
        assert!(result.need_stateful.is_empty());
        assert_eq!(result.dispatch.len(), 1);
    }

    #[test]
    fn classify_block_on_a_still_pending_tx_does_not_leak_counters() {
        let config = MempoolConfig {
            max_checking: 0,
            max_pending: 5,
            max_capacity: 5,
            ..MempoolConfig::for_testing()
        };
        let mut pool = Mempool::new(config);
        let a = sample_tx(0);
        pool.submit(a.clone(), true, 0).unwrap();
        assert_eq!(pool.pending_count(), 1);
        assert_eq!(pool.checking_count(), 0);

        pool.classify_block(std::slice::from_ref(&a), 10, 0);
        assert_eq!(pool.pending_count(), 0);
        assert_eq!(pool.checking_count(), 1);

        // `a` is now `Checking`, not yet `Passed`. A second `VerifyBlock`
        // referencing it must not double-count or duplicate its queue entry.
        pool.classify_block(&[a], 10, 0);
        assert_eq!(pool.pending_count(), 0);
        assert_eq!(pool.checking_count(), 1);
    }

    #[test]
    fn quota_invariants_hold_under_random_submit_sequences() {
        use rand::Rng;

        let config = MempoolConfig {
            max_pending: 5,
            max_checking: 3,
            max_capacity: 8,
            ..MempoolConfig::for_testing()
        };
        let mut pool = Mempool::new(config.clone());
        let mut rng = rand::thread_rng();

        for nonce in 0..500u64 {
            let _ = pool.submit(sample_tx(nonce), rng.gen_bool(0.5), 0);
            assert!(pool.pending_count() <= config.max_pending);
            assert!(pool.checking_count() <= config.max_checking);
            assert!(pool.len() <= config.max_capacity);
        }
    }
}
