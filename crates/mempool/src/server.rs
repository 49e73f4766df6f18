//! `MempoolServer`: the single message-handling actor that owns the
//! `Mempool` state and the `BlockCoordinator`, and drives the periodic
//! promotion/timeout tick. §4.5.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};

use crate::domain::entities::{
    Hash, Stage, Transaction, TxEntry, UnregisterAck, VerifyTxRsp, VerifyType,
};
use crate::domain::errors::MempoolError;
use crate::domain::{
    check_admission_floor, BlockCoordinator, Mempool, MempoolConfig, MempoolEvent, ValidatorRegistry,
};
use crate::dispatcher::VerificationDispatcher;
use crate::ports::outbound::{ConsensusReplyHandle, GossipHandle, TimeSource, ValidatorHandle};

/// The closed set of messages `MempoolServer` accepts. §6.
pub enum ServerMessage<V, C> {
    /// Admit a transaction. No reply; admission is observable via `IsInPool`/`GetVerifyStatus`.
    Submit {
        tx: Transaction,
        from_local_client: bool,
        reply: oneshot::Sender<Result<Hash, MempoolError>>,
    },
    /// Draw a batch of verified transactions.
    GetVerifiedBatch {
        by_count: bool,
        height: u64,
        reply: oneshot::Sender<Vec<TxEntry>>,
    },
    /// Fetch a `Passed` entry by hash.
    GetVerifiedByHash { hash: Hash, reply: oneshot::Sender<Option<TxEntry>> },
    /// Check membership.
    IsInPool { hash: Hash, reply: oneshot::Sender<bool> },
    /// Fetch verify status (the entry if `Passed`, else absent).
    GetVerifyStatus { hash: Hash, reply: oneshot::Sender<Option<TxEntry>> },
    /// Ask for a block's transactions to be verified; the reply arrives
    /// asynchronously on `consensus_handle`, not through this message.
    VerifyBlock {
        height: u64,
        txs: Vec<Transaction>,
        consensus_handle: C,
    },
    /// A validator's verdict on one transaction.
    VerifyResponse(VerifyTxRsp),
    /// The storage layer finished persisting a block.
    SaveBlockComplete { txs: Vec<Hash> },
    /// Register a validator.
    RegisterValidator { verify_type: VerifyType, id: String, handle: V },
    /// Unregister a validator; it receives an `UnregisterAck`.
    UnregisterValidator { verify_type: VerifyType, id: String },
    /// Always replies with an empty counter vector (§9 Open Questions).
    GetTxVerifyResultStatics { reply: oneshot::Sender<Vec<u64>> },
}

/// The mempool actor. Owns all mutable mempool state; the only shared
/// state is the validator registry, guarded by a mutex with short critical
/// sections (see `VerificationDispatcher`/`register`/`unregister`).
pub struct MempoolServer<V, C, G, T> {
    pool: Mempool,
    registry: Arc<Mutex<ValidatorRegistry<V>>>,
    dispatcher: VerificationDispatcher<V>,
    block_coordinator: BlockCoordinator<C>,
    gossip: G,
    time: T,
    inbox: mpsc::Receiver<ServerMessage<V, C>>,
}

impl<V, C, G, T> MempoolServer<V, C, G, T>
where
    V: ValidatorHandle,
    C: ConsensusReplyHandle,
    G: GossipHandle,
    T: TimeSource,
{
    /// Builds a server and its inbound channel.
    #[must_use]
    pub fn new(
        config: MempoolConfig,
        registry: Arc<Mutex<ValidatorRegistry<V>>>,
        gossip: G,
        time: T,
    ) -> (Self, mpsc::Sender<ServerMessage<V, C>>) {
        let (tx, rx) = mpsc::channel(1024);
        let dispatcher = VerificationDispatcher::new(Arc::clone(&registry));
        let server = Self {
            pool: Mempool::new(config),
            registry,
            dispatcher,
            block_coordinator: BlockCoordinator::new(),
            gossip,
            time,
            inbox: rx,
        };
        (server, tx)
    }

    /// Runs the actor loop until the inbox closes. Ticks after every
    /// message and on a 1s fallback timer so promotion/timeout sweeps
    /// still happen during quiet periods.
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(Duration::from_secs(1));
        loop {
            tokio::select! {
                maybe_msg = self.inbox.recv() => {
                    match maybe_msg {
                        Some(msg) => {
                            self.handle(msg).await;
                            self.tick().await;
                        }
                        None => {
                            tracing::info!("mempool server inbox closed, shutting down");
                            break;
                        }
                    }
                }
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }
    }

    async fn tick(&mut self) {
        let now = self.time.now();
        let dispatch = self.pool.tick(now);
        self.dispatcher.dispatch_all(dispatch).await;
    }

    async fn handle(&mut self, msg: ServerMessage<V, C>) {
        let now = self.time.now();
        match msg {
            ServerMessage::Submit { tx, from_local_client, reply } => {
                let outcome = match check_admission_floor(&tx, self.pool.config()) {
                    Err(err) => {
                        tracing::debug!(error = %err, "submit rejected below gas floor");
                        Err(err)
                    }
                    Ok(()) => match self.pool.submit(tx, from_local_client, now) {
                        Ok((hash, dispatch)) => {
                            if let Some(req) = dispatch {
                                self.dispatcher.dispatch(req).await;
                            }
                            Ok(hash)
                        }
                        Err(err) => {
                            tracing::debug!(error = %err, "submit rejected");
                            Err(err)
                        }
                    },
                };
                let _ = reply.send(outcome);
            }
            ServerMessage::GetVerifiedBatch { by_count, height, reply } => {
                let (entries, dispatch) = self.pool.take_verified(by_count, height, now);
                self.dispatcher.dispatch_all(dispatch).await;
                let _ = reply.send(entries);
            }
            ServerMessage::GetVerifiedByHash { hash, reply } => {
                let _ = reply.send(self.passed_entry(&hash));
            }
            ServerMessage::IsInPool { hash, reply } => {
                let _ = reply.send(self.pool.contains(&hash));
            }
            ServerMessage::GetVerifyStatus { hash, reply } => {
                let _ = reply.send(self.passed_entry(&hash));
            }
            ServerMessage::VerifyBlock { height, txs, consensus_handle } => {
                let classify = self.pool.classify_block(&txs, height, now);
                self.dispatcher.dispatch_all(classify.dispatch).await;
                if let Some((handle, reply)) = self.block_coordinator.begin_block(
                    height,
                    classify.verified_now,
                    classify.unchecked,
                    classify.need_stateful,
                    consensus_handle,
                ) {
                    handle.reply(reply).await;
                }
            }
            ServerMessage::VerifyResponse(rsp) => {
                for event in self.pool.on_verify_response(rsp) {
                    self.handle_event(event).await;
                }
            }
            ServerMessage::SaveBlockComplete { txs } => {
                self.pool.remove_confirmed(&txs);
            }
            ServerMessage::RegisterValidator { verify_type, id, handle } => {
                self.registry.lock().register(verify_type, id, handle);
            }
            ServerMessage::UnregisterValidator { verify_type, id } => {
                let removed = self.registry.lock().unregister(verify_type, &id);
                if let Some(handle) = removed {
                    handle.send_unregister_ack(UnregisterAck { verify_type, id }).await;
                }
            }
            ServerMessage::GetTxVerifyResultStatics { reply } => {
                let _ = reply.send(Vec::new());
            }
        }
    }

    async fn handle_event(&mut self, event: MempoolEvent) {
        match event {
            MempoolEvent::Dispatch(req) => self.dispatcher.dispatch(req).await,
            MempoolEvent::Gossip(tx) => self.gossip.broadcast(tx).await,
            MempoolEvent::BlockResult { hash, height, error_code } => {
                if let Some((handle, reply)) = self.block_coordinator.record_result(hash, height, error_code) {
                    handle.reply(reply).await;
                }
            }
        }
    }

    fn passed_entry(&self, hash: &Hash) -> Option<TxEntry> {
        self.pool.get(hash).filter(|e| e.stage == Stage::Passed).cloned()
    }
}
