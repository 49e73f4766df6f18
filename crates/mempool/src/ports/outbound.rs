//! Outbound (driven) ports for the Mempool subsystem.
//!
//! Small traits standing in for the actors on the other end of each
//! asynchronous send: a validator, the consensus caller that asked for a
//! block verification, and the gossip sink. Each has a `tokio::sync::mpsc`
//! production implementation and an in-memory recording implementation
//! used by tests.

use async_trait::async_trait;

use crate::domain::entities::{Timestamp, Transaction, UnregisterAck, VerifyBlockReply, VerifyTxReq};

/// Delivers verify requests to one validator and its unregister acks.
#[async_trait]
pub trait ValidatorHandle: Clone + Send + Sync + 'static {
    /// Sends a verify request to the validator.
    async fn send_verify(&self, req: VerifyTxReq);
    /// Notifies the validator that it has been unregistered.
    async fn send_unregister_ack(&self, ack: UnregisterAck);
}

/// Delivers the consolidated reply to a consensus `VerifyBlock` request.
#[async_trait]
pub trait ConsensusReplyHandle: Send + Sync + 'static {
    /// Sends the final `VerifyBlockReply`.
    async fn reply(&self, msg: VerifyBlockReply);
}

/// Forwards locally-submitted, now-`Passed` txs to peer gossip.
#[async_trait]
pub trait GossipHandle: Send + Sync + 'static {
    /// Broadcasts `tx` to peers.
    async fn broadcast(&self, tx: Transaction);
}

/// Time source abstraction so `tick`/`submit` timestamps are testable.
pub trait TimeSource: Send + Sync {
    /// Current time, in the same unit as `checkingTimeout` (seconds).
    fn now(&self) -> Timestamp;
}

/// Wall-clock time source for production use.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

/// Production `ValidatorHandle` backed by two `mpsc` channels.
#[derive(Clone)]
pub struct MpscValidatorHandle {
    verify_tx: tokio::sync::mpsc::Sender<VerifyTxReq>,
    ack_tx: tokio::sync::mpsc::Sender<UnregisterAck>,
}

impl MpscValidatorHandle {
    /// Wraps a pair of channel senders as a `ValidatorHandle`.
    #[must_use]
    pub fn new(
        verify_tx: tokio::sync::mpsc::Sender<VerifyTxReq>,
        ack_tx: tokio::sync::mpsc::Sender<UnregisterAck>,
    ) -> Self {
        Self { verify_tx, ack_tx }
    }
}

#[async_trait]
impl ValidatorHandle for MpscValidatorHandle {
    async fn send_verify(&self, req: VerifyTxReq) {
        if self.verify_tx.send(req).await.is_err() {
            tracing::debug!("validator channel closed, dropping verify request");
        }
    }

    async fn send_unregister_ack(&self, ack: UnregisterAck) {
        if self.ack_tx.send(ack).await.is_err() {
            tracing::debug!("validator channel closed, dropping unregister ack");
        }
    }
}

/// Production `ConsensusReplyHandle` backed by an `mpsc` channel.
#[derive(Clone)]
pub struct MpscConsensusReplyHandle(tokio::sync::mpsc::Sender<VerifyBlockReply>);

impl MpscConsensusReplyHandle {
    /// Wraps a channel sender as a `ConsensusReplyHandle`.
    #[must_use]
    pub fn new(sender: tokio::sync::mpsc::Sender<VerifyBlockReply>) -> Self {
        Self(sender)
    }
}

#[async_trait]
impl ConsensusReplyHandle for MpscConsensusReplyHandle {
    async fn reply(&self, msg: VerifyBlockReply) {
        if self.0.send(msg).await.is_err() {
            tracing::debug!("consensus reply channel closed, dropping VerifyBlockReply");
        }
    }
}

#[cfg(test)]
pub use test_support::*;
