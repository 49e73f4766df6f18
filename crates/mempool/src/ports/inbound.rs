//! Inbound (driving) port: the message-passing API other subsystems use
//! to talk to a running `MempoolServer`. §4.5, §6.

use tokio::sync::{mpsc, oneshot};

use crate::domain::entities::{Hash, Transaction, TxEntry, VerifyTxRsp, VerifyType};
use crate::domain::errors::MempoolError;
use crate::server::ServerMessage;

/// A cloneable client handle for a running `MempoolServer`.
///
/// Every call sends one `ServerMessage` and, for request/response calls,
/// awaits the reply on a oneshot channel. Dropping every `MempoolHandle`
/// closes the server's inbox and ends its `run` loop.
#[derive(Clone)]
pub struct MempoolHandle<V, C> {
    inbox: mpsc::Sender<ServerMessage<V, C>>,
}

impl<V, C> MempoolHandle<V, C> {
    /// Wraps a sender into the server's inbox.
    #[must_use]
    pub fn new(inbox: mpsc::Sender<ServerMessage<V, C>>) -> Self {
        Self { inbox }
    }

    /// Submits a transaction for admission.
    ///
    /// # Errors
    /// Returns the rejection reason if admission failed (duplicate, over
    /// quota, or below the gas floor).
    pub async fn submit(&self, tx: Transaction, from_local_client: bool) -> Result<Hash, MempoolError> {
        let (reply, rx) = oneshot::channel();
        let _ = self
            .inbox
            .send(ServerMessage::Submit { tx, from_local_client, reply })
            .await;
        rx.await.unwrap_or(Err(MempoolError::CapacityFull { capacity: 0 }))
    }

    /// Draws a batch of `Passed` transactions, marking them `Invalid` so
    /// they are not handed out twice.
    pub async fn get_verified_batch(&self, by_count: bool, height: u64) -> Vec<TxEntry> {
        let (reply, rx) = oneshot::channel();
        let _ = self
            .inbox
            .send(ServerMessage::GetVerifiedBatch { by_count, height, reply })
            .await;
        rx.await.unwrap_or_default()
    }

    /// Fetches a single `Passed` entry by hash, without removing it.
    pub async fn get_verified_by_hash(&self, hash: Hash) -> Option<TxEntry> {
        let (reply, rx) = oneshot::channel();
        let _ = self.inbox.send(ServerMessage::GetVerifiedByHash { hash, reply }).await;
        rx.await.ok().flatten()
    }

    /// Checks whether the table currently holds an entry for `hash`.
    pub async fn is_in_pool(&self, hash: Hash) -> bool {
        let (reply, rx) = oneshot::channel();
        let _ = self.inbox.send(ServerMessage::IsInPool { hash, reply }).await;
        rx.await.unwrap_or(false)
    }

    /// Fetches verify status for `hash` (the entry if `Passed`, else `None`).
    pub async fn get_verify_status(&self, hash: Hash) -> Option<TxEntry> {
        let (reply, rx) = oneshot::channel();
        let _ = self.inbox.send(ServerMessage::GetVerifyStatus { hash, reply }).await;
        rx.await.ok().flatten()
    }

    /// Asks the mempool to verify a proposed block's transactions; the
    /// consolidated reply arrives on `consensus_handle`, not as a return value.
    pub async fn verify_block(&self, height: u64, txs: Vec<Transaction>, consensus_handle: C) {
        let _ = self
            .inbox
            .send(ServerMessage::VerifyBlock { height, txs, consensus_handle })
            .await;
    }

    /// Delivers a validator's verdict on one transaction.
    pub async fn verify_response(&self, rsp: VerifyTxRsp) {
        let _ = self.inbox.send(ServerMessage::VerifyResponse(rsp)).await;
    }

    /// Notifies the mempool that a block finished persisting, so its
    /// transactions can be dropped from the table.
    pub async fn save_block_complete(&self, txs: Vec<Hash>) {
        let _ = self.inbox.send(ServerMessage::SaveBlockComplete { txs }).await;
    }

    /// Registers a validator to receive verify requests of `verify_type`.
    pub async fn register_validator(&self, verify_type: VerifyType, id: String, handle: V) {
        let _ = self
            .inbox
            .send(ServerMessage::RegisterValidator { verify_type, id, handle })
            .await;
    }

    /// Unregisters a validator; it receives an `UnregisterAck` once removed.
    pub async fn unregister_validator(&self, verify_type: VerifyType, id: String) {
        let _ = self.inbox.send(ServerMessage::UnregisterValidator { verify_type, id }).await;
    }

    /// Always returns an empty counter vector (§9 Open Questions: no
    /// historical verify-result statistics are tracked).
    pub async fn get_tx_verify_result_statics(&self) -> Vec<u64> {
        let (reply, rx) = oneshot::channel();
        let _ = self.inbox.send(ServerMessage::GetTxVerifyResultStatics { reply }).await;
        rx.await.unwrap_or_default()
    }
}
