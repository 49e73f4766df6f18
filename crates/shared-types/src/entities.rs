//! # Core Domain Entities
//!
//! Defines the core blockchain entities shared across subsystems.
//!
//! ## Clusters
//!
//! - **Chain**: the minimal transaction representation the mempool (and any
//!   future signature-verification or state-management subsystem) agrees on.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};

/// A 32-byte hash (e.g., SHA-256 or Blake3).
pub type Hash = [u8; 32];

/// A 64-byte Ed25519 signature.
pub type Signature = [u8; 64];

/// A 32-byte Ed25519 public key, also used as the sender/account identifier.
pub type PublicKey = [u8; 32];

/// A raw transaction as received from the network or a local client.
///
/// The mempool treats this as opaque beyond `hash()` and `gas_price()`; it
/// never decodes payload or verifies the signature itself (§1 Out of scope).
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Sender's public key.
    pub from: PublicKey,
    /// Recipient's public key (absent for contract deployment).
    pub to: Option<PublicKey>,
    /// Transaction amount in base units.
    pub value: u64,
    /// Sender's nonce.
    pub nonce: u64,
    /// Gas limit the sender is willing to spend.
    pub gas_limit: u64,
    /// Gas price the sender is offering.
    pub gas_price: u64,
    /// Transaction payload (contract call data, deploy bytecode, etc.).
    pub data: Vec<u8>,
    /// Sender's signature over the transaction.
    #[serde_as(as = "Bytes")]
    pub signature: Signature,
}

impl Transaction {
    /// Content hash used as the table key throughout the mempool.
    ///
    /// A real node would hash the canonical encoding; here we fold the
    /// fields that make a transaction unique since decoding/hashing
    /// primitives are an external collaborator (§1).
    #[must_use]
    pub fn hash(&self) -> Hash {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(self.from);
        if let Some(to) = self.to {
            hasher.update(to);
        }
        hasher.update(self.value.to_le_bytes());
        hasher.update(self.nonce.to_le_bytes());
        hasher.update(self.gas_limit.to_le_bytes());
        hasher.update(self.gas_price.to_le_bytes());
        hasher.update(&self.data);
        hasher.update(self.signature);
        hasher.finalize().into()
    }

    /// Whether this transaction deploys a contract (no recipient).
    #[must_use]
    pub fn is_deploy(&self) -> bool {
        self.to.is_none()
    }
}
