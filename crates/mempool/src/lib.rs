//! # Transaction Pool (Mempool) Subsystem
//!
//! Queues submitted transactions, hands them to validators for stateless
//! and stateful checking, and serves verified batches to consensus for
//! block building.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  adapters/  - GossipHandle backed by the shared event bus       │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ implements ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  ports/inbound.rs  - MempoolHandle, the client API              │
//! │  ports/outbound.rs - ValidatorHandle, ConsensusReplyHandle,     │
//! │                      GossipHandle, TimeSource                  │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ uses ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  dispatcher.rs - VerificationDispatcher, round-robins to a      │
//! │                   validator via the shared registry             │
//! │  server.rs     - MempoolServer, the message-handling actor      │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ owns ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  domain/entities.rs         - TxEntry, Stage, MempoolConfig     │
//! │  domain/pool.rs             - Mempool, the canonical store      │
//! │  domain/registry.rs         - ValidatorRegistry, round robin    │
//! │  domain/block_coordinator.rs - BlockCoordinator                │
//! │  domain/services.rs         - admission-floor checks           │
//! │  domain/errors.rs           - MempoolError, ErrorCode           │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything under `domain/` is pure: it never performs I/O. Mutating
//! operations return data describing the side effects they imply
//! (`MempoolEvent`, `DispatchRequest`); `MempoolServer` is the only place
//! those are carried out.

pub mod adapters;
pub mod dispatcher;
pub mod domain;
pub mod ports;
pub mod server;

pub use adapters::BusGossipHandle;
pub use dispatcher::VerificationDispatcher;
pub use domain::*;
pub use ports::{MempoolHandle, ValidatorHandle};
pub use server::{MempoolServer, ServerMessage};
