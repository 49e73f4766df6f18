//! # Ports Layer - Hexagonal Architecture Boundaries
//!
//! ## Inbound (Driving) Port
//!
//! `MempoolHandle` - message-passing client for a running `MempoolServer`.
//!
//! ## Outbound (Driven) Ports
//!
//! - `ValidatorHandle` - delivers verify requests to validators
//! - `ConsensusReplyHandle` - delivers `VerifyBlockReply` to consensus
//! - `GossipHandle` - broadcasts locally-submitted passed txs
//! - `TimeSource` - timestamp abstraction for testability

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
