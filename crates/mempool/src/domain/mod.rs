//! # Domain Layer - Mempool Subsystem
//!
//! Pure business logic: the transaction lifecycle, the pool itself, the
//! validator registry, and block verification tracking. Nothing in this
//! module performs I/O; side effects are returned as data (`MempoolEvent`,
//! `DispatchRequest`) for the server layer to carry out.
//!
//! ## Components
//!
//! - `entities`: `TxEntry`, `Stage`, `MempoolConfig`, wire-ish message types
//! - `pool`: `Mempool`, the canonical store and its queues
//! - `registry`: `ValidatorRegistry`, round-robin validator groups
//! - `block_coordinator`: `BlockCoordinator`, per-in-flight-block tracking
//! - `services`: admission-floor checks
//! - `errors`: `MempoolError`, `ErrorCode`

pub mod block_coordinator;
pub mod entities;
pub mod errors;
pub mod pool;
pub mod registry;
pub mod services;

pub use block_coordinator::BlockCoordinator;
pub use entities::*;
pub use errors::*;
pub use pool::{ClassifyResult, Mempool};
pub use registry::ValidatorRegistry;
pub use services::check_admission_floor;
