//! # Adapters Layer
//!
//! Implementations of the outbound ports against real transports.
//!
//! - `gossip`: publishes newly-`Passed` local transactions onto the shared
//!   event bus for peer gossip to pick up.

pub mod gossip;

pub use gossip::BusGossipHandle;
