//! Collectible Escrow Engine
//!
//! The engine keeps a fast local mirror of a collectibles marketplace (products, a cart, orders and ratings) alongside
//! an escrow smart contract that holds buyer funds. The mirror is authoritative for everything the storefront shows
//! immediately; the contract is authoritative for money and for the on-chain shipment and delivery record.
//!
//! The library is divided into these sections:
//! 1. The order mirror ([`mod@order_store`]). A single in-memory [`MirrorState`](order_store::MirrorState) behind a
//!    read-write lock, plus the pure state machine in [`order_store::transitions`].
//! 2. The public API ([`mod@mirror_api`]). Cart, order flow, statistics and link APIs, each a cheap handle onto the
//!    shared store.
//! 3. The chain side ([`mod@chain`] and [`mod@audit`]). [`ChainOracle`] abstracts the escrow contract, and the
//!    [`Reconciler`] merges its event log with the mirror into one audit timeline, falling back to the mirror alone
//!    when the chain misbehaves.
//! 4. Signed pay and track links ([`mod@tokens`]) and wallet-based access control ([`mod@access_control`]).
//!
//! The engine also emits lifecycle events (order created, shipped, delivered and rated) that you can hook into via
//! [`events::EventHooks`]. [`MarketEngine`] wires all of the above together from an [`EngineConfig`].
pub mod access_control;
pub mod aggregates;
pub mod audit;
pub mod chain;
mod config;
mod engine;
pub mod events;
pub mod helpers;
pub mod mirror_api;
pub mod mirror_types;
pub mod order_store;
pub mod tokens;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use audit::{AuditLog, AuditLogEntry, AuditSource, Reconciler};
pub use chain::{ChainError, ChainOracle, InMemoryChain};
pub use config::{ConfigError, EngineConfig};
pub use engine::{EngineError, MarketEngine};
pub use mirror_api::{
    order_objects,
    CartApi,
    ErrorKind,
    LinkApi,
    OrderFlowApi,
    OrderFlowError,
    OrderLink,
    StatsApi,
};
