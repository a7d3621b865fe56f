//! # Marketplace mirror public API
//!
//! The `mirror_api` module exposes the programmatic API over the local order mirror. Each API is a thin, cloneable
//! handle onto the same [`OrderStore`](crate::order_store::OrderStore), so callers take only the pieces they need.
//!
//! * [`CartApi`] manages the product catalog and the shared cart.
//! * [`OrderFlowApi`] drives orders through their lifecycle: checkout, shipment, delivery, proofs, ratings and chain
//!   correlation. It publishes lifecycle events when a transition takes effect.
//! * [`StatsApi`] answers the derived questions: rating summaries, the best rated product and average shipping time.
//! * [`LinkApi`] mints and verifies the signed pay and track links.
//!
//! Audit logs live in [`crate::audit`], since they also need a [`ChainOracle`](crate::chain::ChainOracle).
//!
//! # API usage
//!
//! ```rust,ignore
//! use collectible_escrow_engine::{CartApi, OrderFlowApi, order_store::OrderStore};
//! let store = OrderStore::default();
//! let cart = CartApi::new(store.clone());
//! cart.add_to_cart(NewCartLine::new(ProductId(3), 2)?).await?;
//! let flow = OrderFlowApi::new(store, producers);
//! let orders = flow.checkout(CheckoutRequest::new(buyer, info)?).await?;
//! ```
mod cart_api;
pub mod errors;
mod link_api;
mod order_flow_api;
pub mod order_objects;
mod stats_api;

pub use cart_api::CartApi;
pub use errors::{ErrorKind, OrderFlowError};
pub use link_api::{LinkApi, OrderLink};
pub use order_flow_api::OrderFlowApi;
pub use stats_api::StatsApi;
