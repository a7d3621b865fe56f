//! The mirror's single ownership boundary.
//!
//! All catalog, cart, order and rating data lives in one [`MirrorState`] behind the [`OrderStore`] lock. Lifecycle
//! rules live in [`transitions`] as plain functions over that state so they can be tested without a runtime.
mod state;
pub mod transitions;

pub use state::{MirrorState, OrderStore};
pub use transitions::{Transition, ACCEPTED_PROOF_TYPES};
