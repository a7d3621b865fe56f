//! Order lifecycle events.
//!
//! Register hooks in [`EventHooks`], turn them into [`EventHandlers`], hand the [`EventProducers`] to the order flow
//! API and start the handlers. Hooks see the event only, never the mirror itself.
mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::*;
pub use hooks::{EventHandlers, EventHooks, EventProducers, HookFuture};
