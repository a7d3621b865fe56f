use log::*;

use crate::{
    chain::InMemoryChain,
    config::EngineConfig,
    events::EventHooks,
    mirror_types::Product,
    MarketEngine,
};

pub const TEST_TOKEN_SECRET: &str = "collectible-escrow-test-secret";

pub fn prepare_test_env() {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
}

pub fn test_config() -> EngineConfig {
    EngineConfig::from_env().unwrap_or_else(|_| EngineConfig::new(TEST_TOKEN_SECRET))
}

/// An engine over a fresh in-memory chain. The chain handle shares state with the engine's, so tests can inject
/// faults or move the clock through it.
pub fn test_engine(catalog: Vec<Product>, hooks: EventHooks) -> (MarketEngine<InMemoryChain>, InMemoryChain) {
    prepare_test_env();
    let chain = InMemoryChain::new();
    let engine = MarketEngine::new(&test_config(), chain.clone(), catalog, hooks).expect("Error creating test engine");
    (engine, chain)
}
