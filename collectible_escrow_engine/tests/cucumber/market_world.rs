use collectible_escrow_engine::{
    events::EventHooks,
    mirror_types::{Order, OrderId},
    EngineConfig,
    InMemoryChain,
    MarketEngine,
    OrderFlowError,
};
use cucumber::World;
use log::*;

#[derive(Default, Debug, World)]
pub struct MarketWorld {
    pub system: Option<MarketSystem>,
    pub last_orders: Vec<Order>,
    pub last_error: Option<OrderFlowError>,
}

#[derive(Debug)]
pub struct MarketSystem {
    pub engine: MarketEngine<InMemoryChain>,
    pub chain: InMemoryChain,
}

impl MarketWorld {
    pub fn engine(&self) -> &MarketEngine<InMemoryChain> {
        &self.system.as_ref().expect("Marketplace not initialised").engine
    }

    pub fn chain(&self) -> &InMemoryChain {
        &self.system.as_ref().expect("Marketplace not initialised").chain
    }

    pub fn latest_order_id(&self) -> OrderId {
        self.last_orders.last().map(|o| o.id).expect("No order has been placed")
    }
}

impl MarketSystem {
    pub fn new() -> Self {
        let chain = InMemoryChain::new();
        let config = EngineConfig::new("cucumber-secret");
        let engine = MarketEngine::new(&config, chain.clone(), Vec::new(), EventHooks::default())
            .expect("Error creating market engine");
        debug!("🚀️ Created a fresh marketplace");
        Self { engine, chain }
    }
}
