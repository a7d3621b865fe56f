use ceg_common::Wei;
use collectible_escrow_engine::{
    events::EventHooks,
    mirror_types::{BuyerInfo, Product},
    order_objects::CheckoutRequest,
    EngineConfig,
    InMemoryChain,
    MarketEngine,
};

pub const SELLER: &str = "0xAAA";
pub const BUYER: &str = "0xBBB";

pub fn prepare_test_env() {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
}

pub fn catalog() -> Vec<Product> {
    vec![
        Product::new(1, "Neon Ronin", Wei::from_eth_str("0.25").unwrap(), SELLER.into()).with_category("Figures"),
        Product::new(3, "Orbit Ghost Mech", Wei::from_eth_str("0.5").unwrap(), SELLER.into())
            .with_category("New Drop")
            .with_seller_name("RetroCove"),
        Product::new(7, "Pocket Kaiju", Wei::from_eth(1), "0xCCC".into()),
    ]
}

pub fn engine(hooks: EventHooks) -> (MarketEngine<InMemoryChain>, InMemoryChain) {
    prepare_test_env();
    let chain = InMemoryChain::new();
    let config = EngineConfig::new("integration-test-secret");
    let engine = MarketEngine::new(&config, chain.clone(), catalog(), hooks).expect("Error creating engine");
    (engine, chain)
}

pub fn checkout_request(buyer: &str) -> CheckoutRequest {
    let info = BuyerInfo {
        name: "Bea Buyer".into(),
        email: "bea@example.com".into(),
        phone: "555-0100".into(),
        shipping_address: "1 Dock Road".into(),
    };
    CheckoutRequest::new(buyer.into(), info).expect("Invalid checkout request")
}
