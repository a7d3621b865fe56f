use ceg_common::Wei;
use collectible_escrow_engine::mirror_types::Product;
use cucumber::given;

use crate::cucumber::{market_world::MarketSystem, MarketWorld};

#[given("a fresh marketplace")]
async fn fresh_marketplace(world: &mut MarketWorld) {
    world.system = Some(MarketSystem::new());
}

#[given(expr = "product {int} {string} is listed at {word} ETH by seller {word}")]
async fn list_product(world: &mut MarketWorld, id: u64, name: String, price: String, seller: String) {
    let price = Wei::from_eth_str(&price).expect("Not a valid ETH amount");
    let product = Product::new(id, name, price, seller.as_str().into());
    world.engine().cart.register_product(product).await.expect("Error listing product");
}
