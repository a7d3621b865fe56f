use std::{collections::BTreeSet, time::Duration};

use collectible_escrow_engine::{
    events::EventHooks,
    mirror_types::{OrderStatusType, ProductId},
    order_objects::NewCartLine,
};
use log::*;
use tokio::{runtime::Runtime, task::JoinSet};

use crate::support::{checkout_request, engine, SELLER};

mod support;

const NUM_BUYERS: u64 = 20;
const RATE: u64 = 200; // checkouts per second

#[test]
fn burst_checkouts_and_shipments() {
    info!("🚀️ Starting checkout burst test");
    let sys = Runtime::new().unwrap();
    let delay = Duration::from_millis(1000 / RATE);

    sys.block_on(async move {
        let (engine, _chain) = engine(EventHooks::default());
        let mut timer = tokio::time::interval(delay);
        let mut ids = BTreeSet::new();
        // The cart is shared, so checkouts go one after another; shipments then race each other
        for i in 0..NUM_BUYERS {
            timer.tick().await;
            engine.cart.add_to_cart(NewCartLine::new(ProductId(3), 1).unwrap()).await.unwrap();
            let buyer = format!("0xB{i:03}");
            let orders = engine.orders.checkout(checkout_request(&buyer)).await.unwrap_or_else(|e| {
                panic!("Error checking out for {buyer}: {e}");
            });
            ids.extend(orders.iter().map(|o| o.id));
        }
        assert_eq!(ids.len() as u64, NUM_BUYERS);

        let mut jobs = JoinSet::new();
        for id in ids.iter().copied() {
            for _ in 0..3 {
                let api = engine.orders.clone();
                jobs.spawn(async move { api.mark_shipped(id, &SELLER.into()).await });
            }
        }
        while let Some(res) = jobs.join_next().await {
            let order = res.unwrap().expect("Shipping failed");
            assert_eq!(order.status, OrderStatusType::Shipped);
        }
        let shipped = engine.orders.orders_for_seller(&SELLER.into()).await;
        assert_eq!(shipped.len() as u64, NUM_BUYERS);
        assert!(shipped.iter().all(|o| o.shipped_at.is_some_and(|t| t >= o.created_at)));
        let summary = engine.stats.avg_ship_time().await;
        assert_eq!(summary[&ProductId(3)].samples as u64, NUM_BUYERS);
    });
    info!("🚀️ test complete");
}
