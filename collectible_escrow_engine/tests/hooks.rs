use std::sync::{
    atomic::{AtomicI32, Ordering},
    Arc,
};

use collectible_escrow_engine::{
    events::EventHooks,
    mirror_types::{OrderId, ProductId},
    order_objects::{NewCartLine, RatingRequest},
};
use log::*;
use tokio::runtime::Runtime;

use crate::support::{checkout_request, engine, BUYER, SELLER};

mod support;

#[derive(Default, Clone)]
struct HookCalled {
    called: Arc<AtomicI32>,
}

impl HookCalled {
    pub fn called(&self) {
        let _ = self.called.fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> i32 {
        self.called.load(Ordering::Relaxed)
    }
}

async fn wait_for(event: &HookCalled, expected: i32) {
    for _ in 0..100 {
        if event.count() >= expected {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
}

#[test]
fn on_order_created() {
    let rt = Runtime::new().unwrap();
    let event = HookCalled::default();
    let event_copy = event.clone();
    let waiter = event.clone();
    rt.block_on(async move {
        let mut hooks = EventHooks::default();
        hooks.on_order_created(move |ev| {
            info!("🪝️ {}", ev.order.id);
            event_copy.called();
            Box::pin(async {})
        });
        let (engine, _chain) = engine(hooks);
        engine.cart.add_to_cart(NewCartLine::new(ProductId(1), 1).unwrap()).await.unwrap();
        engine.cart.add_to_cart(NewCartLine::new(ProductId(3), 2).unwrap()).await.unwrap();
        let orders = engine.orders.checkout(checkout_request(BUYER)).await.expect("Error checking out");
        assert_eq!(orders.len(), 2);
        // An empty cart creates nothing
        assert!(engine.orders.checkout(checkout_request(BUYER)).await.is_err());
        wait_for(&waiter, 2).await;
    });
    assert_eq!(event.count(), 2);
    info!("🪝️ test complete");
}

#[test]
fn shipped_and_rated_fire_once() {
    let rt = Runtime::new().unwrap();
    let shipped = HookCalled::default();
    let rated = HookCalled::default();
    let (shipped_copy, rated_copy) = (shipped.clone(), rated.clone());
    let (shipped_waiter, rated_waiter) = (shipped.clone(), rated.clone());
    rt.block_on(async move {
        let mut hooks = EventHooks::default();
        hooks
            .on_order_shipped(move |_| {
                shipped_copy.called();
                Box::pin(async {})
            })
            .on_order_rated(move |ev| {
                assert_eq!(ev.rating.stars, 5);
                rated_copy.called();
                Box::pin(async {})
            });
        let (engine, _chain) = engine(hooks);
        engine.cart.add_to_cart(NewCartLine::new(ProductId(3), 2).unwrap()).await.unwrap();
        let order = engine.orders.checkout(checkout_request(BUYER)).await.unwrap().remove(0);
        engine.orders.mark_shipped(order.id, &SELLER.into()).await.unwrap();
        // A second ship is a no-op and must not notify again
        engine.orders.mark_shipped(order.id, &SELLER.into()).await.unwrap();
        engine.orders.mark_delivered(order.id).await.unwrap();
        engine.orders.rate(RatingRequest::new(order.id, 9, "great")).await.unwrap();
        assert!(engine.orders.rate(RatingRequest::new(order.id, 1, "again")).await.is_err());
        assert!(engine.orders.mark_shipped(OrderId(99), &SELLER.into()).await.is_err());
        wait_for(&shipped_waiter, 1).await;
        wait_for(&rated_waiter, 1).await;
    });
    assert_eq!(shipped.count(), 1);
    assert_eq!(rated.count(), 1);
}
