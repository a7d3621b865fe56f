use ceg_common::Wei;
use collectible_escrow_engine::{
    audit::AuditStatus,
    mirror_types::{BuyerInfo, OrderStatusType, ProductId},
    order_objects::{CheckoutRequest, NewCartLine, RatingRequest},
    AuditSource,
    ErrorKind,
};
use cucumber::{then, when};

use crate::cucumber::MarketWorld;

#[when(expr = "I add {int} of product {int} to the cart")]
async fn add_to_cart(world: &mut MarketWorld, quantity: u32, product_id: u64) {
    let line = NewCartLine::new(ProductId(product_id), quantity).expect("Invalid cart line");
    world.engine().cart.add_to_cart(line).await.expect("Error adding to cart");
}

#[when(expr = "buyer {word} checks out")]
async fn checkout(world: &mut MarketWorld, buyer: String) {
    let request = CheckoutRequest::new(buyer.as_str().into(), BuyerInfo::default()).expect("Invalid checkout");
    let result = world.engine().orders.checkout(request).await;
    match result {
        Ok(orders) => {
            world.last_orders = orders;
            world.last_error = None;
        },
        Err(e) => world.last_error = Some(e),
    }
}

#[when(expr = "seller {word} ships the latest order")]
async fn ship(world: &mut MarketWorld, seller: String) {
    let id = world.latest_order_id();
    let result = world.engine().orders.mark_shipped(id, &seller.as_str().into()).await;
    if let Err(e) = result {
        world.last_error = Some(e);
    }
}

#[when("the buyer confirms delivery of the latest order")]
async fn deliver(world: &mut MarketWorld) {
    let id = world.latest_order_id();
    world.engine().orders.mark_delivered(id).await.expect("Error marking delivery");
}

#[when(expr = "the buyer rates the latest order {int} stars with {string}")]
async fn rate(world: &mut MarketWorld, stars: i64, comment: String) {
    let id = world.latest_order_id();
    world.engine().orders.rate(RatingRequest::new(id, stars, comment)).await.expect("Error rating order");
}

#[when("the chain goes down")]
async fn chain_down(world: &mut MarketWorld) {
    world.chain().set_unavailable().await;
}

#[then(expr = "{int} order(s) was/were created")]
async fn orders_created(world: &mut MarketWorld, count: usize) {
    assert!(world.last_error.is_none(), "Unexpected error: {:?}", world.last_error);
    assert_eq!(world.last_orders.len(), count);
}

#[then(expr = "the latest order totals {word} ETH")]
async fn order_total(world: &mut MarketWorld, total: String) {
    let order = world.engine().orders.fetch_order(world.latest_order_id()).await.unwrap();
    assert_eq!(order.total_price(), Wei::from_eth_str(&total).unwrap());
}

#[then(expr = "the latest order is {word}")]
async fn order_status(world: &mut MarketWorld, status: String) {
    let expected = status.parse::<OrderStatusType>().expect("Not a valid status");
    let order = world.engine().orders.fetch_order(world.latest_order_id()).await.unwrap();
    assert_eq!(order.status, expected);
}

#[then("payment for the latest order is released")]
async fn payment_released(world: &mut MarketWorld) {
    let order = world.engine().orders.fetch_order(world.latest_order_id()).await.unwrap();
    assert!(order.payment_released);
    assert!(order.released_at.is_some());
}

#[then(expr = "product {int} averages {float} stars from {int} rating(s)")]
async fn product_rating(world: &mut MarketWorld, product_id: u64, average: f64, count: usize) {
    let summary = world.engine().stats.ratings_summary().await;
    let s = summary.get(&ProductId(product_id)).expect("Product has no summary");
    assert!((s.average - average).abs() < f64::EPSILON, "Average was {}", s.average);
    assert_eq!(s.count, count);
}

#[then(expr = "the best product is {int}")]
async fn best_product(world: &mut MarketWorld, product_id: u64) {
    let best = world.engine().stats.best_product().await.expect("No best product");
    assert_eq!(best.id, ProductId(product_id));
}

#[then(expr = "checkout was refused as {word}")]
async fn refused(world: &mut MarketWorld, kind: String) {
    let err = world.last_error.as_ref().expect("Checkout did not fail");
    let expected = match kind.as_str() {
        "authorization" => ErrorKind::Authorization,
        "validation" => ErrorKind::Validation,
        other => panic!("Unknown error kind {other}"),
    };
    assert_eq!(err.kind(), expected);
}

#[then(expr = "the cart holds {int} line(s)")]
async fn cart_lines(world: &mut MarketWorld, lines: usize) {
    assert_eq!(world.engine().cart.cart().await.lines.len(), lines);
}

#[then("the audit log is built from the mirror alone")]
async fn local_only_log(world: &mut MarketWorld) {
    let log = world.engine().audit_log(world.latest_order_id()).await.unwrap();
    assert_eq!(log.source, AuditSource::LocalOnly);
    assert_eq!(log.entries.first().map(|e| e.status), Some(AuditStatus::Placed));
}
