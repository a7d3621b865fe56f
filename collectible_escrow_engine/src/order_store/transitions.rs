//! Guarded lifecycle transitions.
//!
//! Every function here operates on already-borrowed mirror state and never blocks. The [`super::OrderStore`] holds the
//! write lock while they run, so no caller can observe a half-applied transition.
//!
//! Calling a transition whose status precondition does not hold is a no-op ([`Transition::NoOp`]) rather than an
//! error, except where the transition guards a one-time action (rating, proof upload) or an access rule.
use chrono::{DateTime, Utc};
use log::*;

use crate::{
    access_control::{find_self_trade, require_buyer, require_seller},
    helpers::not_before,
    mirror_api::OrderFlowError,
    mirror_types::{
        BuyerInfo,
        ChainCorrelation,
        Order,
        OrderStatusType,
        ProofKind,
        Rating,
        WalletAddress,
    },
    order_store::MirrorState,
};

/// Content types accepted for shipment and delivery proofs.
pub const ACCEPTED_PROOF_TYPES: [&str; 5] = ["image/jpeg", "image/png", "image/gif", "image/webp", "application/pdf"];

pub const MIN_STARS: u8 = 1;
pub const MAX_STARS: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    NoOp,
}

impl Transition {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

pub fn is_accepted_proof_type(mime: &str) -> bool {
    let mime = mime.split(';').next().unwrap_or_default().trim();
    ACCEPTED_PROOF_TYPES.iter().any(|t| t.eq_ignore_ascii_case(mime))
}

pub fn clamp_stars(stars: i64) -> u8 {
    // Safe cast: the value is clamped into u8 range first
    stars.clamp(i64::from(MIN_STARS), i64::from(MAX_STARS)) as u8
}

/// Turns the cart into orders, one per line, and clears it.
///
/// `correlations` are matched to cart lines by position. Missing entries leave the order uncorrelated; extra entries
/// are ignored. Nothing is allocated if the cart is empty or any line would be a self-trade.
pub fn checkout(
    state: &mut MirrorState,
    buyer: &WalletAddress,
    buyer_info: &BuyerInfo,
    correlations: Vec<ChainCorrelation>,
    now: DateTime<Utc>,
) -> Result<Vec<Order>, OrderFlowError> {
    if state.cart.is_empty() {
        return Err(OrderFlowError::EmptyCart);
    }
    if let Some(line) = find_self_trade(buyer, &state.cart) {
        warn!("🛒️ Wallet {buyer} tried to buy its own listing {}", line.product_id);
        return Err(OrderFlowError::SelfTrade { buyer: buyer.clone(), product_id: line.product_id });
    }
    let lines = std::mem::take(&mut state.cart.lines);
    let mut correlations = correlations.into_iter();
    let mut created = Vec::with_capacity(lines.len());
    for line in lines {
        let id = state.allocate_order_id();
        let order = Order {
            id,
            product_id: line.product_id,
            product_name: line.product_name,
            quantity: line.quantity,
            unit_price: line.unit_price,
            buyer_wallet: buyer.clone(),
            seller_wallet: line.seller_wallet,
            status: OrderStatusType::AwaitingShipment,
            buyer_info: buyer_info.clone(),
            correlation: correlations.next().unwrap_or_default(),
            created_at: now,
            shipped_at: None,
            delivered_at: None,
            released_at: None,
            shipment_proof_at: None,
            delivery_proof_at: None,
            shipment_proof: None,
            delivery_proof: None,
            payment_released: false,
            rated: false,
            review_open: false,
            review_skipped: false,
        };
        debug!("📦️ Order {id} created for {} x {} by {buyer}", order.quantity, order.product_name);
        state.orders.insert(id, order.clone());
        created.push(order);
    }
    Ok(created)
}

pub fn mark_shipped(
    order: &mut Order,
    acting: &WalletAddress,
    now: DateTime<Utc>,
) -> Result<Transition, OrderFlowError> {
    require_seller(order, acting)?;
    if order.status != OrderStatusType::AwaitingShipment {
        trace!("📦️ Order {} is {}. Ignoring ship request.", order.id, order.status);
        return Ok(Transition::NoOp);
    }
    order.status = OrderStatusType::Shipped;
    order.shipped_at = Some(not_before(now, Some(order.created_at)));
    Ok(Transition::Applied)
}

/// Marks a shipped order as delivered.
///
/// The mirror assumes delivery confirmation pays the seller out, so `payment_released` and `released_at` are set in
/// the same step. The actual release is a separate on-chain call that this does not verify.
pub fn mark_delivered(order: &mut Order, now: DateTime<Utc>) -> Transition {
    if order.status != OrderStatusType::Shipped {
        trace!("📦️ Order {} is {}. Ignoring delivery.", order.id, order.status);
        return Transition::NoOp;
    }
    let delivered_at = not_before(now, order.shipped_at);
    order.status = OrderStatusType::Delivered;
    order.delivered_at = Some(delivered_at);
    order.payment_released = true;
    order.released_at = Some(delivered_at);
    Transition::Applied
}

/// Stores a proof reference on the order. Shipment proofs come from the seller, delivery proofs from the buyer.
pub fn attach_proof(
    order: &mut Order,
    kind: ProofKind,
    acting: &WalletAddress,
    path: &str,
    mime: &str,
    now: DateTime<Utc>,
) -> Result<(), OrderFlowError> {
    match kind {
        ProofKind::Shipment => require_seller(order, acting)?,
        ProofKind::Delivery => require_buyer(order, acting)?,
    }
    if !status_reached(order.status, kind.required_status()) {
        let reason = format!("A {kind} needs the order to be {} first.", kind.required_status().label());
        return Err(OrderFlowError::invalid_state(order.id, order.status, reason));
    }
    if !order.correlation.is_notarized() {
        return Err(OrderFlowError::invalid_state(order.id, order.status, "The order has not been notarized yet."));
    }
    if order.proof(kind).is_some() {
        return Err(OrderFlowError::AlreadyExists(order.id, kind));
    }
    if !is_accepted_proof_type(mime) {
        return Err(OrderFlowError::InvalidFile(mime.to_string()));
    }
    let path = path.trim();
    if path.is_empty() {
        return Err(OrderFlowError::InvalidInput("The proof file path is empty.".into()));
    }
    match kind {
        ProofKind::Shipment => {
            order.shipment_proof = Some(path.to_string());
            order.shipment_proof_at = Some(not_before(now, order.shipped_at));
        },
        ProofKind::Delivery => {
            order.delivery_proof = Some(path.to_string());
            order.delivery_proof_at = Some(not_before(now, order.delivered_at));
        },
    }
    debug!("📦️ {kind} stored for order {}", order.id);
    Ok(())
}

/// Records the buyer's rating for a delivered order. Only one rating per order is ever accepted.
pub fn rate(
    order: &mut Order,
    stars: i64,
    comment: &str,
    now: DateTime<Utc>,
) -> Result<Rating, OrderFlowError> {
    if order.status != OrderStatusType::Delivered {
        return Err(OrderFlowError::invalid_state(order.id, order.status, "Only delivered orders can be rated."));
    }
    if order.rated {
        return Err(OrderFlowError::invalid_state(order.id, order.status, "The order has already been rated."));
    }
    let rating = Rating {
        product_id: order.product_id,
        order_id: order.id,
        stars: clamp_stars(stars),
        comment: comment.trim().to_string(),
        created_at: not_before(now, order.delivered_at),
    };
    order.rated = true;
    order.review_open = false;
    Ok(rating)
}

pub fn review_start(order: &mut Order) -> Transition {
    if !order.is_awaiting_rating() {
        return Transition::NoOp;
    }
    order.review_open = true;
    Transition::Applied
}

pub fn review_skip(order: &mut Order) -> Transition {
    if !order.is_awaiting_rating() {
        return Transition::NoOp;
    }
    order.review_skipped = true;
    order.review_open = false;
    Transition::Applied
}

/// Records on-chain escrow details. Recording the same values again is a no-op, but a different value for an
/// already-populated field is rejected and leaves the order untouched.
pub fn record_escrow(
    order: &mut Order,
    escrow_order_id: u64,
    tx_hash: &str,
) -> Result<Transition, OrderFlowError> {
    let tx_hash = tx_hash.trim().to_string();
    let c = &order.correlation;
    let id_new = is_unset(&c.escrow_order_id, &escrow_order_id, order.id, "escrow order id")?;
    let tx_new = is_unset(&c.escrow_tx_hash, &tx_hash, order.id, "escrow transaction")?;
    let c = &mut order.correlation;
    if id_new {
        c.escrow_order_id = Some(escrow_order_id);
    }
    if tx_new {
        c.escrow_tx_hash = Some(tx_hash);
    }
    Ok(if id_new || tx_new { Transition::Applied } else { Transition::NoOp })
}

pub fn record_notarization(
    order: &mut Order,
    order_hash: &str,
    tx_hash: &str,
) -> Result<Transition, OrderFlowError> {
    let order_hash = order_hash.trim().to_string();
    if order_hash.is_empty() {
        return Err(OrderFlowError::InvalidInput("The order hash is empty.".into()));
    }
    let tx_hash = tx_hash.trim().to_string();
    let c = &order.correlation;
    let hash_new = is_unset(&c.order_hash, &order_hash, order.id, "order hash")?;
    let tx_new = is_unset(&c.notarize_tx_hash, &tx_hash, order.id, "notarization transaction")?;
    let c = &mut order.correlation;
    if hash_new {
        c.order_hash = Some(order_hash);
    }
    if tx_new {
        c.notarize_tx_hash = Some(tx_hash);
    }
    Ok(if hash_new || tx_new { Transition::Applied } else { Transition::NoOp })
}

/// `Ok(true)` if the slot is empty, `Ok(false)` if it already holds `value`, and a conflict otherwise.
fn is_unset<T: PartialEq>(
    slot: &Option<T>,
    value: &T,
    order_id: crate::mirror_types::OrderId,
    field: &'static str,
) -> Result<bool, OrderFlowError> {
    match slot {
        None => Ok(true),
        Some(existing) if existing == value => Ok(false),
        Some(_) => Err(OrderFlowError::CorrelationConflict { order_id, field }),
    }
}

fn status_reached(current: OrderStatusType, required: OrderStatusType) -> bool {
    fn rank(s: OrderStatusType) -> u8 {
        match s {
            OrderStatusType::AwaitingShipment => 0,
            OrderStatusType::Shipped => 1,
            OrderStatusType::Delivered => 2,
        }
    }
    rank(current) >= rank(required)
}
