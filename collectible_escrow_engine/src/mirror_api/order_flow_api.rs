use std::fmt::Debug;

use chrono::Utc;
use log::*;

use crate::{
    events::{EventProducers, OrderCreatedEvent, OrderDeliveredEvent, OrderRatedEvent, OrderShippedEvent},
    mirror_api::{
        order_objects::{CheckoutRequest, ProofUpload, RatingRequest},
        OrderFlowError,
    },
    mirror_types::{MarketRole, Order, OrderId, ProofKind, Rating, WalletAddress},
    order_store::{transitions, OrderStore, Transition},
};

/// `OrderFlowApi` drives orders through their lifecycle: checkout, shipment, delivery, proofs and rating.
///
/// Every mutation runs as a single guarded transition under the store's write lock. Lifecycle hooks are notified after
/// the lock has been released, and only when a transition actually changed something.
#[derive(Clone)]
pub struct OrderFlowApi {
    store: OrderStore,
    producers: EventProducers,
}

impl Debug for OrderFlowApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl OrderFlowApi {
    pub fn new(store: OrderStore, producers: EventProducers) -> Self {
        Self { store, producers }
    }

    pub fn store(&self) -> &OrderStore {
        &self.store
    }

    /// Converts the current cart into one order per line and empties the cart.
    ///
    /// Fails with [`OrderFlowError::EmptyCart`] or [`OrderFlowError::SelfTrade`], in which case nothing changes.
    pub async fn checkout(&self, request: CheckoutRequest) -> Result<Vec<Order>, OrderFlowError> {
        let CheckoutRequest { buyer_wallet, buyer_info, correlations } = request;
        let now = Utc::now();
        let orders = self
            .store
            .write(|state| transitions::checkout(state, &buyer_wallet, &buyer_info, correlations, now))
            .await?;
        info!("🛒️ Checkout by {buyer_wallet} created {} order(s)", orders.len());
        for producer in &self.producers.order_created_producer {
            for order in &orders {
                producer.publish_event(OrderCreatedEvent::new(order.clone())).await;
            }
        }
        Ok(orders)
    }

    /// Marks the order as shipped. Only the order's seller may do this. Repeat calls leave the order untouched.
    pub async fn mark_shipped(&self, order_id: OrderId, acting: &WalletAddress) -> Result<Order, OrderFlowError> {
        let now = Utc::now();
        let (order, transition) = self
            .store
            .write(|state| {
                let order = state.order_mut(order_id)?;
                let transition = transitions::mark_shipped(order, acting, now)?;
                Ok::<_, OrderFlowError>((order.clone(), transition))
            })
            .await?;
        if transition.is_applied() {
            info!("📦️ Order {order_id} shipped by {acting}");
            for producer in &self.producers.order_shipped_producer {
                producer.publish_event(OrderShippedEvent::new(order.clone())).await;
            }
        }
        Ok(order)
    }

    /// Marks a shipped order as delivered, which in the mirror also marks the payment as released.
    pub async fn mark_delivered(&self, order_id: OrderId) -> Result<Order, OrderFlowError> {
        let now = Utc::now();
        let (order, transition) = self
            .store
            .write(|state| {
                let order = state.order_mut(order_id)?;
                let transition = transitions::mark_delivered(order, now);
                Ok::<_, OrderFlowError>((order.clone(), transition))
            })
            .await?;
        if transition.is_applied() {
            info!("📦️ Order {order_id} delivered. Payment of {} marked as released.", order.total_price());
            for producer in &self.producers.order_delivered_producer {
                producer.publish_event(OrderDeliveredEvent::new(order.clone())).await;
            }
        }
        Ok(order)
    }

    pub async fn attach_proof(&self, upload: ProofUpload) -> Result<Order, OrderFlowError> {
        let now = Utc::now();
        let ProofUpload { order_id, acting_wallet, kind, path, content_type } = upload;
        let order = self
            .store
            .write(|state| {
                let order = state.order_mut(order_id)?;
                transitions::attach_proof(order, kind, &acting_wallet, &path, &content_type, now)?;
                Ok::<_, OrderFlowError>(order.clone())
            })
            .await?;
        info!("📦️ {kind} attached to order {order_id}");
        Ok(order)
    }

    pub async fn attach_shipment_proof(
        &self,
        order_id: OrderId,
        seller: WalletAddress,
        path: &str,
        content_type: &str,
    ) -> Result<Order, OrderFlowError> {
        self.attach_proof(ProofUpload::new(order_id, seller, ProofKind::Shipment, path, content_type)?).await
    }

    pub async fn attach_delivery_proof(
        &self,
        order_id: OrderId,
        buyer: WalletAddress,
        path: &str,
        content_type: &str,
    ) -> Result<Order, OrderFlowError> {
        self.attach_proof(ProofUpload::new(order_id, buyer, ProofKind::Delivery, path, content_type)?).await
    }

    /// Stores the buyer's one and only rating for a delivered order.
    pub async fn rate(&self, request: RatingRequest) -> Result<Rating, OrderFlowError> {
        let now = Utc::now();
        let RatingRequest { order_id, stars, comment } = request;
        let (order, rating) = self
            .store
            .write(|state| {
                let order = state.order_mut(order_id)?;
                let rating = transitions::rate(order, stars, &comment, now)?;
                let order = order.clone();
                state.ratings.push(rating.clone());
                Ok::<_, OrderFlowError>((order, rating))
            })
            .await?;
        info!("📦️ Order {order_id} rated {} star(s)", rating.stars);
        for producer in &self.producers.order_rated_producer {
            producer.publish_event(OrderRatedEvent::new(order.clone(), rating.clone())).await;
        }
        Ok(rating)
    }

    pub async fn review_start(&self, order_id: OrderId) -> Result<Order, OrderFlowError> {
        self.apply(order_id, transitions::review_start).await
    }

    pub async fn review_skip(&self, order_id: OrderId) -> Result<Order, OrderFlowError> {
        self.apply(order_id, transitions::review_skip).await
    }

    /// Records the escrow order created on-chain for this mirror order.
    pub async fn record_escrow_correlation(
        &self,
        order_id: OrderId,
        escrow_order_id: u64,
        tx_hash: &str,
    ) -> Result<Order, OrderFlowError> {
        let order = self
            .store
            .write(|state| {
                let order = state.order_mut(order_id)?;
                transitions::record_escrow(order, escrow_order_id, tx_hash)?;
                Ok::<_, OrderFlowError>(order.clone())
            })
            .await?;
        debug!("📦️ Order {order_id} is escrow order {escrow_order_id} on-chain");
        Ok(order)
    }

    /// Records the on-chain notarization of the order, which unlocks proof uploads.
    pub async fn record_notarization(
        &self,
        order_id: OrderId,
        order_hash: &str,
        tx_hash: &str,
    ) -> Result<Order, OrderFlowError> {
        let order = self
            .store
            .write(|state| {
                let order = state.order_mut(order_id)?;
                transitions::record_notarization(order, order_hash, tx_hash)?;
                Ok::<_, OrderFlowError>(order.clone())
            })
            .await?;
        debug!("📦️ Order {order_id} notarized as {order_hash}");
        Ok(order)
    }

    pub async fn fetch_order(&self, order_id: OrderId) -> Result<Order, OrderFlowError> {
        self.store.read(|state| state.order(order_id).cloned()).await
    }

    pub async fn orders_for_buyer(&self, buyer: &WalletAddress) -> Vec<Order> {
        self.store.read(|state| state.orders_for(buyer, MarketRole::Buyer)).await
    }

    pub async fn orders_for_seller(&self, seller: &WalletAddress) -> Vec<Order> {
        self.store.read(|state| state.orders_for(seller, MarketRole::Seller)).await
    }

    pub async fn latest_order_for(&self, wallet: &WalletAddress, role: MarketRole) -> Option<Order> {
        self.store.read(|state| state.latest_order_for(wallet, role)).await
    }

    pub async fn rating_for_order(&self, order_id: OrderId) -> Option<Rating> {
        self.store.read(|state| state.rating_for(order_id).cloned()).await
    }

    async fn apply<F>(&self, order_id: OrderId, f: F) -> Result<Order, OrderFlowError>
    where F: FnOnce(&mut Order) -> Transition {
        self.store
            .write(|state| {
                let order = state.order_mut(order_id)?;
                if !f(order).is_applied() {
                    trace!("📦️ Order {order_id} is {}. Review flags unchanged.", order.status);
                }
                Ok::<_, OrderFlowError>(order.clone())
            })
            .await
    }
}
