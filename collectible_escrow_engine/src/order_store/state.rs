use std::{collections::BTreeMap, sync::Arc};

use tokio::sync::RwLock;

use crate::{
    mirror_api::OrderFlowError,
    mirror_types::{Cart, MarketRole, Order, OrderId, Product, ProductId, Rating, WalletAddress},
};

#[derive(Debug, Default, Clone)]
pub struct MirrorState {
    /// Listing order is significant: it breaks ties when picking the best rated product.
    pub products: Vec<Product>,
    pub cart: Cart,
    pub orders: BTreeMap<OrderId, Order>,
    pub ratings: Vec<Rating>,
    last_order_id: i64,
}

impl MirrorState {
    pub fn with_catalog(products: Vec<Product>) -> Self {
        Self { products, ..Default::default() }
    }

    /// Hands out the next order id. Ids are shared by every checkout and never reused, even if a checkout fails later.
    pub(crate) fn allocate_order_id(&mut self) -> OrderId {
        self.last_order_id += 1;
        OrderId(self.last_order_id)
    }

    pub fn product(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn order(&self, id: OrderId) -> Result<&Order, OrderFlowError> {
        self.orders.get(&id).ok_or(OrderFlowError::OrderNotFound(id))
    }

    pub fn order_mut(&mut self, id: OrderId) -> Result<&mut Order, OrderFlowError> {
        self.orders.get_mut(&id).ok_or(OrderFlowError::OrderNotFound(id))
    }

    pub fn orders_for(&self, wallet: &WalletAddress, role: MarketRole) -> Vec<Order> {
        self.orders
            .values()
            .filter(|o| match role {
                MarketRole::Buyer => &o.buyer_wallet == wallet,
                MarketRole::Seller => &o.seller_wallet == wallet,
            })
            .cloned()
            .collect()
    }

    /// The most recently created order in which `wallet` plays `role`.
    pub fn latest_order_for(&self, wallet: &WalletAddress, role: MarketRole) -> Option<Order> {
        self.orders
            .values()
            .rev()
            .find(|o| match role {
                MarketRole::Buyer => &o.buyer_wallet == wallet,
                MarketRole::Seller => &o.seller_wallet == wallet,
            })
            .cloned()
    }

    pub fn rating_for(&self, order_id: OrderId) -> Option<&Rating> {
        self.ratings.iter().find(|r| r.order_id == order_id)
    }
}

/// Shared handle to the mirror. Cloning is cheap and every clone sees the same state.
///
/// Mutations take the write lock for their whole duration, so transitions are serialized across all orders. Nothing
/// inside the lock performs I/O.
#[derive(Debug, Clone, Default)]
pub struct OrderStore {
    state: Arc<RwLock<MirrorState>>,
}

impl OrderStore {
    pub fn new(state: MirrorState) -> Self {
        Self { state: Arc::new(RwLock::new(state)) }
    }

    pub async fn read<R, F>(&self, f: F) -> R
    where F: FnOnce(&MirrorState) -> R {
        let guard = self.state.read().await;
        f(&guard)
    }

    pub async fn write<R, F>(&self, f: F) -> R
    where F: FnOnce(&mut MirrorState) -> R {
        let mut guard = self.state.write().await;
        f(&mut guard)
    }

    /// A point-in-time copy of the whole mirror, for pure read views.
    pub async fn snapshot(&self) -> MirrorState {
        self.read(MirrorState::clone).await
    }
}
