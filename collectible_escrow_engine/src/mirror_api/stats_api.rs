use std::collections::BTreeMap;

use log::*;

use crate::{
    aggregates::{avg_ship_time, best_product, ratings_summary, RatingSummary, ShipTimeSummary},
    mirror_types::{Product, ProductId},
    order_store::OrderStore,
};

/// Read-only statistics over the mirror. Each call works from a consistent snapshot taken under the read lock.
#[derive(Debug, Clone)]
pub struct StatsApi {
    store: OrderStore,
    ship_time_scale: u32,
}

impl StatsApi {
    pub fn new(store: OrderStore, ship_time_scale: u32) -> Self {
        Self { store, ship_time_scale }
    }

    pub async fn ratings_summary(&self) -> BTreeMap<ProductId, RatingSummary> {
        self.store.read(|state| ratings_summary(&state.products, &state.ratings)).await
    }

    pub async fn best_product(&self) -> Option<Product> {
        let best = self
            .store
            .read(|state| {
                let summary = ratings_summary(&state.products, &state.ratings);
                best_product(&state.products, &summary).cloned()
            })
            .await;
        if let Some(p) = &best {
            trace!("📊️ Best rated product is {} ({})", p.id, p.name);
        }
        best
    }

    pub async fn avg_ship_time(&self) -> BTreeMap<ProductId, ShipTimeSummary> {
        let scale = self.ship_time_scale;
        self.store.read(|state| avg_ship_time(&state.products, state.orders.values(), scale)).await
    }
}
