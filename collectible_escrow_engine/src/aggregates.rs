//! Derived statistics over the mirror. Everything here is a pure function of its inputs.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    helpers::format_scaled_duration,
    mirror_types::{Order, Product, ProductId, Rating},
};

/// Default multiplier applied to elapsed shipping time before it is displayed.
pub const DEFAULT_SHIP_TIME_SCALE: u32 = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    pub average: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipTimeSummary {
    /// Mean of `shipped_at - created_at` in milliseconds, or `None` when no order qualifies.
    pub average_ms: Option<f64>,
    pub samples: usize,
    pub display: String,
}

pub fn ratings_summary(products: &[Product], ratings: &[Rating]) -> BTreeMap<ProductId, RatingSummary> {
    products
        .iter()
        .map(|p| {
            let stars = ratings.iter().filter(|r| r.product_id == p.id).map(|r| f64::from(r.stars)).collect::<Vec<_>>();
            let count = stars.len();
            let average = if count == 0 { 0.0 } else { stars.iter().sum::<f64>() / count as f64 };
            (p.id, RatingSummary { average, count })
        })
        .collect()
}

/// The product with the strictly highest average rating. Earlier products win ties, and unrated products never
/// qualify.
pub fn best_product<'a>(
    products: &'a [Product],
    summary: &BTreeMap<ProductId, RatingSummary>,
) -> Option<&'a Product> {
    let mut best: Option<(&Product, f64)> = None;
    for product in products {
        let Some(s) = summary.get(&product.id).filter(|s| s.count > 0) else {
            continue;
        };
        match best {
            Some((_, avg)) if s.average <= avg => {},
            _ => best = Some((product, s.average)),
        }
    }
    best.map(|(p, _)| p)
}

/// Average time from checkout to shipment per product.
///
/// Orders that have not shipped are skipped, as are orders whose shipment predates their creation; those are bad data,
/// not zero-length shipments. `scale` only affects `display`.
pub fn avg_ship_time<'a, I>(products: &[Product], orders: I, scale: u32) -> BTreeMap<ProductId, ShipTimeSummary>
where I: IntoIterator<Item = &'a Order> {
    let mut deltas: BTreeMap<ProductId, Vec<f64>> = BTreeMap::new();
    for order in orders {
        let Some(shipped_at) = order.shipped_at else {
            continue;
        };
        let delta = (shipped_at - order.created_at).num_milliseconds();
        if delta < 0 {
            continue;
        }
        deltas.entry(order.product_id).or_default().push(delta as f64);
    }
    products
        .iter()
        .map(|p| {
            let samples = deltas.get(&p.id).map(Vec::as_slice).unwrap_or_default();
            let average_ms =
                (!samples.is_empty()).then(|| samples.iter().sum::<f64>() / samples.len() as f64);
            let display = format_scaled_duration(average_ms, scale);
            (p.id, ShipTimeSummary { average_ms, samples: samples.len(), display })
        })
        .collect()
}
