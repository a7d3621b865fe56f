use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    chain::{ChainEvent, ChainEventKind},
    helpers::format_timestamp,
    mirror_types::{Order, WalletAddress},
};

/// Status vocabulary shared by chain-derived and local-derived entries. A local entry is dropped from the merged log
/// when a chain entry with the same status exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditStatus {
    Placed,
    Shipped,
    InTransit,
    Delivered,
    Confirmed,
    Released,
    ShipmentProof,
    DeliveryProof,
}

impl Display for AuditStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Placed => "Placed",
            Self::Shipped => "Shipped",
            Self::InTransit => "InTransit",
            Self::Delivered => "Delivered",
            Self::Confirmed => "Confirmed",
            Self::Released => "Released",
            Self::ShipmentProof => "ShipmentProof",
            Self::DeliveryProof => "DeliveryProof",
        };
        f.write_str(s)
    }
}

impl From<ChainEventKind> for AuditStatus {
    fn from(kind: ChainEventKind) -> Self {
        match kind {
            ChainEventKind::ShipmentMarked => Self::Shipped,
            ChainEventKind::InTransitMarked => Self::InTransit,
            ChainEventKind::DeliveredMarked => Self::Delivered,
            ChainEventKind::DeliveryConfirmed => Self::Confirmed,
        }
    }
}

/// Position of an entry within its own source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SortKey {
    Chain { block_number: u64, log_index: u64 },
    Local(u8),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub title: String,
    pub timestamp: DateTime<Utc>,
    pub detail: String,
    pub actor: Option<WalletAddress>,
    pub status: AuditStatus,
    pub sort_key: SortKey,
}

impl AuditLogEntry {
    pub fn is_on_chain(&self) -> bool {
        matches!(self.sort_key, SortKey::Chain { .. })
    }

    /// ISO-8601 timestamp with millisecond precision, as shown to users.
    pub fn iso_timestamp(&self) -> String {
        format_timestamp(&self.timestamp)
    }
}

/// Builds the timeline entry for a delivery-tracking event. Returns `None` for events the audit log does not track.
pub fn chain_entry(event: &ChainEvent, timestamp: DateTime<Utc>, order: &Order) -> Option<AuditLogEntry> {
    let kind = event.kind()?;
    let (title, default_actor) = match kind {
        ChainEventKind::ShipmentMarked => ("Shipment marked", &order.seller_wallet),
        ChainEventKind::InTransitMarked => ("In transit", &order.seller_wallet),
        ChainEventKind::DeliveredMarked => ("Delivered", &order.seller_wallet),
        ChainEventKind::DeliveryConfirmed => ("Delivery confirmed", &order.buyer_wallet),
    };
    let actor = ["actor", "seller", "buyer"]
        .iter()
        .find_map(|k| event.value_str(k))
        .filter(|s| !s.is_empty())
        .map(WalletAddress::new)
        .unwrap_or_else(|| default_actor.clone());
    let mut detail = format!("Recorded on-chain in block {} (tx {})", event.block_number, event.transaction_hash);
    if let Some(tracking) = event.value_str("trackingId").filter(|t| !t.is_empty()) {
        detail = format!("Tracking id {tracking}. {detail}");
    }
    Some(AuditLogEntry {
        title: title.to_string(),
        timestamp,
        detail,
        actor: Some(actor),
        status: kind.into(),
        sort_key: SortKey::Chain { block_number: event.block_number, log_index: event.log_index },
    })
}

/// Synthesises timeline entries from the mirror's own lifecycle timestamps. Unset timestamps produce no entry.
pub fn local_entries(order: &Order) -> Vec<AuditLogEntry> {
    let seller = Some(order.seller_wallet.clone());
    let buyer = Some(order.buyer_wallet.clone());
    let candidates = [
        (
            Some(order.created_at),
            "Order placed",
            format!("{} x {} ordered", order.quantity, order.product_name),
            buyer.clone(),
            AuditStatus::Placed,
        ),
        (
            order.shipped_at,
            "Shipment marked",
            "Seller marked the order as shipped".into(),
            seller.clone(),
            AuditStatus::Shipped,
        ),
        (order.delivered_at, "Delivery marked", "Buyer confirmed delivery".into(), buyer.clone(), AuditStatus::Delivered),
        (
            order.released_at,
            "Payment released",
            format!("{} released to the seller", order.total_price()),
            seller.clone(),
            AuditStatus::Released,
        ),
        (
            order.shipment_proof_at,
            "Shipment proof uploaded",
            "Seller attached proof of shipment".into(),
            seller,
            AuditStatus::ShipmentProof,
        ),
        (
            order.delivery_proof_at,
            "Delivery proof uploaded",
            "Buyer attached proof of delivery".into(),
            buyer,
            AuditStatus::DeliveryProof,
        ),
    ];
    candidates
        .into_iter()
        .enumerate()
        .filter_map(|(i, (ts, title, detail, actor, status))| {
            ts.map(|timestamp| AuditLogEntry {
                title: title.to_string(),
                timestamp,
                detail,
                actor,
                status,
                sort_key: SortKey::Local(i as u8),
            })
        })
        .collect()
}
