use std::{fmt::Display, str::FromStr};

use ceg_common::Wei;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::mirror_types::WalletAddress;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowOrder {
    pub escrow_order_id: u64,
    pub product_id: u64,
    pub quantity: u32,
    pub unit_price: Wei,
    pub amount: Wei,
    pub buyer: WalletAddress,
    pub seller: WalletAddress,
    pub shipped: bool,
    pub delivered: bool,
    pub released: bool,
    pub rated: bool,
}

impl EscrowOrder {
    /// The contract answers lookups for unknown orders with a zeroed struct rather than an error.
    pub fn is_empty(&self) -> bool {
        let blank = |w: &WalletAddress| w.is_empty() || w.is_zero();
        blank(&self.buyer) && blank(&self.seller) && self.amount.is_zero()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEscrowOrder {
    pub product_id: u64,
    pub quantity: u32,
    pub unit_price: Wei,
    pub buyer: WalletAddress,
    pub seller: WalletAddress,
}

/// The delivery-tracking events the audit log understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainEventKind {
    ShipmentMarked,
    InTransitMarked,
    DeliveredMarked,
    DeliveryConfirmed,
}

impl FromStr for ChainEventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ShipmentMarked" => Ok(Self::ShipmentMarked),
            "InTransitMarked" => Ok(Self::InTransitMarked),
            "DeliveredMarked" => Ok(Self::DeliveredMarked),
            "DeliveryConfirmed" => Ok(Self::DeliveryConfirmed),
            other => Err(format!("Unrecognised chain event: {other}")),
        }
    }
}

impl Display for ChainEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::ShipmentMarked => "ShipmentMarked",
            Self::InTransitMarked => "InTransitMarked",
            Self::DeliveredMarked => "DeliveredMarked",
            Self::DeliveryConfirmed => "DeliveryConfirmed",
        };
        f.write_str(s)
    }
}

/// A raw contract log entry, as returned by a past-events query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainEvent {
    pub event: String,
    pub return_values: Map<String, Value>,
    pub block_number: u64,
    pub log_index: u64,
    pub transaction_hash: String,
}

impl ChainEvent {
    pub fn kind(&self) -> Option<ChainEventKind> {
        self.event.parse().ok()
    }

    /// A string-valued return value, if present.
    pub fn value_str(&self, key: &str) -> Option<&str> {
        self.return_values.get(key).and_then(Value::as_str)
    }

    /// The escrow order id the event refers to. Contracts emit it as either a number or a decimal string.
    pub fn order_id(&self) -> Option<u64> {
        match self.return_values.get("orderId")? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInfo {
    pub hash: String,
    pub from: WalletAddress,
    pub to: Option<WalletAddress>,
    pub value: Wei,
    pub block_number: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub transaction_hash: String,
    pub block_number: u64,
    pub success: bool,
    pub gas_used: u64,
    /// Price per unit of gas actually paid, in wei.
    pub effective_gas_price: u128,
}

impl TxReceipt {
    pub fn fee(&self) -> Wei {
        Wei::from(self.effective_gas_price.saturating_mul(u128::from(self.gas_used)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SellerReputation {
    pub average: f64,
    pub count: u64,
}

impl SellerReputation {
    pub fn from_chain(average_x100: u64, count: u64) -> Self {
        Self { average: average_x100 as f64 / 100.0, count }
    }
}

impl Display for SellerReputation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2} ({} ratings)", self.average, self.count)
    }
}
