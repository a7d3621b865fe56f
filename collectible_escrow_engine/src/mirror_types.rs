use std::{
    fmt::Display,
    hash::{Hash, Hasher},
    str::FromStr,
};

use ceg_common::Wei;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

//--------------------------------------   WalletAddress     ---------------------------------------------------------
/// A wallet address as supplied by a client.
///
/// Wallet providers disagree on checksum casing, so equality and hashing ignore ASCII case. The address is otherwise
/// kept exactly as given (minus surrounding whitespace) for display.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletAddress(String);

impl WalletAddress {
    pub fn new<S: AsRef<str>>(address: S) -> Self {
        Self(address.as_ref().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True for `0x000…0` style addresses, which the escrow contract returns for unknown orders.
    pub fn is_zero(&self) -> bool {
        let digits = self.0.strip_prefix("0x").or_else(|| self.0.strip_prefix("0X")).unwrap_or(&self.0);
        !digits.is_empty() && digits.chars().all(|c| c == '0')
    }

    pub fn to_lowercase(&self) -> String {
        self.0.to_ascii_lowercase()
    }
}

impl PartialEq for WalletAddress {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for WalletAddress {}

impl Hash for WalletAddress {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_lowercase().hash(state);
    }
}

impl Display for WalletAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WalletAddress {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for WalletAddress {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

//--------------------------------------        OrderId        ---------------------------------------------------------
/// Mirror-local order id. Unrelated to the escrow contract's own order numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub i64);

impl FromStr for OrderId {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .trim_start_matches('#')
            .parse::<i64>()
            .map(Self)
            .map_err(|e| ConversionError(format!("Invalid order id '{s}': {e}")))
    }
}

impl From<i64> for OrderId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn value(&self) -> i64 {
        self.0
    }
}

//--------------------------------------       ProductId       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub u64);

impl From<u64> for ProductId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "P{}", self.0)
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatusType {
    /// Checked out and paid into escrow; waiting for the seller to ship.
    AwaitingShipment,
    /// The seller has marked the order as shipped.
    Shipped,
    /// The buyer has confirmed delivery. Terminal.
    Delivered,
}

impl OrderStatusType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::AwaitingShipment => "Awaiting shipment",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AwaitingShipment => write!(f, "AwaitingShipment"),
            Self::Shipped => write!(f, "Shipped"),
            Self::Delivered => write!(f, "Delivered"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AwaitingShipment" => Ok(Self::AwaitingShipment),
            "Shipped" => Ok(Self::Shipped),
            "Delivered" => Ok(Self::Delivered),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------        Product        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    pub seller_name: String,
    pub seller_wallet: WalletAddress,
    pub price: Wei,
}

impl Product {
    pub fn new<S: Into<String>>(id: u64, name: S, price: Wei, seller_wallet: WalletAddress) -> Self {
        Self {
            id: ProductId(id),
            name: name.into(),
            category: String::default(),
            seller_name: String::default(),
            seller_wallet,
            price,
        }
    }

    pub fn with_category<S: Into<String>>(mut self, category: S) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_seller_name<S: Into<String>>(mut self, seller_name: S) -> Self {
        self.seller_name = seller_name.into();
        self
    }
}

//--------------------------------------     Cart / CartLine   ---------------------------------------------------------
/// A cart line carries a snapshot of the product as it was when added, so later catalog edits do not change what the
/// buyer checks out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
    pub product_name: String,
    pub unit_price: Wei,
    pub seller_wallet: WalletAddress,
}

impl CartLine {
    pub fn from_product(product: &Product, quantity: u32) -> Self {
        Self {
            product_id: product.id,
            quantity,
            product_name: product.name.clone(),
            unit_price: product.price,
            seller_wallet: product.seller_wallet.clone(),
        }
    }

    pub fn line_total(&self) -> Wei {
        self.unit_price * u64::from(self.quantity)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub lines: Vec<CartLine>,
}

impl Cart {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn total(&self) -> Wei {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    pub fn line_mut(&mut self, product_id: ProductId) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|l| l.product_id == product_id)
    }
}

//--------------------------------------       BuyerInfo       ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyerInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub shipping_address: String,
}

//--------------------------------------   ChainCorrelation    ---------------------------------------------------------
/// Links a mirror order to its on-chain counterparts. Every field is filled in by the client once the relevant
/// transaction has confirmed, so any of them may be missing at any time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainCorrelation {
    pub escrow_order_id: Option<u64>,
    pub escrow_tx_hash: Option<String>,
    pub order_hash: Option<String>,
    pub notarize_tx_hash: Option<String>,
}

impl ChainCorrelation {
    pub fn escrow(escrow_order_id: u64, tx_hash: &str) -> Self {
        Self { escrow_order_id: Some(escrow_order_id), escrow_tx_hash: Some(tx_hash.to_string()), ..Default::default() }
    }

    pub fn is_notarized(&self) -> bool {
        self.order_hash.as_deref().is_some_and(|h| !h.is_empty())
    }
}

//--------------------------------------       ProofKind       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProofKind {
    Shipment,
    Delivery,
}

impl ProofKind {
    /// The status an order must have reached before this proof can be attached.
    pub fn required_status(&self) -> OrderStatusType {
        match self {
            Self::Shipment => OrderStatusType::Shipped,
            Self::Delivery => OrderStatusType::Delivered,
        }
    }
}

impl Display for ProofKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Shipment => write!(f, "shipment proof"),
            Self::Delivery => write!(f, "delivery proof"),
        }
    }
}

//--------------------------------------         Order         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Wei,
    pub buyer_wallet: WalletAddress,
    pub seller_wallet: WalletAddress,
    pub status: OrderStatusType,
    pub buyer_info: BuyerInfo,
    pub correlation: ChainCorrelation,
    pub created_at: DateTime<Utc>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub released_at: Option<DateTime<Utc>>,
    pub shipment_proof_at: Option<DateTime<Utc>>,
    pub delivery_proof_at: Option<DateTime<Utc>>,
    pub shipment_proof: Option<String>,
    pub delivery_proof: Option<String>,
    pub payment_released: bool,
    pub rated: bool,
    pub review_open: bool,
    pub review_skipped: bool,
}

impl Order {
    pub fn total_price(&self) -> Wei {
        self.unit_price * u64::from(self.quantity)
    }

    pub fn proof(&self, kind: ProofKind) -> Option<&str> {
        match kind {
            ProofKind::Shipment => self.shipment_proof.as_deref(),
            ProofKind::Delivery => self.delivery_proof.as_deref(),
        }
    }

    /// Rating is only offered once delivery is confirmed, and only once.
    pub fn is_awaiting_rating(&self) -> bool {
        self.status == OrderStatusType::Delivered && !self.rated
    }

    pub fn flags(&self) -> OrderFlags {
        OrderFlags {
            shipped: self.shipped_at.is_some(),
            delivered: self.status == OrderStatusType::Delivered,
            paid_out: self.payment_released,
            rated: self.rated,
        }
    }
}

//--------------------------------------       OrderFlags      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFlags {
    pub shipped: bool,
    pub delivered: bool,
    pub paid_out: bool,
    pub rated: bool,
}

impl Display for OrderFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Shipped: {} | Delivered: {} | Paid out: {} | Rated: {}",
            self.shipped, self.delivered, self.paid_out, self.rated
        )
    }
}

//--------------------------------------         Rating        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    pub product_id: ProductId,
    pub order_id: OrderId,
    pub stars: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------       MarketRole      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketRole {
    Buyer,
    Seller,
}

impl Display for MarketRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buyer => write!(f, "buyer"),
            Self::Seller => write!(f, "seller"),
        }
    }
}
