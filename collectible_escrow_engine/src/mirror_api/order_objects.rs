//! Input structs for the order flow. Form values arrive as loose strings, so each struct validates at construction
//! and the state machine only ever sees well-formed requests.
use serde::{Deserialize, Serialize};

use crate::{
    mirror_api::OrderFlowError,
    mirror_types::{BuyerInfo, ChainCorrelation, OrderId, ProductId, ProofKind, WalletAddress},
};

pub const MAX_CART_QUANTITY: u32 = 99;

fn parse_number<T: std::str::FromStr>(field: &str, value: &str) -> Result<T, OrderFlowError> {
    value.trim().parse::<T>().map_err(|_| OrderFlowError::InvalidInput(format!("{field} must be a number, not '{value}'.")))
}

fn require_wallet(wallet: WalletAddress) -> Result<WalletAddress, OrderFlowError> {
    if wallet.is_empty() {
        Err(OrderFlowError::InvalidInput("A wallet address is required.".into()))
    } else {
        Ok(wallet)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCartLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl NewCartLine {
    pub fn new(product_id: ProductId, quantity: u32) -> Result<Self, OrderFlowError> {
        if quantity == 0 || quantity > MAX_CART_QUANTITY {
            return Err(OrderFlowError::InvalidInput(format!(
                "Quantity must be between 1 and {MAX_CART_QUANTITY}, not {quantity}."
            )));
        }
        Ok(Self { product_id, quantity })
    }

    /// Builds a line from raw form values.
    pub fn parse(product_id: &str, quantity: &str) -> Result<Self, OrderFlowError> {
        let product_id = ProductId(parse_number("Product id", product_id)?);
        let quantity = parse_number("Quantity", quantity)?;
        Self::new(product_id, quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub buyer_wallet: WalletAddress,
    pub buyer_info: BuyerInfo,
    /// One entry per cart line, in cart order. Shorter lists leave the remaining orders uncorrelated.
    pub correlations: Vec<ChainCorrelation>,
}

impl CheckoutRequest {
    pub fn new(buyer_wallet: WalletAddress, buyer_info: BuyerInfo) -> Result<Self, OrderFlowError> {
        Ok(Self { buyer_wallet: require_wallet(buyer_wallet)?, buyer_info, correlations: Vec::new() })
    }

    pub fn with_correlations(mut self, correlations: Vec<ChainCorrelation>) -> Self {
        self.correlations = correlations;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofUpload {
    pub order_id: OrderId,
    pub acting_wallet: WalletAddress,
    pub kind: ProofKind,
    /// Where the upload layer stored the file.
    pub path: String,
    pub content_type: String,
}

impl ProofUpload {
    /// Only the wallet is checked here. The file type is judged when the proof is attached, after access checks.
    pub fn new<S: Into<String>>(
        order_id: OrderId,
        acting_wallet: WalletAddress,
        kind: ProofKind,
        path: S,
        content_type: S,
    ) -> Result<Self, OrderFlowError> {
        let acting_wallet = require_wallet(acting_wallet)?;
        Ok(Self { order_id, acting_wallet, kind, path: path.into(), content_type: content_type.into() })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingRequest {
    pub order_id: OrderId,
    /// Out-of-range values are clamped into 1..=5 when the rating is stored.
    pub stars: i64,
    pub comment: String,
}

impl RatingRequest {
    pub fn new<S: Into<String>>(order_id: OrderId, stars: i64, comment: S) -> Self {
        Self { order_id, stars, comment: comment.into() }
    }

    pub fn parse(order_id: &str, stars: &str, comment: &str) -> Result<Self, OrderFlowError> {
        let order_id = order_id.parse::<OrderId>().map_err(|e| OrderFlowError::InvalidInput(e.to_string()))?;
        let stars = parse_number("Stars", stars)?;
        Ok(Self::new(order_id, stars, comment))
    }
}
