use thiserror::Error;

use crate::{
    chain::ChainError,
    mirror_types::{OrderId, OrderStatusType, ProductId, ProofKind, WalletAddress},
    tokens::TokenError,
};

/// Broad classification of every error the engine reports. Presentation layers map these to user-facing messages
/// (or HTTP status codes) without matching on individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input: empty cart, bad file type, malformed numbers.
    Validation,
    /// The acting wallet may not perform this action.
    Authorization,
    /// The order is not in a state that allows this one-time action.
    StateConflict,
    /// A pay/track link token is invalid or expired. Re-minting always recovers.
    Token,
    /// The chain could not be reached. Read paths fall back to the mirror.
    ExternalUnavailable,
}

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("The cart is empty.")]
    EmptyCart,
    #[error("Wallet {buyer} cannot buy product {product_id} from itself.")]
    SelfTrade { buyer: WalletAddress, product_id: ProductId },
    #[error("Wallet {wallet} is not the {role} for order {order_id}.")]
    Forbidden { order_id: OrderId, wallet: WalletAddress, role: &'static str },
    #[error("Order {order_id} is {status}, which does not allow this action. {reason}")]
    InvalidState { order_id: OrderId, status: OrderStatusType, reason: String },
    #[error("Order {0} already has a {1}.")]
    AlreadyExists(OrderId, ProofKind),
    #[error("Order {order_id} already records a different {field}.")]
    CorrelationConflict { order_id: OrderId, field: &'static str },
    #[error("Unsupported file type: {0}. Upload an image or a PDF.")]
    InvalidFile(String),
    #[error("Invalid input. {0}")]
    InvalidInput(String),
    #[error("Order {0} does not exist.")]
    OrderNotFound(OrderId),
    #[error("Product {0} does not exist.")]
    ProductNotFound(ProductId),
    #[error("Link token error. {0}")]
    Token(#[from] TokenError),
}

impl OrderFlowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyCart | Self::InvalidFile(_) | Self::InvalidInput(_) | Self::ProductNotFound(_) => {
                ErrorKind::Validation
            },
            Self::SelfTrade { .. } | Self::Forbidden { .. } => ErrorKind::Authorization,
            Self::InvalidState { .. } |
            Self::AlreadyExists(..) |
            Self::CorrelationConflict { .. } |
            Self::OrderNotFound(_) => ErrorKind::StateConflict,
            Self::Token(e) => e.kind(),
        }
    }

    pub fn invalid_state<S: Into<String>>(order_id: OrderId, status: OrderStatusType, reason: S) -> Self {
        Self::InvalidState { order_id, status, reason: reason.into() }
    }
}

impl TokenError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Token
    }
}

impl ChainError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::ExternalUnavailable
    }
}
