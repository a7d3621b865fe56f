//! Wallet-based authorization predicates.
//!
//! Every check takes the acting wallet as an explicit argument and compares it against the wallet recorded on the
//! order or cart line. A session may remember which wallet a user *claims* to be, but that is only ever a default for
//! the argument passed in here; it is never consulted directly when deciding whether a mutation is allowed.
//!
//! Wallet comparison is case-insensitive. An empty wallet never matches anything, so an anonymous caller cannot slip
//! through against an order whose wallet field was never filled in.

use crate::{
    mirror_api::errors::OrderFlowError,
    mirror_types::{Cart, CartLine, Order, WalletAddress},
};

pub fn same_wallet(a: &WalletAddress, b: &WalletAddress) -> bool {
    !a.is_empty() && !b.is_empty() && a == b
}

pub fn is_seller_for_order(order: &Order, wallet: &WalletAddress) -> bool {
    same_wallet(&order.seller_wallet, wallet)
}

pub fn is_buyer_for_order(order: &Order, wallet: &WalletAddress) -> bool {
    same_wallet(&order.buyer_wallet, wallet)
}

pub fn is_self_trade(buyer: &WalletAddress, seller: &WalletAddress) -> bool {
    same_wallet(buyer, seller)
}

/// Returns the first line in the cart that the buyer is selling to themselves, if any.
pub fn find_self_trade<'a>(buyer: &WalletAddress, cart: &'a Cart) -> Option<&'a CartLine> {
    cart.lines.iter().find(|line| is_self_trade(buyer, &line.seller_wallet))
}

pub fn require_seller(order: &Order, wallet: &WalletAddress) -> Result<(), OrderFlowError> {
    if is_seller_for_order(order, wallet) {
        Ok(())
    } else {
        Err(OrderFlowError::Forbidden { order_id: order.id, wallet: wallet.clone(), role: "seller" })
    }
}

pub fn require_buyer(order: &Order, wallet: &WalletAddress) -> Result<(), OrderFlowError> {
    if is_buyer_for_order(order, wallet) {
        Ok(())
    } else {
        Err(OrderFlowError::Forbidden { order_id: order.id, wallet: wallet.clone(), role: "buyer" })
    }
}
