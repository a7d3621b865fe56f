//! The escrow contract system, seen from the mirror.
//!
//! [`ChainOracle`] is the only door to the chain. The escrow contract is authoritative for funds and for shipment and
//! delivery events, but it is slow and may be unreachable, so nothing on the mirror's write path ever waits on it.
//! Read views go through [`crate::audit::Reconciler`], which degrades to mirror-only data when a call fails.
mod memory;
mod objects;

use chrono::{DateTime, Utc};
pub use memory::InMemoryChain;
pub use objects::{ChainEvent, ChainEventKind, EscrowOrder, NewEscrowOrder, SellerReputation, TxInfo, TxReceipt};
use thiserror::Error;

use crate::mirror_types::WalletAddress;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("The chain RPC endpoint is unavailable. {0}")]
    Unavailable(String),
    #[error("The {0} contract is not deployed on this network.")]
    NotDeployed(String),
    #[error("The chain returned a response that could not be understood. {0}")]
    MalformedResponse(String),
    #[error("The chain did not answer within {0} ms.")]
    Timeout(u64),
    #[error("The transaction was reverted. {0}")]
    Reverted(String),
}

#[allow(async_fn_in_trait)]
pub trait ChainOracle {
    /// Fetches an escrow order. Unknown ids return an all-zero order, exactly as the contract does.
    async fn get_order(&self, escrow_order_id: u64) -> Result<EscrowOrder, ChainError>;
    /// Opens an escrow order, paying `quantity * unit_price` into the contract. Returns the new escrow order id.
    async fn create_order(&self, order: NewEscrowOrder) -> Result<(u64, TxReceipt), ChainError>;
    async fn confirm_shipment(&self, escrow_order_id: u64, seller: &WalletAddress) -> Result<TxReceipt, ChainError>;
    async fn confirm_delivery(&self, escrow_order_id: u64, buyer: &WalletAddress) -> Result<TxReceipt, ChainError>;
    async fn release_payment(&self, escrow_order_id: u64, seller: &WalletAddress) -> Result<TxReceipt, ChainError>;
    async fn submit_rating(
        &self,
        escrow_order_id: u64,
        buyer: &WalletAddress,
        stars: u8,
        comment: &str,
    ) -> Result<TxReceipt, ChainError>;
    /// The seller's average rating multiplied by 100 (so 4.5 stars reads as 450).
    async fn average_rating(&self, seller: &WalletAddress) -> Result<u64, ChainError>;
    async fn rating_count(&self, seller: &WalletAddress) -> Result<u64, ChainError>;
    /// Past delivery-tracking events for one escrow order, in chain order. `to_block` of `None` means the latest block.
    async fn past_events(
        &self,
        escrow_order_id: u64,
        from_block: u64,
        to_block: Option<u64>,
    ) -> Result<Vec<ChainEvent>, ChainError>;
    async fn block_timestamp(&self, block_number: u64) -> Result<DateTime<Utc>, ChainError>;
    /// `Ok(None)` if the chain does not know the transaction.
    async fn transaction(&self, tx_hash: &str) -> Result<Option<TxInfo>, ChainError>;
    /// `Ok(None)` until the transaction has been mined.
    async fn transaction_receipt(&self, tx_hash: &str) -> Result<Option<TxReceipt>, ChainError>;
}
