use std::{
    collections::{BTreeSet, HashMap},
    fmt::Display,
    future::Future,
    sync::Arc,
    time::Duration,
};

use ceg_common::Wei;
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use log::*;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::{
    audit::{chain_entry, local_entries, merge_audit_logs, sort_audit_log, AuditLogEntry},
    chain::{ChainError, ChainOracle, EscrowOrder, SellerReputation},
    mirror_types::{Order, OrderId, WalletAddress},
};

pub const DEFAULT_CHAIN_TIMEOUT: Duration = Duration::from_millis(5_000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditSource {
    /// Chain and mirror entries were merged.
    Merged,
    /// The chain could not be read (or the order was never escrowed), so only mirror entries are shown.
    LocalOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLog {
    pub order_id: OrderId,
    pub entries: Vec<AuditLogEntry>,
    pub source: AuditSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxStatus {
    Success,
    Failed,
    Pending,
    Unknown,
}

impl Display for TxStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "Success"),
            Self::Failed => write!(f, "Failed"),
            Self::Pending => write!(f, "Pending"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// What could be learned about a transaction. Every field except the hash is optional, since the transaction may be
/// unknown, unmined, or the chain may be down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDetails {
    pub hash: String,
    pub from: Option<WalletAddress>,
    pub to: Option<WalletAddress>,
    pub value: Option<Wei>,
    pub gas_used: Option<u64>,
    pub fee: Option<Wei>,
    pub status: TxStatus,
}

/// Reads the chain on behalf of the mirror's views.
///
/// Every chain call goes through [`Reconciler::try_reconcile`], which applies the configured timeout and turns any
/// failure into a [`ChainError`]. Callers then decide how to degrade. Nothing here ever writes to the mirror.
pub struct Reconciler<C> {
    chain: C,
    timeout: Duration,
    block_times: Arc<RwLock<HashMap<u64, DateTime<Utc>>>>,
}

impl<C> std::fmt::Debug for Reconciler<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Reconciler(timeout: {:?})", self.timeout)
    }
}

impl<C: Clone> Clone for Reconciler<C> {
    fn clone(&self) -> Self {
        Self { chain: self.chain.clone(), timeout: self.timeout, block_times: Arc::clone(&self.block_times) }
    }
}

impl<C> Reconciler<C> {
    pub fn new(chain: C, timeout: Duration) -> Self {
        Self { chain, timeout, block_times: Arc::new(RwLock::new(HashMap::new())) }
    }

    pub fn chain(&self) -> &C {
        &self.chain
    }

    /// Runs one chain call under the configured timeout.
    pub async fn try_reconcile<T, F>(&self, what: &str, call: F) -> Result<T, ChainError>
    where F: Future<Output = Result<T, ChainError>> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(v)) => Ok(v),
            Ok(Err(e)) => {
                debug!("⛓️ {what} failed. {e}");
                Err(e)
            },
            Err(_) => {
                debug!("⛓️ {what} timed out after {:?}", self.timeout);
                Err(ChainError::Timeout(self.timeout.as_millis() as u64))
            },
        }
    }
}

impl<C: ChainOracle> Reconciler<C> {
    async fn block_time(&self, block_number: u64) -> Result<DateTime<Utc>, ChainError> {
        if let Some(ts) = self.block_times.read().await.get(&block_number) {
            return Ok(*ts);
        }
        let ts = self.try_reconcile("Block timestamp lookup", self.chain.block_timestamp(block_number)).await?;
        self.block_times.write().await.insert(block_number, ts);
        Ok(ts)
    }

    /// Number of block timestamps held in the cache.
    pub async fn cached_block_count(&self) -> usize {
        self.block_times.read().await.len()
    }

    /// Timeline entries for the order's escrow, built from the delivery-tracking event log.
    pub async fn chain_entries(&self, order: &Order, escrow_order_id: u64) -> Result<Vec<AuditLogEntry>, ChainError> {
        let events =
            self.try_reconcile("Event log query", self.chain.past_events(escrow_order_id, 0, None)).await?;
        let known: Vec<_> = events
            .iter()
            .filter(|event| {
                let known = event.kind().is_some();
                if !known {
                    trace!("🧾️ Ignoring {} event for escrow order {escrow_order_id}", event.event);
                }
                known
            })
            .collect();
        let blocks: BTreeSet<u64> = known.iter().map(|event| event.block_number).collect();
        let times = join_all(blocks.into_iter().map(|b| async move { self.block_time(b).await.map(|ts| (b, ts)) }))
            .await
            .into_iter()
            .collect::<Result<HashMap<u64, DateTime<Utc>>, ChainError>>()?;
        let entries = known
            .into_iter()
            .filter_map(|event| times.get(&event.block_number).and_then(|ts| chain_entry(event, *ts, order)))
            .collect();
        Ok(entries)
    }

    /// The order's merged timeline. This never fails: if the chain cannot be read, the log is built from the mirror
    /// alone and marked [`AuditSource::LocalOnly`].
    pub async fn build_audit_log(&self, order: &Order) -> AuditLog {
        let Some(escrow_order_id) = order.correlation.escrow_order_id else {
            trace!("🧾️ Order {} has no escrow order yet. Using mirror data only.", order.id);
            return local_only(order, local_entries(order));
        };
        let (chain, local) = tokio::join!(self.chain_entries(order, escrow_order_id), async { local_entries(order) });
        match chain {
            Ok(chain) => {
                trace!("🧾️ Merging {} chain entries with {} mirror entries for {}", chain.len(), local.len(), order.id);
                AuditLog { order_id: order.id, entries: merge_audit_logs(chain, local), source: AuditSource::Merged }
            },
            Err(e) => {
                warn!("🧾️ Could not read the chain for order {}. Showing mirror data only. {e}", order.id);
                local_only(order, local)
            },
        }
    }

    /// Best-effort lookup of a transaction and its receipt. Missing pieces are left empty rather than failing.
    pub async fn transaction_details(&self, tx_hash: &str) -> TransactionDetails {
        let (tx, receipt) = tokio::join!(
            self.try_reconcile("Transaction lookup", self.chain.transaction(tx_hash)),
            self.try_reconcile("Receipt lookup", self.chain.transaction_receipt(tx_hash))
        );
        let tx = tx.unwrap_or_else(|e| {
            warn!("⛓️ Transaction {tx_hash} could not be fetched. {e}");
            None
        });
        let receipt = receipt.unwrap_or_else(|e| {
            warn!("⛓️ Receipt for {tx_hash} could not be fetched. {e}");
            None
        });
        let status = match (&tx, &receipt) {
            (_, Some(r)) if r.success => TxStatus::Success,
            (_, Some(_)) => TxStatus::Failed,
            (Some(_), None) => TxStatus::Pending,
            (None, None) => TxStatus::Unknown,
        };
        TransactionDetails {
            hash: tx_hash.to_string(),
            from: tx.as_ref().map(|t| t.from.clone()),
            to: tx.as_ref().and_then(|t| t.to.clone()),
            value: tx.as_ref().map(|t| t.value),
            gas_used: receipt.as_ref().map(|r| r.gas_used),
            fee: receipt.as_ref().map(|r| r.fee()),
            status,
        }
    }

    /// Details for every transaction hash the mirror has recorded against the order (escrow first, then
    /// notarization).
    pub async fn order_transactions(&self, order: &Order) -> Vec<TransactionDetails> {
        let hashes = [&order.correlation.escrow_tx_hash, &order.correlation.notarize_tx_hash];
        let lookups = hashes.into_iter().flatten().filter(|h| !h.is_empty()).map(|h| self.transaction_details(h));
        join_all(lookups).await
    }

    /// The seller's on-chain rating, or `None` if it cannot be read.
    pub async fn seller_reputation(&self, seller: &WalletAddress) -> Option<SellerReputation> {
        if seller.is_empty() || seller.is_zero() {
            return None;
        }
        let (average, count) = tokio::join!(
            self.try_reconcile("Average rating lookup", self.chain.average_rating(seller)),
            self.try_reconcile("Rating count lookup", self.chain.rating_count(seller))
        );
        match (average, count) {
            (Ok(average), Ok(count)) => Some(SellerReputation::from_chain(average, count)),
            (Err(e), _) | (_, Err(e)) => {
                warn!("⛓️ Reputation for {seller} is unavailable. {e}");
                None
            },
        }
    }

    /// The on-chain escrow order, or `None` if the contract does not know it.
    pub async fn escrow_order(&self, escrow_order_id: u64) -> Result<Option<EscrowOrder>, ChainError> {
        let order = self.try_reconcile("Escrow order lookup", self.chain.get_order(escrow_order_id)).await?;
        Ok((!order.is_empty()).then_some(order))
    }
}

fn local_only(order: &Order, mut entries: Vec<AuditLogEntry>) -> AuditLog {
    sort_audit_log(&mut entries);
    AuditLog { order_id: order.id, entries, source: AuditSource::LocalOnly }
}

#[cfg(test)]
mod test {
    use chrono::Duration as ChronoDuration;
    use serde_json::{json, Map, Value};

    use super::*;
    use crate::{
        audit::AuditStatus,
        chain::{InMemoryChain, NewEscrowOrder},
        mirror_types::{BuyerInfo, ChainCorrelation, OrderStatusType, ProductId},
    };

    fn order(escrow_order_id: Option<u64>, created_at: DateTime<Utc>) -> Order {
        Order {
            id: OrderId(1),
            product_id: ProductId(3),
            product_name: "Orbit Ghost Mech".into(),
            quantity: 2,
            unit_price: Wei::from_eth_str("0.5").unwrap(),
            buyer_wallet: "0xBBB".into(),
            seller_wallet: "0xAAA".into(),
            status: OrderStatusType::AwaitingShipment,
            buyer_info: BuyerInfo::default(),
            correlation: ChainCorrelation { escrow_order_id, ..Default::default() },
            created_at,
            shipped_at: None,
            delivered_at: None,
            released_at: None,
            shipment_proof_at: None,
            delivery_proof_at: None,
            shipment_proof: None,
            delivery_proof: None,
            payment_released: false,
            rated: false,
            review_open: false,
            review_skipped: false,
        }
    }

    async fn escrowed(chain: &InMemoryChain) -> u64 {
        let new_order = NewEscrowOrder {
            product_id: 3,
            quantity: 2,
            unit_price: Wei::from_eth_str("0.5").unwrap(),
            buyer: "0xBBB".into(),
            seller: "0xAAA".into(),
        };
        chain.create_order(new_order).await.unwrap().0
    }

    fn reconciler(chain: &InMemoryChain) -> Reconciler<InMemoryChain> {
        Reconciler::new(chain.clone(), Duration::from_millis(200))
    }

    #[tokio::test]
    async fn chain_shipment_wins_over_local() {
        let chain = InMemoryChain::new();
        let id = escrowed(&chain).await;
        let mut order = order(Some(id), chain.now().await);
        chain.advance(ChronoDuration::minutes(5)).await;
        chain.confirm_shipment(id, &"0xAAA".into()).await.unwrap();
        let chain_shipped_at = chain.now().await;
        order.shipped_at = Some(chain_shipped_at + ChronoDuration::minutes(2));
        let log = reconciler(&chain).build_audit_log(&order).await;
        assert_eq!(log.source, AuditSource::Merged);
        let shipped: Vec<_> = log.entries.iter().filter(|e| e.status == AuditStatus::Shipped).collect();
        assert_eq!(shipped.len(), 1);
        assert_eq!(shipped[0].timestamp, chain_shipped_at);
        // OrderCreated is not a tracking event, so the placed entry comes from the mirror
        assert_eq!(log.entries[0].status, AuditStatus::Placed);
        assert!(!log.entries[0].is_on_chain());
    }

    #[tokio::test]
    async fn unknown_events_are_skipped_and_blocks_cached() {
        let chain = InMemoryChain::new();
        let id = escrowed(&chain).await;
        let order = order(Some(id), chain.now().await);
        let mut values = Map::<String, Value>::new();
        values.insert("trackingId".into(), json!("TRACK-001"));
        chain.advance(ChronoDuration::minutes(1)).await;
        chain.emit_event(id, "ShipmentMarked", values).await;
        chain.advance(ChronoDuration::minutes(1)).await;
        chain.emit_event(id, "SomethingElse", Map::new()).await;
        chain.advance(ChronoDuration::minutes(1)).await;
        chain.emit_event(id, "InTransitMarked", Map::new()).await;
        let rec = reconciler(&chain);
        let log = rec.build_audit_log(&order).await;
        let statuses: Vec<AuditStatus> = log.entries.iter().map(|e| e.status).collect();
        assert_eq!(statuses, [AuditStatus::Placed, AuditStatus::Shipped, AuditStatus::InTransit]);
        assert_eq!(rec.cached_block_count().await, 2);
        rec.build_audit_log(&order).await;
        assert_eq!(rec.cached_block_count().await, 2);
    }

    #[tokio::test]
    async fn block_times_are_fetched_together() {
        let chain = InMemoryChain::new();
        let id = escrowed(&chain).await;
        let order = order(Some(id), chain.now().await);
        for name in ["ShipmentMarked", "InTransitMarked", "DeliveredMarked"] {
            chain.advance(ChronoDuration::minutes(1)).await;
            chain.emit_event(id, name, Map::new()).await;
        }
        chain.set_latency(Some(Duration::from_millis(200))).await;
        let rec = Reconciler::new(chain.clone(), Duration::from_secs(2));
        let started = std::time::Instant::now();
        let entries = rec.chain_entries(&order, id).await.unwrap();
        let elapsed = started.elapsed();
        assert_eq!(entries.len(), 3);
        assert!(entries.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert_eq!(rec.cached_block_count().await, 3);
        // One event query plus one round of lookups. One lookup per block in turn would take 800ms.
        assert!(elapsed < Duration::from_millis(700), "took {elapsed:?}");
    }

    #[tokio::test]
    async fn unavailable_chain_falls_back_to_local() {
        let chain = InMemoryChain::new();
        let id = escrowed(&chain).await;
        let mut order = order(Some(id), chain.now().await);
        order.shipped_at = Some(order.created_at + ChronoDuration::minutes(1));
        chain.set_unavailable().await;
        let log = reconciler(&chain).build_audit_log(&order).await;
        assert_eq!(log.source, AuditSource::LocalOnly);
        assert_eq!(log.entries.len(), 2);
        assert!(log.entries.iter().all(|e| !e.is_on_chain()));
    }

    #[tokio::test]
    async fn slow_chain_times_out() {
        let chain = InMemoryChain::new();
        let id = escrowed(&chain).await;
        let order = order(Some(id), chain.now().await);
        chain.set_latency(Some(Duration::from_millis(1_000))).await;
        let rec = Reconciler::new(chain.clone(), Duration::from_millis(20));
        let log = rec.build_audit_log(&order).await;
        assert_eq!(log.source, AuditSource::LocalOnly);
        let err = rec.escrow_order(id).await.unwrap_err();
        assert_eq!(err, ChainError::Timeout(20));
    }

    #[tokio::test]
    async fn orders_without_escrow_are_local_only() {
        let chain = InMemoryChain::new();
        let log = reconciler(&chain).build_audit_log(&order(None, Utc::now())).await;
        assert_eq!(log.source, AuditSource::LocalOnly);
        assert_eq!(log.entries.len(), 1);
    }

    #[tokio::test]
    async fn transaction_details_are_partial() {
        let chain = InMemoryChain::new();
        let (_, receipt) = chain
            .create_order(NewEscrowOrder {
                product_id: 1,
                quantity: 1,
                unit_price: Wei::from_eth(1),
                buyer: "0xBBB".into(),
                seller: "0xAAA".into(),
            })
            .await
            .unwrap();
        let rec = reconciler(&chain);
        let mined = rec.transaction_details(&receipt.transaction_hash).await;
        assert_eq!(mined.status, TxStatus::Success);
        assert_eq!(mined.from, Some("0xBBB".into()));
        assert_eq!(mined.value, Some(Wei::from_eth(1)));
        assert!(mined.fee.is_some());
        let pending_hash = chain.add_pending_transaction(&"0xBBB".into(), Wei::from_eth(1)).await;
        let pending = rec.transaction_details(&pending_hash).await;
        assert_eq!(pending.status, TxStatus::Pending);
        assert_eq!(pending.gas_used, None);
        let unknown = rec.transaction_details("0xfeed").await;
        assert_eq!(unknown.status, TxStatus::Unknown);
        chain.set_unavailable().await;
        let down = rec.transaction_details(&receipt.transaction_hash).await;
        assert_eq!(down.status, TxStatus::Unknown);
        assert_eq!(down.hash, receipt.transaction_hash);
    }

    #[tokio::test]
    async fn reputation_snapshot() {
        let chain = InMemoryChain::new();
        let rec = reconciler(&chain);
        let (seller, buyer) = (WalletAddress::new("0xAAA"), WalletAddress::new("0xBBB"));
        let id = escrowed(&chain).await;
        chain.confirm_shipment(id, &seller).await.unwrap();
        chain.confirm_delivery(id, &buyer).await.unwrap();
        chain.release_payment(id, &seller).await.unwrap();
        chain.submit_rating(id, &buyer, 4, "good").await.unwrap();
        let rep = rec.seller_reputation(&seller).await.unwrap();
        assert_eq!(rep.average, 4.0);
        assert_eq!(rep.count, 1);
        assert!(rec.seller_reputation(&crate::mirror_types::ZERO_ADDRESS.into()).await.is_none());
        chain.set_unavailable().await;
        assert!(rec.seller_reputation(&seller).await.is_none());
    }

    #[tokio::test]
    async fn empty_escrow_orders_are_not_found() {
        let chain = InMemoryChain::new();
        let rec = reconciler(&chain);
        assert_eq!(rec.escrow_order(42).await.unwrap(), None);
        let id = escrowed(&chain).await;
        assert_eq!(rec.escrow_order(id).await.unwrap().map(|o| o.quantity), Some(2));
    }
}
