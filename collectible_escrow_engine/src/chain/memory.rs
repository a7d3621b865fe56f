use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
    time::Duration as StdDuration,
};

use ceg_common::Wei;
use chrono::{DateTime, Duration, DurationRound, Utc};
use log::*;
use serde_json::{json, Map, Value};
use tokio::sync::RwLock;

use crate::{
    chain::{ChainError, ChainEvent, ChainOracle, EscrowOrder, NewEscrowOrder, TxInfo, TxReceipt},
    mirror_types::WalletAddress,
};

const GAS_PER_CALL: u64 = 50_000;
const GAS_PRICE_WEI: u128 = 1_000_000_000;
pub const ESCROW_CONTRACT_ADDRESS: &str = "0x00000000000000000000000000000000e5c40000";

#[derive(Debug)]
struct ChainState {
    now: DateTime<Utc>,
    /// Block timestamps, indexed by block number. Block 0 is genesis.
    blocks: Vec<DateTime<Utc>>,
    orders: BTreeMap<u64, EscrowOrder>,
    last_order_id: u64,
    events: Vec<ChainEvent>,
    transactions: HashMap<String, (TxInfo, Option<TxReceipt>)>,
    tx_count: u64,
    /// seller -> (total stars, rating count)
    reputation: HashMap<WalletAddress, (u64, u64)>,
    fault: Option<ChainError>,
    latency: Option<StdDuration>,
}

impl ChainState {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            now,
            blocks: vec![now],
            orders: BTreeMap::new(),
            last_order_id: 0,
            events: Vec::new(),
            transactions: HashMap::new(),
            tx_count: 0,
            reputation: HashMap::new(),
            fault: None,
            latency: None,
        }
    }

    fn next_tx_hash(&mut self) -> String {
        self.tx_count += 1;
        format!("0x{:064x}", self.tx_count)
    }

    /// Mines a block holding a single transaction from `from`, emitting the given events in order.
    fn mine(&mut self, from: &WalletAddress, value: Wei, events: Vec<(&str, Map<String, Value>)>) -> TxReceipt {
        let block_number = self.blocks.len() as u64;
        self.blocks.push(self.now);
        let hash = self.next_tx_hash();
        for (log_index, (name, return_values)) in events.into_iter().enumerate() {
            self.events.push(ChainEvent {
                event: name.to_string(),
                return_values,
                block_number,
                log_index: log_index as u64,
                transaction_hash: hash.clone(),
            });
        }
        let receipt = TxReceipt {
            transaction_hash: hash.clone(),
            block_number,
            success: true,
            gas_used: GAS_PER_CALL,
            effective_gas_price: GAS_PRICE_WEI,
        };
        let info = TxInfo {
            hash: hash.clone(),
            from: from.clone(),
            to: Some(WalletAddress::new(ESCROW_CONTRACT_ADDRESS)),
            value,
            block_number: Some(block_number),
        };
        self.transactions.insert(hash, (info, Some(receipt.clone())));
        receipt
    }

    fn order_mut(&mut self, escrow_order_id: u64) -> Result<&mut EscrowOrder, ChainError> {
        self.orders
            .get_mut(&escrow_order_id)
            .ok_or_else(|| ChainError::Reverted(format!("Escrow order {escrow_order_id} does not exist")))
    }
}

fn values(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

fn revert_unless(condition: bool, reason: &str) -> Result<(), ChainError> {
    if condition {
        Ok(())
    } else {
        Err(ChainError::Reverted(reason.to_string()))
    }
}

/// An in-process escrow chain.
///
/// Mirrors the escrow, delivery-tracking and reputation contracts closely enough to run the whole order flow locally:
/// every state-changing call mines its own block at the chain's current clock and emits the same events the contracts
/// do. The clock only moves when told to ([`Self::advance`]), and faults can be switched on to exercise the mirror's
/// fallback paths.
#[derive(Debug, Clone)]
pub struct InMemoryChain {
    state: Arc<RwLock<ChainState>>,
}

impl Default for InMemoryChain {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryChain {
    pub fn new() -> Self {
        let now = Utc::now().duration_trunc(Duration::seconds(1)).unwrap_or_else(|_| Utc::now());
        Self::starting_at(now)
    }

    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self { state: Arc::new(RwLock::new(ChainState::new(now))) }
    }

    pub async fn now(&self) -> DateTime<Utc> {
        self.state.read().await.now
    }

    /// Moves the chain clock forward. Blocks mined afterwards carry the new time.
    pub async fn advance(&self, by: Duration) {
        let mut state = self.state.write().await;
        state.now = state.now + by;
    }

    pub async fn set_unavailable(&self) {
        self.set_fault(Some(ChainError::Unavailable("connection refused".into()))).await;
    }

    pub async fn set_not_deployed(&self) {
        self.set_fault(Some(ChainError::NotDeployed("DeliveryTracking".into()))).await;
    }

    pub async fn set_malformed(&self) {
        self.set_fault(Some(ChainError::MalformedResponse("unexpected end of JSON input".into()))).await;
    }

    pub async fn restore(&self) {
        self.set_fault(None).await;
    }

    async fn set_fault(&self, fault: Option<ChainError>) {
        if let Some(e) = &fault {
            debug!("⛓️ In-memory chain now fails every call: {e}");
        }
        self.state.write().await.fault = fault;
    }

    /// Delays every call by `latency`, to exercise caller timeouts.
    pub async fn set_latency(&self, latency: Option<StdDuration>) {
        self.state.write().await.latency = latency;
    }

    /// Mines a block carrying one arbitrary contract event, e.g. a delivery-tracking update made outside the escrow
    /// contract.
    pub async fn emit_event(&self, escrow_order_id: u64, name: &str, mut return_values: Map<String, Value>) -> TxReceipt {
        return_values.insert("orderId".into(), json!(escrow_order_id.to_string()));
        let mut state = self.state.write().await;
        let from = WalletAddress::new(ESCROW_CONTRACT_ADDRESS);
        state.mine(&from, Wei::default(), vec![(name, return_values)])
    }

    /// Registers a transaction the chain has seen but not mined yet.
    pub async fn add_pending_transaction(&self, from: &WalletAddress, value: Wei) -> String {
        let mut state = self.state.write().await;
        let hash = state.next_tx_hash();
        let info = TxInfo { hash: hash.clone(), from: from.clone(), to: None, value, block_number: None };
        state.transactions.insert(hash.clone(), (info, None));
        hash
    }

    /// Waits out any configured latency, then reports the configured fault, if any.
    async fn gate(&self) -> Result<(), ChainError> {
        let (latency, fault) = {
            let state = self.state.read().await;
            (state.latency, state.fault.clone())
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        match fault {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl ChainOracle for InMemoryChain {
    async fn get_order(&self, escrow_order_id: u64) -> Result<EscrowOrder, ChainError> {
        self.gate().await?;
        let state = self.state.read().await;
        Ok(state.orders.get(&escrow_order_id).cloned().unwrap_or_default())
    }

    async fn create_order(&self, order: NewEscrowOrder) -> Result<(u64, TxReceipt), ChainError> {
        self.gate().await?;
        revert_unless(order.quantity > 0, "Quantity must be positive")?;
        revert_unless(!order.unit_price.is_zero(), "Price must be positive")?;
        revert_unless(order.buyer != order.seller, "Buyer cannot be the seller")?;
        let mut state = self.state.write().await;
        state.last_order_id += 1;
        let id = state.last_order_id;
        let amount = order.unit_price * u64::from(order.quantity);
        state.orders.insert(id, EscrowOrder {
            escrow_order_id: id,
            product_id: order.product_id,
            quantity: order.quantity,
            unit_price: order.unit_price,
            amount,
            buyer: order.buyer.clone(),
            seller: order.seller.clone(),
            ..Default::default()
        });
        let event = values(&[
            ("orderId", json!(id.to_string())),
            ("buyer", json!(order.buyer.as_str())),
            ("seller", json!(order.seller.as_str())),
            ("amount", json!(amount.value().to_string())),
        ]);
        let receipt = state.mine(&order.buyer, amount, vec![("OrderCreated", event)]);
        trace!("⛓️ Escrow order {id} created in block {}", receipt.block_number);
        Ok((id, receipt))
    }

    async fn confirm_shipment(&self, escrow_order_id: u64, seller: &WalletAddress) -> Result<TxReceipt, ChainError> {
        self.gate().await?;
        let mut state = self.state.write().await;
        let order = state.order_mut(escrow_order_id)?;
        revert_unless(&order.seller == seller, "Only the seller can confirm shipment")?;
        revert_unless(!order.shipped, "Already shipped")?;
        order.shipped = true;
        let event = values(&[("orderId", json!(escrow_order_id.to_string())), ("seller", json!(seller.as_str()))]);
        Ok(state.mine(seller, Wei::default(), vec![("ShipmentMarked", event)]))
    }

    async fn confirm_delivery(&self, escrow_order_id: u64, buyer: &WalletAddress) -> Result<TxReceipt, ChainError> {
        self.gate().await?;
        let mut state = self.state.write().await;
        let order = state.order_mut(escrow_order_id)?;
        revert_unless(&order.buyer == buyer, "Only the buyer can confirm delivery")?;
        revert_unless(order.shipped, "Not shipped yet")?;
        revert_unless(!order.delivered, "Already delivered")?;
        order.delivered = true;
        let event = values(&[("orderId", json!(escrow_order_id.to_string())), ("buyer", json!(buyer.as_str()))]);
        Ok(state.mine(buyer, Wei::default(), vec![("DeliveryConfirmed", event)]))
    }

    async fn release_payment(&self, escrow_order_id: u64, seller: &WalletAddress) -> Result<TxReceipt, ChainError> {
        self.gate().await?;
        let mut state = self.state.write().await;
        let order = state.order_mut(escrow_order_id)?;
        revert_unless(&order.seller == seller, "Only the seller can release payment")?;
        revert_unless(order.delivered, "Delivery not confirmed")?;
        revert_unless(!order.released, "Already released")?;
        order.released = true;
        let amount = order.amount;
        let event = values(&[
            ("orderId", json!(escrow_order_id.to_string())),
            ("seller", json!(seller.as_str())),
            ("amount", json!(amount.value().to_string())),
        ]);
        Ok(state.mine(seller, Wei::default(), vec![("PaymentReleased", event)]))
    }

    async fn submit_rating(
        &self,
        escrow_order_id: u64,
        buyer: &WalletAddress,
        stars: u8,
        comment: &str,
    ) -> Result<TxReceipt, ChainError> {
        self.gate().await?;
        revert_unless((1..=5).contains(&stars), "Rating must be between 1 and 5")?;
        let mut state = self.state.write().await;
        let order = state.order_mut(escrow_order_id)?;
        revert_unless(&order.buyer == buyer, "Only the buyer can rate")?;
        revert_unless(order.released, "Payment not released")?;
        revert_unless(!order.rated, "Already rated")?;
        order.rated = true;
        let seller = order.seller.clone();
        let entry = state.reputation.entry(seller.clone()).or_default();
        entry.0 += u64::from(stars);
        entry.1 += 1;
        let event = values(&[
            ("orderId", json!(escrow_order_id.to_string())),
            ("seller", json!(seller.as_str())),
            ("stars", json!(stars)),
            ("comment", json!(comment)),
        ]);
        Ok(state.mine(buyer, Wei::default(), vec![("RatingSubmitted", event)]))
    }

    async fn average_rating(&self, seller: &WalletAddress) -> Result<u64, ChainError> {
        self.gate().await?;
        let state = self.state.read().await;
        Ok(match state.reputation.get(seller) {
            Some((total, count)) if *count > 0 => total * 100 / count,
            _ => 0,
        })
    }

    async fn rating_count(&self, seller: &WalletAddress) -> Result<u64, ChainError> {
        self.gate().await?;
        let state = self.state.read().await;
        Ok(state.reputation.get(seller).map(|(_, count)| *count).unwrap_or_default())
    }

    async fn past_events(
        &self,
        escrow_order_id: u64,
        from_block: u64,
        to_block: Option<u64>,
    ) -> Result<Vec<ChainEvent>, ChainError> {
        self.gate().await?;
        let state = self.state.read().await;
        let to_block = to_block.unwrap_or(u64::MAX);
        Ok(state
            .events
            .iter()
            .filter(|e| e.block_number >= from_block && e.block_number <= to_block)
            .filter(|e| e.order_id() == Some(escrow_order_id))
            .cloned()
            .collect())
    }

    async fn block_timestamp(&self, block_number: u64) -> Result<DateTime<Utc>, ChainError> {
        self.gate().await?;
        let state = self.state.read().await;
        usize::try_from(block_number)
            .ok()
            .and_then(|n| state.blocks.get(n).copied())
            .ok_or_else(|| ChainError::MalformedResponse(format!("Block {block_number} does not exist")))
    }

    async fn transaction(&self, tx_hash: &str) -> Result<Option<TxInfo>, ChainError> {
        self.gate().await?;
        let state = self.state.read().await;
        Ok(state.transactions.get(&tx_hash.to_ascii_lowercase()).map(|(info, _)| info.clone()))
    }

    async fn transaction_receipt(&self, tx_hash: &str) -> Result<Option<TxReceipt>, ChainError> {
        self.gate().await?;
        let state = self.state.read().await;
        Ok(state.transactions.get(&tx_hash.to_ascii_lowercase()).and_then(|(_, receipt)| receipt.clone()))
    }
}
