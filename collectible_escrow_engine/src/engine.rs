use log::*;
use thiserror::Error;

use crate::{
    audit::{AuditLog, Reconciler, TransactionDetails},
    chain::{ChainOracle, SellerReputation},
    config::{ConfigError, EngineConfig},
    events::{EventHandlers, EventHooks},
    mirror_api::{CartApi, LinkApi, OrderFlowApi, OrderFlowError, StatsApi},
    mirror_types::{OrderId, Product, WalletAddress},
    order_store::{MirrorState, OrderStore},
    tokens::{TokenError, TokenIssuer, TokenSigner},
};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error. {0}")]
    Config(#[from] ConfigError),
    #[error("Could not set up link signing. {0}")]
    Token(#[from] TokenError),
}

/// Everything a storefront needs, wired onto one mirror and one chain oracle.
///
/// The APIs are public fields so callers can clone out just the handle they need.
#[derive(Debug, Clone)]
pub struct MarketEngine<C> {
    pub store: OrderStore,
    pub cart: CartApi,
    pub orders: OrderFlowApi,
    pub stats: StatsApi,
    pub links: LinkApi,
    pub reconciler: Reconciler<C>,
}

impl<C: ChainOracle> MarketEngine<C> {
    /// Builds the engine and starts a handler task for every registered hook, so this must be called from within a
    /// Tokio runtime.
    pub fn new(config: &EngineConfig, chain: C, catalog: Vec<Product>, hooks: EventHooks) -> Result<Self, EngineError> {
        let signer = TokenSigner::new(&config.token_secret)?;
        let issuer = TokenIssuer::new(signer, config.token_settings());
        let store = OrderStore::new(MirrorState::with_catalog(catalog));
        let handlers = EventHandlers::new(config.event_buffer_size, hooks);
        let producers = handlers.producers();
        handlers.start_handlers();
        let engine = Self {
            cart: CartApi::new(store.clone()),
            orders: OrderFlowApi::new(store.clone(), producers),
            stats: StatsApi::new(store.clone(), config.ship_time_scale),
            links: LinkApi::new(store.clone(), issuer, config.base_url.clone()),
            reconciler: Reconciler::new(chain, config.chain_timeout),
            store,
        };
        info!("📦️ Market engine ready");
        Ok(engine)
    }

    /// The merged chain and mirror timeline for an order. Only an unknown order is an error; chain trouble degrades to
    /// a mirror-only log.
    pub async fn audit_log(&self, order_id: OrderId) -> Result<AuditLog, OrderFlowError> {
        let order = self.orders.fetch_order(order_id).await?;
        Ok(self.reconciler.build_audit_log(&order).await)
    }

    /// Details for every transaction the mirror has correlated with the order.
    pub async fn order_transactions(&self, order_id: OrderId) -> Result<Vec<TransactionDetails>, OrderFlowError> {
        let order = self.orders.fetch_order(order_id).await?;
        Ok(self.reconciler.order_transactions(&order).await)
    }

    pub async fn seller_reputation(&self, seller: &WalletAddress) -> Option<SellerReputation> {
        self.reconciler.seller_reputation(seller).await
    }
}
