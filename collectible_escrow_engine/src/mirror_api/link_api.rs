use chrono::{DateTime, Utc};
use log::*;

use crate::{
    mirror_api::OrderFlowError,
    mirror_types::OrderId,
    order_store::OrderStore,
    tokens::{pay_link, track_link, IssuedToken, TokenClaims, TokenIssuer},
};

/// A shareable link plus the token it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLink {
    pub url: String,
    pub token: IssuedToken,
}

/// Resolves `/pay/{id}` and `/track/{id}` requests into signed links for orders in the mirror.
#[derive(Debug, Clone)]
pub struct LinkApi {
    store: OrderStore,
    issuer: TokenIssuer,
    base_url: String,
}

impl LinkApi {
    pub fn new<S: Into<String>>(store: OrderStore, issuer: TokenIssuer, base_url: S) -> Self {
        Self { store, issuer, base_url: base_url.into() }
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    pub async fn pay_link(&self, order_id: OrderId, presented: Option<&str>) -> Result<OrderLink, OrderFlowError> {
        self.pay_link_at(order_id, presented, Utc::now()).await
    }

    pub async fn pay_link_at(
        &self,
        order_id: OrderId,
        presented: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<OrderLink, OrderFlowError> {
        let order = self.store.read(|state| state.order(order_id).cloned()).await?;
        let token = self.issuer.issue_pay_token_at(&order, presented, now)?;
        let url = pay_link(&self.base_url, order_id, &token.token);
        trace!("🎟️ Pay link for order {order_id}: {url}");
        Ok(OrderLink { url, token })
    }

    pub async fn track_link(&self, order_id: OrderId, presented: Option<&str>) -> Result<OrderLink, OrderFlowError> {
        self.track_link_at(order_id, presented, Utc::now()).await
    }

    pub async fn track_link_at(
        &self,
        order_id: OrderId,
        presented: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<OrderLink, OrderFlowError> {
        let order = self.store.read(|state| state.order(order_id).cloned()).await?;
        let token = self.issuer.issue_track_token_at(&order, presented, now)?;
        let url = track_link(&self.base_url, order_id, &token.token);
        trace!("🎟️ Track link for order {order_id}: {url}");
        Ok(OrderLink { url, token })
    }

    /// Checks a presented token and returns its claims. The claimed order must still exist.
    pub async fn verify_token(&self, token: &str) -> Result<TokenClaims, OrderFlowError> {
        let claims = self.issuer.verify_token(token)?;
        let order_id = claims.order_id();
        self.store.read(|state| state.order(order_id).map(|_| ())).await?;
        Ok(claims)
    }
}
