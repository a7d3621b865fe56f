use chrono::{DateTime, Duration, Utc};
use log::*;

use crate::{
    helpers::truncate_to_millis,
    mirror_types::{Order, OrderId},
    tokens::{
        payload::{PayClaims, TokenClaims, TokenKind, TrackClaims},
        signer::{decode, encode, TokenError, TokenSigner},
    },
};

pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 15;

#[derive(Clone, Debug)]
pub struct TokenSettings {
    pub chain_id: u64,
    /// The escrow contract buyers pay into. Embedded in pay tokens so the pay page needs no extra lookup.
    pub contract_address: String,
    pub ttl: Duration,
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self { chain_id: 1337, contract_address: String::default(), ttl: Duration::minutes(DEFAULT_TOKEN_TTL_MINUTES) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub claims: TokenClaims,
    /// True when the presented token was handed back unchanged rather than a new one being minted.
    pub reused: bool,
}

/// Applies the link issuance policy for `/pay/{id}` and `/track/{id}`.
///
/// If the request already carries a token that verifies, is of the right kind, and is bound to the requested order,
/// that exact token is returned, so refreshing a page keeps the same link. Anything else (no token, garbage, a bad
/// signature, an expired token, or a token for another order) results in a fresh token with a new nonce and
/// `expiry = now + ttl`.
#[derive(Clone, Debug)]
pub struct TokenIssuer {
    signer: TokenSigner,
    settings: TokenSettings,
}

impl TokenIssuer {
    pub fn new(signer: TokenSigner, settings: TokenSettings) -> Self {
        Self { signer, settings }
    }

    pub fn settings(&self) -> &TokenSettings {
        &self.settings
    }

    pub fn issue_pay_token(&self, order: &Order, presented: Option<&str>) -> Result<IssuedToken, TokenError> {
        self.issue_pay_token_at(order, presented, Utc::now())
    }

    pub fn issue_pay_token_at(
        &self,
        order: &Order,
        presented: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError> {
        if let Some(reused) = self.reusable(presented, TokenKind::Pay, order.id, now) {
            return Ok(reused);
        }
        let claims = TokenClaims::Pay(PayClaims {
            order_id: order.id,
            amount_eth: order.total_price().to_eth_string(),
            seller_wallet: order.seller_wallet.clone(),
            chain_id: self.settings.chain_id,
            contract_address: self.settings.contract_address.clone(),
            expiry: self.expiry_from(now),
            nonce: new_nonce(),
        });
        self.mint(claims)
    }

    pub fn issue_track_token(&self, order: &Order, presented: Option<&str>) -> Result<IssuedToken, TokenError> {
        self.issue_track_token_at(order, presented, Utc::now())
    }

    pub fn issue_track_token_at(
        &self,
        order: &Order,
        presented: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError> {
        if let Some(reused) = self.reusable(presented, TokenKind::Track, order.id, now) {
            return Ok(reused);
        }
        let claims = TokenClaims::Track(TrackClaims {
            order_id: order.id,
            status: order.status,
            chain_id: self.settings.chain_id,
            expiry: self.expiry_from(now),
            nonce: new_nonce(),
        });
        self.mint(claims)
    }

    pub fn verify_token(&self, token: &str) -> Result<TokenClaims, TokenError> {
        self.verify_token_at(token, Utc::now())
    }

    pub fn verify_token_at(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, TokenError> {
        self.signer.verify_encoded(token, now)
    }

    fn expiry_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        truncate_to_millis(now + self.settings.ttl)
    }

    fn mint(&self, claims: TokenClaims) -> Result<IssuedToken, TokenError> {
        let signed = self.signer.sign(claims);
        let token = encode(&signed)?;
        debug!(
            "🎟️ Minted {} token for order {} (expires {})",
            signed.claims.kind(),
            signed.claims.order_id(),
            signed.claims.expiry()
        );
        Ok(IssuedToken { token, claims: signed.claims, reused: false })
    }

    fn reusable(
        &self,
        presented: Option<&str>,
        kind: TokenKind,
        order_id: OrderId,
        now: DateTime<Utc>,
    ) -> Option<IssuedToken> {
        let token = presented.map(str::trim).filter(|t| !t.is_empty())?;
        let data = decode(token)?;
        match self.signer.verify(&data, now) {
            Ok(claims) if claims.kind() == kind && claims.order_id() == order_id => {
                trace!("🎟️ Reusing {kind} token for order {order_id}");
                Some(IssuedToken { token: token.to_string(), claims, reused: true })
            },
            Ok(claims) => {
                debug!(
                    "🎟️ Presented {} token is bound to order {}, not {kind} for {order_id}. Minting a new one.",
                    claims.kind(),
                    claims.order_id()
                );
                None
            },
            Err(e) => {
                debug!("🎟️ Presented {kind} token for order {order_id} is not reusable. {e}");
                None
            },
        }
    }
}

fn new_nonce() -> String {
    hex::encode(rand::random::<[u8; 16]>())
}

/// Relative (or `base_url`-prefixed) link to the pay page carrying `token`.
pub fn pay_link(base_url: &str, order_id: OrderId, token: &str) -> String {
    format!("{}/pay/{}?token={token}", base_url.trim_end_matches('/'), order_id.value())
}

/// Relative (or `base_url`-prefixed) link to the tracking page carrying `token`.
pub fn track_link(base_url: &str, order_id: OrderId, token: &str) -> String {
    format!("{}/track/{}?token={token}", base_url.trim_end_matches('/'), order_id.value())
}

#[cfg(test)]
mod test {
    use ceg_common::{Secret, Wei};

    use super::*;
    use crate::mirror_types::{
        BuyerInfo,
        ChainCorrelation,
        OrderStatusType,
        ProductId,
        WalletAddress,
    };

    fn issuer() -> TokenIssuer {
        let signer = TokenSigner::new(&Secret::new("issuer-secret".to_string())).unwrap();
        TokenIssuer::new(signer, TokenSettings { contract_address: "0xESCROW".into(), ..Default::default() })
    }

    fn order(id: i64) -> Order {
        Order {
            id: OrderId(id),
            product_id: ProductId(3),
            product_name: "Orbit Ghost Mech".into(),
            quantity: 2,
            unit_price: Wei::from_eth_str("0.5").unwrap(),
            buyer_wallet: WalletAddress::new("0xBBB"),
            seller_wallet: WalletAddress::new("0xAAA"),
            status: OrderStatusType::AwaitingShipment,
            buyer_info: BuyerInfo::default(),
            correlation: ChainCorrelation::default(),
            created_at: Utc::now(),
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

    #[test]
    fn pay_token_carries_order_total() {
        let issued = issuer().issue_pay_token(&order(1), None).unwrap();
        assert!(!issued.reused);
        match &issued.claims {
            TokenClaims::Pay(c) => {
                assert_eq!(c.amount_eth, "1");
                assert_eq!(c.seller_wallet, WalletAddress::new("0xaaa"));
                assert_eq!(c.contract_address, "0xESCROW");
                assert_eq!(c.nonce.len(), 32);
            },
            other => panic!("Expected a pay token, got {other:?}"),
        }
        assert_eq!(issuer().verify_token(&issued.token).unwrap(), issued.claims);
    }

    #[test]
    fn same_order_within_ttl_reuses_token() {
        let issuer = issuer();
        let now = Utc::now();
        let first = issuer.issue_track_token_at(&order(1), None, now).unwrap();
        let later = now + Duration::minutes(10);
        let second = issuer.issue_track_token_at(&order(1), Some(&first.token), later).unwrap();
        assert!(second.reused);
        assert_eq!(second.token, first.token);
        assert_eq!(second.claims.nonce(), first.claims.nonce());
    }

    #[test]
    fn expired_token_is_reminted() {
        let issuer = issuer();
        let now = Utc::now();
        let first = issuer.issue_pay_token_at(&order(1), None, now).unwrap();
        let later = now + Duration::minutes(16);
        let second = issuer.issue_pay_token_at(&order(1), Some(&first.token), later).unwrap();
        assert!(!second.reused);
        assert_ne!(second.claims.nonce(), first.claims.nonce());
        assert!(second.claims.expiry() > later);
    }

    #[test]
    fn other_order_or_kind_is_reminted() {
        let issuer = issuer();
        let first = issuer.issue_pay_token(&order(1), None).unwrap();
        let other_order = issuer.issue_pay_token(&order(2), Some(&first.token)).unwrap();
        assert!(!other_order.reused);
        assert_eq!(other_order.claims.order_id(), OrderId(2));
        let other_kind = issuer.issue_track_token(&order(1), Some(&first.token)).unwrap();
        assert!(!other_kind.reused);
        assert_eq!(other_kind.claims.kind(), TokenKind::Track);
    }

    #[test]
    fn garbage_is_reminted() {
        let issued = issuer().issue_track_token(&order(1), Some("definitely-not-a-token")).unwrap();
        assert!(!issued.reused);
    }

    #[test]
    fn links() {
        assert_eq!(pay_link("", OrderId(4), "abc"), "/pay/4?token=abc");
        assert_eq!(track_link("https://shop.example/", OrderId(4), "abc"), "https://shop.example/track/4?token=abc");
    }
}
