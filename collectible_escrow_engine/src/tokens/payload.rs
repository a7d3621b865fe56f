use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::mirror_types::{OrderId, OrderStatusType, WalletAddress};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Pay,
    Track,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pay => write!(f, "pay"),
            Self::Track => write!(f, "track"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayClaims {
    pub order_id: OrderId,
    pub amount_eth: String,
    pub seller_wallet: WalletAddress,
    pub chain_id: u64,
    pub contract_address: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub expiry: DateTime<Utc>,
    pub nonce: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackClaims {
    pub order_id: OrderId,
    pub status: OrderStatusType,
    pub chain_id: u64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub expiry: DateTime<Utc>,
    pub nonce: String,
}

/// The unsigned body of a link token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TokenClaims {
    Pay(PayClaims),
    Track(TrackClaims),
}

impl TokenClaims {
    pub fn kind(&self) -> TokenKind {
        match self {
            Self::Pay(_) => TokenKind::Pay,
            Self::Track(_) => TokenKind::Track,
        }
    }

    pub fn order_id(&self) -> OrderId {
        match self {
            Self::Pay(c) => c.order_id,
            Self::Track(c) => c.order_id,
        }
    }

    pub fn expiry(&self) -> DateTime<Utc> {
        match self {
            Self::Pay(c) => c.expiry,
            Self::Track(c) => c.expiry,
        }
    }

    pub fn nonce(&self) -> &str {
        match self {
            Self::Pay(c) => &c.nonce,
            Self::Track(c) => &c.nonce,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expiry()
    }

    /// The string the signature is computed over. Field order is part of the wire format and must not change.
    pub fn canonical_string(&self) -> String {
        match self {
            Self::Pay(c) => [
                c.order_id.value().to_string(),
                c.amount_eth.clone(),
                c.seller_wallet.to_string(),
                c.chain_id.to_string(),
                c.contract_address.clone(),
                c.expiry.timestamp_millis().to_string(),
                c.nonce.clone(),
            ]
            .join("|"),
            Self::Track(c) => [
                c.order_id.value().to_string(),
                c.status.to_string(),
                c.chain_id.to_string(),
                c.expiry.timestamp_millis().to_string(),
                c.nonce.clone(),
            ]
            .join("|"),
        }
    }
}

/// Claims plus their signature. On the wire the signature sits alongside the claim fields as `sig`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedToken {
    pub claims: TokenClaims,
    pub sig: String,
}

impl SignedToken {
    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        let mut value = serde_json::to_value(&self.claims)?;
        if let Value::Object(fields) = &mut value {
            fields.insert("sig".to_string(), Value::String(self.sig.clone()));
        }
        Ok(value)
    }
}

#[cfg(test)]
mod test {
    use chrono::TimeZone;

    use super::*;

    fn expiry() -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_715_000_000_000).unwrap()
    }

    #[test]
    fn pay_canonical_order() {
        let claims = TokenClaims::Pay(PayClaims {
            order_id: OrderId(7),
            amount_eth: "1".into(),
            seller_wallet: "0xAAA".into(),
            chain_id: 1337,
            contract_address: "0xC0FFEE".into(),
            expiry: expiry(),
            nonce: "abc".into(),
        });
        assert_eq!(claims.canonical_string(), "7|1|0xAAA|1337|0xC0FFEE|1715000000000|abc");
    }

    #[test]
    fn track_canonical_order() {
        let claims = TokenClaims::Track(TrackClaims {
            order_id: OrderId(7),
            status: OrderStatusType::Shipped,
            chain_id: 5,
            expiry: expiry(),
            nonce: "abc".into(),
        });
        assert_eq!(claims.canonical_string(), "7|Shipped|5|1715000000000|abc");
    }

    #[test]
    fn json_shape() {
        let token = SignedToken {
            claims: TokenClaims::Track(TrackClaims {
                order_id: OrderId(2),
                status: OrderStatusType::AwaitingShipment,
                chain_id: 5,
                expiry: expiry(),
                nonce: "n".into(),
            }),
            sig: "ff".into(),
        };
        let json = token.to_json().unwrap();
        assert_eq!(json["type"], "track");
        assert_eq!(json["order_id"], 2);
        assert_eq!(json["status"], "AwaitingShipment");
        assert_eq!(json["expiry"], 1_715_000_000_000i64);
        assert_eq!(json["sig"], "ff");
    }
}
