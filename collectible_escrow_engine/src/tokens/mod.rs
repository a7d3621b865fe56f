//! # Pay and track link tokens
//!
//! Payment instructions and order tracking pages are shared as plain links (`/pay/{id}?token=…`,
//! `/track/{id}?token=…`). The token carries everything the page needs and proves it was minted by this server, so no
//! session store is required.
//!
//! ## Format
//!
//! A token is the URL-safe base64 (no padding) encoding of a JSON object:
//!
//! ```text
//!   {"type":"pay","order_id":7,"amount_eth":"1","seller_wallet":"0xAAA","chain_id":1337,
//!    "contract_address":"0xE5C…","expiry":1715000000000,"nonce":"9f…","sig":"3a…"}
//! ```
//!
//! `sig` is the lowercase hex HMAC-SHA-256 of the claim fields joined with `|` in a fixed order:
//!
//! * pay: `order_id|amount_eth|seller_wallet|chain_id|contract_address|expiry|nonce`
//! * track: `order_id|status|chain_id|expiry|nonce`
//!
//! `expiry` is a unix timestamp in milliseconds.
//!
//! ## Trust
//!
//! A valid token only shows that this server issued it for that order within the last TTL window. Anyone holding the
//! link can replay it to view the page. Tokens never authorize state changes; those go through
//! [`crate::access_control`] with the acting wallet.
mod issuer;
mod payload;
mod signer;

pub use issuer::{pay_link, track_link, IssuedToken, TokenIssuer, TokenSettings, DEFAULT_TOKEN_TTL_MINUTES};
pub use payload::{PayClaims, SignedToken, TokenClaims, TokenKind, TrackClaims};
pub use signer::{decode, encode, TokenError, TokenSigner};
