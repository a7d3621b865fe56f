mod wei;

pub mod op;
mod secret;

pub use secret::Secret;
pub use wei::{Wei, WeiConversionError, ETH_CURRENCY_CODE, WEI_PER_ETH};
