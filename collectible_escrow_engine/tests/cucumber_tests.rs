mod cucumber;

use ::cucumber::{writer, World};
use log::*;
use tokio::runtime::Runtime;

use crate::cucumber::MarketWorld;

fn main() {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    let sys = Runtime::new().unwrap();
    sys.block_on(MarketWorld::cucumber().with_writer(writer::Libtest::or_basic()).run("tests/features"));
    info!("🚀️ Tests complete");
}
