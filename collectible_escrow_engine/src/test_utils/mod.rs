mod prepare_env;

pub use prepare_env::{prepare_test_env, test_config, test_engine, TEST_TOKEN_SECRET};
