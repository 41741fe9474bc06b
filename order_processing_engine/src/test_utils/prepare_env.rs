use log::*;

/// Load the test environment and initialise logging. Safe to call from every test; only the first call has any
/// effect.
pub fn prepare_test_env() {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
}
