//! Logging initialization

/// Initialize the logging system
///
/// Uses env_logger with default filter level of `info`.
/// Override with RUST_LOG environment variable, e.g.
/// `RUST_LOG=blockworld::streaming=trace`.
///
/// # Example
/// ```no_run
/// blockworld::core::logging::init();
/// log::info!("World started");
/// ```
pub fn init() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    )
    .format_timestamp_millis()
    .init();
}

/// Like [`init`], but safe to call more than once (tests, embedders that
/// already installed a logger).
pub fn try_init() -> bool {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    )
    .is_test(cfg!(test))
    .try_init()
    .is_ok()
}
