// Logging setup shared by the workspace binaries

/// Maps a `LOG_LEVEL` value to a filter; unknown values fall back to INFO.
pub fn level_filter_from_str(log_level: &str) -> log::LevelFilter {
    match log_level.trim().to_uppercase().as_str() {
        "OFF" => log::LevelFilter::Off,
        "ERROR" => log::LevelFilter::Error,
        "WARN" => log::LevelFilter::Warn,
        "INFO" => log::LevelFilter::Info,
        "DEBUG" => log::LevelFilter::Debug,
        "TRACE" => log::LevelFilter::Trace,
        _ => log::LevelFilter::Info,
    }
}

/// Builds an env_logger builder at `log_level`, with the chattier HTTP
/// internals capped at WARN unless tracing is requested.
pub fn logger_builder(log_level: &str) -> env_logger::Builder {
    let level_filter = level_filter_from_str(log_level);
    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_level(level_filter);

    if level_filter < log::LevelFilter::Trace {
        builder.filter_module("hyper", log::LevelFilter::Warn);
        builder.filter_module("reqwest", log::LevelFilter::Warn);
        builder.filter_module("actix_server", log::LevelFilter::Warn);
    }

    builder
}

/// Initializes the global logger from `LOG_LEVEL`. Safe to call more than
/// once; later calls are ignored.
pub fn init_logging() {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "INFO".to_string());

    if logger_builder(&log_level).try_init().is_ok() {
        log::debug!("Logging system initialized at {}", log_level);
    }
}
