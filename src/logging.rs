use std::io::Write;

use log::LevelFilter;

use crate::config::LoggingConfig;

/// Initialize the process-wide logger from configuration. Safe to call
/// more than once; later calls are no-ops.
pub fn init_logging(config: &LoggingConfig) {
    let level = match config.level.as_str() {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    };

    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_level(level);

    if config.format == "json" {
        builder.format(|buf, record| {
            let entry = serde_json::json!({
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "level": record.level().to_string(),
                "target": record.target(),
                "message": record.args().to_string(),
            });
            writeln!(buf, "{}", entry)
        });
    } else {
        builder.format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}: {}",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            )
        });
    }

    let _ = builder.try_init();
}
