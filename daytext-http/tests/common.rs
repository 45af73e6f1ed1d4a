use std::sync::OnceLock;

use daytext_common::observability::{LogConfig, LogFormat};

static INIT_PATH: OnceLock<std::path::PathBuf> = OnceLock::new();

/// Route test logs to stderr; `DAYTEXT_LOG_FORMAT=json` switches the format.
pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let json = std::env::var("DAYTEXT_LOG_FORMAT")
            .map(|raw| raw.trim().eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        let config = LogConfig {
            app_name: "daytext-tests",
            emit_stderr: true,
            format: if json { LogFormat::Json } else { LogFormat::Text },
            default_filter: "debug",
            ..LogConfig::default()
        };

        daytext_common::observability::init_logging(config).unwrap_or_default()
    });
}
