//! Subscriber setup for the platforms the core ships on.
//!
//! iOS goes to os_log plus `<data_dir>/pongo.log` (os_log filtering on device
//! hides debug lines). Android goes to logcat. Everything else, including the
//! CLI and tests, writes to stderr. `RUST_LOG` overrides the default filter
//! everywhere.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "pongo_core=debug,info";
#[cfg(any(target_os = "ios", test))]
const LOG_FILE: &str = "pongo.log";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

#[cfg(any(target_os = "ios", test))]
fn log_path(data_dir: &str) -> std::path::PathBuf {
    std::path::Path::new(data_dir).join(LOG_FILE)
}

/// Called once from `FfiApp::new()`. Later calls keep the first subscriber.
pub fn init_logging(data_dir: &str) {
    #[cfg(target_os = "ios")]
    {
        use tracing_subscriber::prelude::*;

        let _ = std::fs::create_dir_all(data_dir);
        let file_layer = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path(data_dir))
            .ok()
            .map(|file| {
                tracing_subscriber::fmt::layer()
                    .with_writer(std::sync::Mutex::new(file))
                    .with_ansi(false)
            });

        let _ = tracing_subscriber::registry()
            .with(env_filter())
            .with(tracing_oslog::OsLogger::new("com.pongo.app", "core"))
            .with(file_layer)
            .try_init();
    }

    #[cfg(target_os = "android")]
    {
        use tracing_subscriber::prelude::*;

        let _ = tracing_subscriber::registry()
            .with(paranoid_android::layer("pongo").with_filter(env_filter()))
            .try_init();
    }

    #[cfg(not(any(target_os = "ios", target_os = "android")))]
    {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_writer(std::io::stderr)
            .try_init();
    }

    tracing::debug!(data_dir, "logging ready");
}
