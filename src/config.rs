use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "TumorFindingsMiner";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Tag written to the `ai_model` column of every row this miner produces.
pub const MINER_TAG: &str = "RULES_MINER_V1";

/// Database filename shared by the miner and the dashboard.
pub const DB_FILENAME: &str = "tumor_findings_patients.db";

/// Default tracing filter when RUST_LOG is not set.
pub fn default_log_filter() -> String {
    format!("info,{}=debug", env!("CARGO_PKG_NAME").replace('-', "_"))
}

/// Get the application data directory
/// ~/TumorFindingsMiner/ on all platforms (user-visible, shared with ops)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join(APP_NAME)
}

/// Resolve the SQLite database path.
///
/// `DB_PATH` env var wins (the deployment sets it to a mounted volume);
/// otherwise the database lives in the app data directory.
pub fn db_path() -> PathBuf {
    match env::var("DB_PATH") {
        Ok(p) if !p.trim().is_empty() => PathBuf::from(p.trim()),
        _ => app_data_dir().join(DB_FILENAME),
    }
}

/// Resolve the HTTP bind address (`BIND_ADDR` env, localhost default).
pub fn bind_addr() -> SocketAddr {
    env::var("BIND_ADDR")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 8787)))
}
