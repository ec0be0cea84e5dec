use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Lifeline";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default bind address for the API server.
pub const DEFAULT_BIND: &str = "127.0.0.1:7380";

/// Default reverse-geocoding endpoint (Nominatim-compatible).
pub const DEFAULT_GEOCODE_ENDPOINT: &str = "https://nominatim.openstreetmap.org/reverse";

/// Get the application data directory
/// ~/Lifeline/ on all platforms (user-visible, overridable via LIFELINE_DATA_DIR)
pub fn app_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("LIFELINE_DATA_DIR") {
        return PathBuf::from(dir);
    }
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Lifeline")
}

/// Path of the SQLite database file.
pub fn database_path() -> PathBuf {
    app_data_dir().join("lifeline.db")
}

/// Bind address for the API server (LIFELINE_BIND overrides the default).
pub fn bind_addr() -> SocketAddr {
    std::env::var("LIFELINE_BIND")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| DEFAULT_BIND.parse().expect("default bind is valid"))
}

/// Reverse-geocoding endpoint (LIFELINE_GEOCODE_URL overrides the default).
pub fn geocode_endpoint() -> String {
    std::env::var("LIFELINE_GEOCODE_URL")
        .unwrap_or_else(|_| DEFAULT_GEOCODE_ENDPOINT.to_string())
}

/// Default tracing filter when RUST_LOG is not set.
pub fn default_log_filter() -> String {
    format!("info,{}=debug", env!("CARGO_PKG_NAME"))
}
