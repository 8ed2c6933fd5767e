//! Server configuration read from the environment.

use std::path::PathBuf;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_SETTINGS_DIR: &str = "settings";

/// Runtime configuration of the billing server.
///
/// | Variable | Default |
/// |---|---|
/// | `BILLING_BIND_ADDR` | `127.0.0.1:3000` |
/// | `BILLING_SETTINGS_DIR` | `settings` |
///
/// Log filtering is controlled separately through `RUST_LOG`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Address the HTTP server binds to.
    pub bind_addr: String,
    /// Directory holding the persisted settings blob.
    pub settings_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            settings_dir: PathBuf::from(DEFAULT_SETTINGS_DIR),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: lookup("BILLING_BIND_ADDR")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.bind_addr),
            settings_dir: lookup("BILLING_SETTINGS_DIR")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.settings_dir),
        }
    }
}
