//! Persisted restaurant settings.
//!
//! Settings live as one JSON blob under [`SETTINGS_KEY`] in a key-value
//! store, shaped as `{ "gst": {...}, "restaurant": {...}, "printer":
//! {...} }`.  Billing owns the `gst` subtree and reads `restaurant`;
//! every other subtree is carried through untouched when the tax
//! configuration is saved.
//!
//! Reads fail open: a missing key, an unreadable store, corrupt JSON or
//! an invalid tax configuration all produce the documented defaults.
//! Writes fail closed and report validation and storage errors to the
//! caller.

use crate::error::{BillingError, Result};
use crate::models::{RestaurantInfo, TaxConfig};
use crate::tax::validate_tax_config;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Storage key of the settings blob.
pub const SETTINGS_KEY: &str = "restaurantSettings";

const GST_SECTION: &str = "gst";
const RESTAURANT_SECTION: &str = "restaurant";

/// A string key-value store holding settings.
///
/// Implementations must be thread-safe (`Send + Sync`) because the HTTP
/// layer shares one store between requests.
pub trait SettingsRepository: Send + Sync {
    /// Returns the value stored under `key`, or `None` if there is none.
    fn get(&self, key: &str) -> Result<Option<String>>;
    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// In-process store, mainly for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsRepository for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Stores each key as `<dir>/<key>.json`.
///
/// Writes go to a temporary file that is then renamed over the target,
/// so a crash mid-write leaves the previous value in place.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl SettingsRepository for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let target = self.path_for(key);
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &target)?;
        debug!(path = ?target, "settings written");
        Ok(())
    }
}

/// Parse the raw blob, logging and discarding anything that is not a
/// JSON object.
fn parse_blob(raw: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => {
            warn!(key = SETTINGS_KEY, "settings blob is not a JSON object, ignoring it");
            None
        }
        Err(err) => {
            warn!(key = SETTINGS_KEY, error = %err, "settings blob is corrupt, ignoring it");
            None
        }
    }
}

fn read_blob<R: SettingsRepository + ?Sized>(repo: &R) -> Option<Map<String, Value>> {
    match repo.get(SETTINGS_KEY) {
        Ok(Some(raw)) => parse_blob(&raw),
        Ok(None) => None,
        Err(err) => {
            warn!(key = SETTINGS_KEY, error = %err, "failed to read settings, using defaults");
            None
        }
    }
}

fn read_section_value<R: SettingsRepository + ?Sized>(repo: &R, section: &str) -> Option<Value> {
    read_blob(repo)?.remove(section).filter(|value| !value.is_null())
}

/// Deserialize one subtree of the blob over its defaults.
fn read_section<T, R>(repo: &R, section: &str) -> Option<T>
where
    T: DeserializeOwned,
    R: SettingsRepository + ?Sized,
{
    let value = read_section_value(repo, section)?;
    match serde_json::from_value(value) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            warn!(section, error = %err, "invalid settings section, using defaults");
            None
        }
    }
}

/// Overlay the fields present in `patch` on `base`.
///
/// A patch that sets `rate` without naming either component has the
/// rate split evenly between CGST and SGST, as in
/// [`TaxConfig::with_rate`].  The result is not validated.
pub fn merge_tax_config(base: &TaxConfig, patch: Value) -> Result<TaxConfig> {
    let Value::Object(patch) = patch else {
        return Err(BillingError::InvalidSettings(
            "GST settings must be a JSON object".to_string(),
        ));
    };
    let split_rate =
        patch.contains_key("rate") && !patch.contains_key("cgst") && !patch.contains_key("sgst");

    let mut merged = match serde_json::to_value(base)? {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    merged.extend(patch);
    let config: TaxConfig = serde_json::from_value(Value::Object(merged))
        .map_err(|err| BillingError::InvalidSettings(err.to_string()))?;

    if split_rate {
        let rate = config.rate;
        Ok(config.with_rate(rate))
    } else {
        Ok(config)
    }
}

/// Load the tax configuration, falling back to [`TaxConfig::default`].
///
/// The stored object is merged over the default with
/// [`merge_tax_config`].  A result that does not pass
/// [`validate_tax_config`] is replaced by the default as a whole.
pub fn load_tax_config<R: SettingsRepository + ?Sized>(repo: &R) -> TaxConfig {
    let Some(stored) = read_section_value(repo, GST_SECTION) else {
        return TaxConfig::default();
    };
    let config = match merge_tax_config(&TaxConfig::default(), stored) {
        Ok(config) => config,
        Err(err) => {
            warn!(error = %err, "invalid GST settings, using defaults");
            return TaxConfig::default();
        }
    };
    match validate_tax_config(&config) {
        Ok(()) => config,
        Err(err) => {
            warn!(error = %err, "stored GST settings are invalid, using defaults");
            TaxConfig::default()
        }
    }
}

/// Validate and persist the tax configuration.
///
/// The rest of the settings blob is preserved.  If the existing blob is
/// corrupt it is replaced by one holding only the tax configuration.
pub fn save_tax_config<R: SettingsRepository + ?Sized>(repo: &R, config: &TaxConfig) -> Result<()> {
    validate_tax_config(config)?;

    let existing = repo.get(SETTINGS_KEY)?;
    let mut blob = existing.as_deref().and_then(parse_blob).unwrap_or_default();
    blob.insert(GST_SECTION.to_string(), serde_json::to_value(config)?);
    repo.set(SETTINGS_KEY, &serde_json::to_string(&Value::Object(blob))?)?;

    info!(
        enabled = config.enabled,
        rate = %config.rate,
        cgst = %config.cgst,
        sgst = %config.sgst,
        "GST settings saved"
    );
    Ok(())
}

/// Load the restaurant details printed on receipts, falling back to
/// [`RestaurantInfo::default`].
pub fn load_restaurant_info<R: SettingsRepository + ?Sized>(repo: &R) -> RestaurantInfo {
    read_section(repo, RESTAURANT_SECTION).unwrap_or_default()
}
