use anyhow::{Context, Result, anyhow, bail};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_valid::Validate;
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
};

/// Authoritative alarm clock configuration
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceConfig {
    #[validate(maximum = 100)]
    pub brightness: u8,
    pub clock_format_string: String,
    pub blink_segment: String,
    #[validate(exclusive_minimum = 0.0)]
    pub refresh_timeout_in_secs: f64,
    pub alarm_duration_in_mins: u32,
    pub powernap_duration_in_mins: u32,
    #[validate(minimum = 0.0)]
    #[validate(maximum = 1.0)]
    pub default_volume: f64,
    pub use_analog_clock: bool,
    pub alarm_preview_hours: u32,
    pub debug_level: u8,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            brightness: 15,
            clock_format_string: "%-H<blinkSegment>%M".to_string(),
            blink_segment: ":".to_string(),
            refresh_timeout_in_secs: 0.25,
            alarm_duration_in_mins: 60,
            powernap_duration_in_mins: 18,
            default_volume: 0.5,
            use_analog_clock: false,
            alarm_preview_hours: 12,
            debug_level: 0,
        }
    }
}

/// Shared, optionally file backed, [`DeviceConfig`]
#[derive(Clone, Debug)]
pub struct ConfigStore {
    config: Arc<Mutex<DeviceConfig>>,
    // serializes file writes so the file never ends up older than `config`
    write_lock: Arc<Mutex<()>>,
    path: Option<PathBuf>,
}

impl ConfigStore {
    /// Store that never touches the file system
    pub fn in_memory(config: DeviceConfig) -> Self {
        Self {
            config: Arc::new(Mutex::new(config)),
            write_lock: Arc::default(),
            path: None,
        }
    }

    /// Load the configuration persisted at `path`
    ///
    /// A missing file yields the defaults, missing fields are filled with
    /// their default values.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let config = match fs::read_to_string(&path) {
            Ok(contents) => {
                let config: DeviceConfig = serde_json::from_str(&contents)
                    .context(format!("failed to parse config file {path:?}"))?;
                config
                    .validate()
                    .map_err(|e| anyhow!("invalid config file {path:?}: {e}"))?;
                config
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("no config file at {path:?}, using defaults");
                DeviceConfig::default()
            }
            Err(e) => return Err(e).context(format!("failed to read config file {path:?}")),
        };

        Ok(Self {
            config: Arc::new(Mutex::new(config)),
            write_lock: Arc::default(),
            path: Some(path),
        })
    }

    pub fn snapshot(&self) -> DeviceConfig {
        self.config
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Apply query style `(field, value)` pairs and return the resulting configuration
    ///
    /// Each value is converted to the type the field already has. An empty
    /// value resets the field to its default, unknown fields are skipped.
    /// Nothing is committed if any value is rejected.
    pub fn apply(&self, changes: &[(String, String)]) -> Result<DeviceConfig> {
        let mut current = self.config.lock().unwrap_or_else(PoisonError::into_inner);

        let mut fields = to_fields(&current)?;
        let defaults = to_fields(&DeviceConfig::default())?;

        for (key, raw) in changes {
            let Some(existing) = fields.get(key) else {
                warn!("ignoring unknown configuration field: {key}");
                continue;
            };

            let value = if raw.is_empty() {
                defaults
                    .get(key)
                    .cloned()
                    .context(format!("failed to find default for {key}"))?
            } else {
                coerce(key, existing, raw)?
            };

            fields.insert(key.clone(), value);
        }

        let candidate: DeviceConfig = serde_json::from_value(Value::Object(fields))
            .context("failed to convert configuration values")?;

        candidate
            .validate()
            .map_err(|e| anyhow!("invalid configuration: {e}"))?;

        if candidate == *current {
            return Ok(candidate);
        }

        info!("configuration updated: {changes:?}");
        *current = candidate.clone();
        drop(current);

        if let Err(e) = self.persist() {
            error!("failed to persist configuration: {e:#}");
        }

        Ok(candidate)
    }

    /// Write the latest configuration to the backing file, if any
    ///
    /// Runs without holding the configuration lock.
    fn persist(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let _write_guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let config = self.snapshot();

        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).context("failed to create config directory")?;
        }

        write_config(path, &config)
    }
}

fn write_config(path: &Path, config: &DeviceConfig) -> Result<()> {
    let json = serde_json::to_string_pretty(config).context("failed to serialize configuration")?;
    fs::write(path, json).context(format!("failed to write config file {path:?}"))
}

fn to_fields(config: &DeviceConfig) -> Result<Map<String, Value>> {
    match serde_json::to_value(config).context("failed to serialize configuration")? {
        Value::Object(fields) => Ok(fields),
        other => bail!("unexpected configuration representation: {other}"),
    }
}

/// Convert `raw` to the JSON type of the field's current value
fn coerce(key: &str, existing: &Value, raw: &str) -> Result<Value> {
    match existing {
        Value::Bool(_) => Ok(Value::Bool(matches!(
            raw.to_lowercase().as_str(),
            "on" | "yes" | "true" | "t" | "1"
        ))),
        Value::Number(number) if number.is_f64() => {
            let float = raw
                .parse::<f64>()
                .context(format!("failed to parse {key}: '{raw}' is not a number"))?;
            serde_json::Number::from_f64(float)
                .map(Value::Number)
                .context(format!("failed to parse {key}: '{raw}' is not finite"))
        }
        Value::Number(_) => raw
            .parse::<i64>()
            .map(Value::from)
            .context(format!("failed to parse {key}: '{raw}' is not an integer")),
        _ => Ok(Value::String(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn pairs(changes: &[(&str, &str)]) -> Vec<(String, String)> {
        changes
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_on_the_wire() {
        let json = serde_json::to_value(DeviceConfig::default()).expect("failed to serialize");

        assert_eq!(json["brightness"], 15);
        assert_eq!(json["clockFormatString"], "%-H<blinkSegment>%M");
        assert_eq!(json["blinkSegment"], ":");
        assert_eq!(json["useAnalogClock"], false);
    }

    #[test]
    fn test_apply_coerces_to_field_types() {
        let store = ConfigStore::in_memory(DeviceConfig::default());

        let config = store
            .apply(&pairs(&[
                ("brightness", "80"),
                ("clockFormatString", "HH:mm"),
                ("defaultVolume", "0.75"),
                ("useAnalogClock", "On"),
            ]))
            .expect("apply failed");

        assert_eq!(config.brightness, 80);
        assert_eq!(config.clock_format_string, "HH:mm");
        assert_eq!(config.default_volume, 0.75);
        assert!(config.use_analog_clock);
        assert_eq!(store.snapshot(), config);
    }

    #[test]
    fn test_apply_bool_false_for_other_values() {
        let store = ConfigStore::in_memory(DeviceConfig {
            use_analog_clock: true,
            ..Default::default()
        });

        let config = store
            .apply(&pairs(&[("useAnalogClock", "off")]))
            .expect("apply failed");

        assert!(!config.use_analog_clock);
    }

    #[test]
    fn test_apply_ignores_unknown_fields() {
        let store = ConfigStore::in_memory(DeviceConfig::default());

        let config = store
            .apply(&pairs(&[("volume", "11"), ("debugLevel", "2")]))
            .expect("apply failed");

        assert_eq!(config.debug_level, 2);
        assert_eq!(
            DeviceConfig {
                debug_level: 0,
                ..config
            },
            DeviceConfig::default()
        );
    }

    #[test]
    fn test_apply_empty_value_resets_default() {
        let store = ConfigStore::in_memory(DeviceConfig {
            brightness: 3,
            blink_segment: " ".to_string(),
            ..Default::default()
        });

        let config = store
            .apply(&pairs(&[("brightness", ""), ("blinkSegment", "")]))
            .expect("apply failed");

        assert_eq!(config.brightness, 15);
        assert_eq!(config.blink_segment, ":");
    }

    #[test]
    fn test_apply_rejects_invalid_values_atomically() {
        let store = ConfigStore::in_memory(DeviceConfig::default());

        for changes in [
            pairs(&[("clockFormatString", "HH"), ("brightness", "bright")]),
            pairs(&[("clockFormatString", "HH"), ("brightness", "300")]),
            pairs(&[("clockFormatString", "HH"), ("brightness", "101")]),
            pairs(&[("clockFormatString", "HH"), ("defaultVolume", "1.5")]),
            pairs(&[("clockFormatString", "HH"), ("refreshTimeoutInSecs", "0")]),
        ] {
            assert!(store.apply(&changes).is_err(), "accepted {changes:?}");
        }

        assert_eq!(store.snapshot(), DeviceConfig::default());
    }

    #[test]
    fn test_apply_without_changes_returns_current() {
        let store = ConfigStore::in_memory(DeviceConfig::default());

        assert_eq!(store.apply(&[]).expect("apply failed"), DeviceConfig::default());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().expect("failed to create temp directory");

        let store = ConfigStore::load(temp_dir.path().join("config.json")).expect("load failed");

        assert_eq!(store.snapshot(), DeviceConfig::default());
    }

    #[test]
    fn test_load_fills_missing_fields() {
        let temp_dir = TempDir::new().expect("failed to create temp directory");
        let path = temp_dir.path().join("config.json");
        fs::write(&path, r#"{"brightness": 42}"#).expect("failed to write config");

        let store = ConfigStore::load(&path).expect("load failed");

        assert_eq!(
            store.snapshot(),
            DeviceConfig {
                brightness: 42,
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let temp_dir = TempDir::new().expect("failed to create temp directory");
        let path = temp_dir.path().join("config.json");
        fs::write(&path, r#"{"defaultVolume": 3.0}"#).expect("failed to write config");

        assert!(ConfigStore::load(&path).is_err());
    }

    #[test]
    fn test_apply_persists_changes() {
        let temp_dir = TempDir::new().expect("failed to create temp directory");
        let path = temp_dir.path().join("config").join("config.json");
        let store = ConfigStore::load(&path).expect("load failed");

        store
            .apply(&pairs(&[("brightness", "9"), ("alarmPreviewHours", "6")]))
            .expect("apply failed");

        let reloaded = ConfigStore::load(&path).expect("reload failed");
        assert_eq!(reloaded.snapshot().brightness, 9);
        assert_eq!(reloaded.snapshot().alarm_preview_hours, 6);
    }

    #[test]
    fn test_concurrent_applies_leave_latest_config_on_disk() {
        let temp_dir = TempDir::new().expect("failed to create temp directory");
        let path = temp_dir.path().join("config.json");
        let store = ConfigStore::load(&path).expect("load failed");

        std::thread::scope(|scope| {
            for brightness in 20..40 {
                let store = store.clone();
                scope.spawn(move || {
                    store
                        .apply(&pairs(&[("brightness", &brightness.to_string())]))
                        .expect("apply failed");
                });
            }
        });

        let reloaded = ConfigStore::load(&path).expect("reload failed");
        assert_eq!(reloaded.snapshot(), store.snapshot());
    }

    #[test]
    fn test_failed_write_keeps_update_in_memory() {
        let temp_dir = TempDir::new().expect("failed to create temp directory");
        let config_dir = temp_dir.path().join("config");
        let store = ConfigStore::load(config_dir.join("config.json")).expect("load failed");
        // a plain file where the config directory should be
        fs::write(&config_dir, "").expect("failed to create file");

        let config = store
            .apply(&pairs(&[("brightness", "42")]))
            .expect("apply failed");

        assert_eq!(config.brightness, 42);
        assert_eq!(store.snapshot().brightness, 42);
    }

    #[test]
    fn test_unchanged_config_is_not_written() {
        let temp_dir = TempDir::new().expect("failed to create temp directory");
        let path = temp_dir.path().join("config.json");
        let store = ConfigStore::load(&path).expect("load failed");

        store
            .apply(&pairs(&[("brightness", "15")]))
            .expect("apply failed");

        assert!(!path.exists());
    }
}
