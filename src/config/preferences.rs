use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

/// Preference keys written by the client's settings screens.
pub mod keys {
    pub const PASSTHROUGH: &str = "passthrough";
    pub const PASSTHROUGH_TAP: &str = "passthrough_tap";
    pub const PASSTHROUGH_DELAY: &str = "passthrough_delay";
    pub const PASSTHROUGH_LOWER: &str = "passthrough_lower";
    pub const PASSTHROUGH_UPPER: &str = "passthrough_upper";
    pub const PASSTHROUGH_FRACTION: &str = "passthrough_fraction";
    pub const PASSTHROUGH_RECORDING: &str = "passthrough_recording";
}

/// Key/value preference access.
///
/// Numeric settings are stored as text, so readers go through [`read_parsed`]
/// rather than asking the store for numbers.
pub trait ConfigStore {
    fn get_bool(&self, key: &str) -> Option<bool>;
    fn get_string(&self, key: &str) -> Option<String>;
    fn put_bool(&mut self, key: &str, value: bool);
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum PreferenceValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

/// In-memory preference map. Serializes as a flat YAML mapping.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct PreferenceStore {
    values: BTreeMap<String, PreferenceValue>,
}

impl PreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, value: PreferenceValue) {
        self.values.insert(key.to_string(), value);
    }

    pub fn with_text(mut self, key: &str, value: &str) -> Self {
        self.insert(key, PreferenceValue::Text(value.to_string()));
        self
    }

    pub fn with_bool(mut self, key: &str, value: bool) -> Self {
        self.insert(key, PreferenceValue::Bool(value));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ConfigStore for PreferenceStore {
    fn get_bool(&self, key: &str) -> Option<bool> {
        match self.values.get(key)? {
            PreferenceValue::Bool(value) => Some(*value),
            PreferenceValue::Text(text) => text.parse().ok(),
            PreferenceValue::Number(_) => None,
        }
    }

    fn get_string(&self, key: &str) -> Option<String> {
        match self.values.get(key)? {
            PreferenceValue::Text(text) => Some(text.clone()),
            PreferenceValue::Number(number) => Some(number.to_string()),
            PreferenceValue::Bool(value) => Some(value.to_string()),
        }
    }

    fn put_bool(&mut self, key: &str, value: bool) {
        self.insert(key, PreferenceValue::Bool(value));
    }
}

pub fn read_bool<S: ConfigStore + ?Sized>(store: &S, key: &str, default: bool) -> bool {
    store.get_bool(key).unwrap_or(default)
}

/// Reads a text preference and parses it, falling back to `default` when the
/// key is missing, unparsable or rejected by `valid`.
pub fn read_parsed<S, T>(store: &S, key: &str, default: T, valid: impl Fn(&T) -> bool) -> T
where
    S: ConfigStore + ?Sized,
    T: FromStr + Display + Copy,
{
    let Some(raw) = store.get_string(key) else {
        return default;
    };
    match raw.trim().parse::<T>() {
        Ok(value) if valid(&value) => value,
        _ => {
            log::warn!(
                "preference {} has invalid value {:?}, using default {}",
                key,
                raw,
                default
            );
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_use_defaults() {
        let store = PreferenceStore::new();
        assert!(read_bool(&store, keys::PASSTHROUGH_TAP, true));
        assert_eq!(read_parsed(&store, keys::PASSTHROUGH_DELAY, 600i64, |_| true), 600);
    }

    #[test]
    fn garbage_text_falls_back() {
        let store = PreferenceStore::new()
            .with_text(keys::PASSTHROUGH_DELAY, "soon")
            .with_text(keys::PASSTHROUGH_LOWER, "0,8");
        assert_eq!(read_parsed(&store, keys::PASSTHROUGH_DELAY, 600i64, |_| true), 600);
        assert_eq!(read_parsed(&store, keys::PASSTHROUGH_LOWER, 0.8f32, |_| true), 0.8);
    }

    #[test]
    fn validator_rejects_values() {
        let store = PreferenceStore::new().with_text(keys::PASSTHROUGH_DELAY, "-5");
        assert_eq!(read_parsed(&store, keys::PASSTHROUGH_DELAY, 600i64, |v| *v > 0), 600);
    }

    #[test]
    fn text_values_are_trimmed() {
        let store = PreferenceStore::new().with_text(keys::PASSTHROUGH_UPPER, " 3.5 ");
        assert_eq!(read_parsed(&store, keys::PASSTHROUGH_UPPER, 4.0f32, |_| true), 3.5);
    }

    #[test]
    fn put_bool_overwrites_text() {
        let mut store = PreferenceStore::new().with_text(keys::PASSTHROUGH, "true");
        assert_eq!(store.get_bool(keys::PASSTHROUGH), Some(true));
        store.put_bool(keys::PASSTHROUGH, false);
        assert_eq!(store.get_bool(keys::PASSTHROUGH), Some(false));
    }
}
