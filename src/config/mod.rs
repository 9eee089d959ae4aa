use crate::error::{ConfigurationError, Result};
use dashmap::DashMap;
use serde::{Deserialize, Deserializer};
use std::env;
use std::sync::Arc;
use std::time::Duration;

pub const STRICTNESS_KEY: &str = "MODULES_STRICTNESS";
pub const HOOK_TIMEOUT_KEY: &str = "MODULES_HOOK_TIMEOUT_MS";

const KEY_PREFIX: &str = "MODULES_";

/// How configuration errors (duplicates, unresolved dependencies) are treated.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Strictness {
    /// Abort on the first configuration error.
    Strict,
    /// Report configuration errors and keep going.
    #[default]
    Lenient,
}

impl Strictness {
    pub fn is_strict(self) -> bool {
        self == Strictness::Strict
    }
}

/// Settings for a [`ModulesHandler`](crate::lifecycle::ModulesHandler).
///
/// Deserializable so hosts can embed it in their own configuration files:
///
/// ```json
/// { "strictness": "strict", "hook_timeout_ms": 30000 }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HandlerConfig {
    pub strictness: Strictness,
    /// Upper bound for a single initialize / load / unload call.
    #[serde(rename = "hook_timeout_ms", deserialize_with = "deserialize_millis")]
    pub hook_timeout: Option<Duration>,
}

impl HandlerConfig {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_source(&ConfigSource::from_env())
    }

    /// Read `MODULES_STRICTNESS` and `MODULES_HOOK_TIMEOUT_MS` from `source`.
    /// Missing keys keep their defaults.
    pub fn from_source(source: &ConfigSource) -> Result<Self> {
        let mut config = Self::default();

        if let Some(raw) = source.setting(STRICTNESS_KEY) {
            config.strictness = raw
                .parse()
                .map_err(|_| ConfigurationError::invalid_value(STRICTNESS_KEY, &raw))?;
        }

        if let Some(raw) = source.setting(HOOK_TIMEOUT_KEY) {
            let millis: u64 = raw
                .parse()
                .map_err(|_| ConfigurationError::invalid_value(HOOK_TIMEOUT_KEY, &raw))?;
            config.hook_timeout = Some(Duration::from_millis(millis));
        }

        Ok(config)
    }
}

fn deserialize_millis<'de, D>(deserializer: D) -> std::result::Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
}

/// Snapshot of the `MODULES_*` settings a [`HandlerConfig`] is read from.
///
/// Values are trimmed on the way in; keys outside the `MODULES_` namespace are
/// dropped.
#[derive(Clone, Default)]
pub struct ConfigSource {
    settings: Arc<DashMap<String, String>>,
}

impl ConfigSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the handler's settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_pairs(env::vars())
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        pairs
            .into_iter()
            .fold(Self::default(), |source, (key, value)| source.with(key, value))
    }

    /// Add one setting, overriding an earlier value for the same key.
    pub fn with(self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let key = key.as_ref();
        if key.starts_with(KEY_PREFIX) {
            self.settings
                .insert(key.to_string(), value.as_ref().trim().to_string());
        }
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.settings.contains_key(key)
    }

    fn setting(&self, key: &str) -> Option<String> {
        self.settings.get(key).map(|entry| entry.value().clone())
    }
}
