use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::Figment;
use figment::providers::Serialized;
use secrecy::SecretSlice;
use serde::{Deserialize, Deserializer};
use serde_with::{DisplayFromStr, serde_as};
use strum::{Display, EnumString};

use super::ConfigError;
use super::placeholder::resolve_placeholders;
use super::properties::parse_properties;

/// Environment variable naming the configuration directory
pub const CONFIG_PATH_VARIABLE: &str = "TRIPHASE_CONFIG_PATH";
pub const CONFIG_FILE_NAME: &str = "tps_config.properties";
pub const LEGACY_CONFIG_FILE_NAME: &str = "config.properties";

const DOCUMENT_MANAGER_KEY: &str = "document.manager";
const DOCUMENT_MANAGER_PARAMS_PREFIX: &str = "docmanager.";
const BUNDLED_CONFIG: &str = include_str!("../../config/tps_config.properties");

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeliveryMode {
    /// Signed documents are handed to the document manager
    #[default]
    Store,
    /// Signed documents are returned in the response
    Inline,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Bundled,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "file `{}`", path.display()),
            Self::Bundled => write!(f, "bundled defaults"),
        }
    }
}

/// Immutable service configuration, built once at startup.
#[serde_as]
#[derive(Debug, Deserialize)]
pub struct TriphaseConfig {
    #[serde(rename = "document.manager")]
    document_manager: String,
    #[serde(rename = "Access-Control-Allow-Origin", default = "default_allow_origin")]
    allow_origin: String,
    #[serde(
        rename = "verification.key",
        default,
        deserialize_with = "deserialize_verification_key"
    )]
    verification_key: Option<SecretSlice<u8>>,
    #[serde_as(as = "DisplayFromStr")]
    #[serde(rename = "batch.maxConcurrency", default = "default_max_concurrency")]
    batch_max_concurrency: usize,
    #[serde_as(as = "DisplayFromStr")]
    #[serde(rename = "batch.timeoutSeconds", default = "default_batch_timeout")]
    batch_timeout_seconds: u64,
    #[serde_as(as = "DisplayFromStr")]
    #[serde(rename = "session.ttlSeconds", default = "default_session_ttl")]
    session_ttl_seconds: u64,
    #[serde(rename = "signed.document.delivery", default)]
    delivery: DeliveryMode,
    #[serde(flatten)]
    other: BTreeMap<String, String>,
}

fn default_allow_origin() -> String {
    "*".to_owned()
}

fn default_max_concurrency() -> usize {
    8
}

fn default_batch_timeout() -> u64 {
    30
}

fn default_session_ttl() -> u64 {
    600
}

fn deserialize_verification_key<'de, D>(deserializer: D) -> Result<Option<SecretSlice<u8>>, D::Error>
where
    D: Deserializer<'de>,
{
    let key = Option::<String>::deserialize(deserializer)?;
    Ok(key
        .filter(|key| !key.is_empty())
        .map(|key| SecretSlice::from(key.into_bytes())))
}

impl TriphaseConfig {
    /// Loads the configuration from the directory in [`CONFIG_PATH_VARIABLE`], falling
    /// back to the bundled defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let dir = std::env::var_os(CONFIG_PATH_VARIABLE).map(PathBuf::from);
        Self::load_from_dir(dir.as_deref())
    }

    pub fn load_from_dir(dir: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(dir, Some(BUNDLED_CONFIG), env_lookup)
    }

    pub(crate) fn load_with(
        dir: Option<&Path>,
        bundled: Option<&str>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let (source, content) = locate_source(dir, bundled)?;
        tracing::info!("Loading configuration from {source}");
        Self::parse(&content, lookup)
    }

    /// Parses properties text, resolving `${name}` placeholders through `lookup`.
    pub fn parse(
        content: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let resolved: BTreeMap<String, String> = parse_properties(content)?
            .into_iter()
            .map(|(key, value)| {
                let value = resolve_placeholders(&value, &lookup);
                (key, value)
            })
            .collect();

        if !resolved.contains_key(DOCUMENT_MANAGER_KEY) {
            return Err(ConfigError::MissingKey(DOCUMENT_MANAGER_KEY));
        }

        Figment::from(Serialized::defaults(resolved))
            .extract()
            .map_err(|e| ConfigError::Parsing(e.to_string()))
    }

    pub fn document_manager(&self) -> &str {
        &self.document_manager
    }

    pub fn allow_origin(&self) -> &str {
        &self.allow_origin
    }

    pub fn verification_key(&self) -> Option<&SecretSlice<u8>> {
        self.verification_key.as_ref()
    }

    pub fn batch_max_concurrency(&self) -> usize {
        self.batch_max_concurrency.max(1)
    }

    pub fn batch_timeout(&self) -> Duration {
        Duration::from_secs(self.batch_timeout_seconds)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_seconds)
    }

    pub fn delivery(&self) -> DeliveryMode {
        self.delivery
    }

    /// Parameters `docmanager.<name>.*` with the prefix stripped
    pub fn document_manager_params(&self, name: &str) -> BTreeMap<&str, &str> {
        let prefix = format!("{DOCUMENT_MANAGER_PARAMS_PREFIX}{name}.");
        self.other
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(&prefix)
                    .map(|param| (param, value.as_str()))
            })
            .collect()
    }

    /// Any key not mapped to a typed accessor
    pub fn property(&self, key: &str) -> Option<&str> {
        self.other.get(key).map(String::as_str)
    }
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn locate_source(
    dir: Option<&Path>,
    bundled: Option<&str>,
) -> Result<(ConfigSource, String), ConfigError> {
    if let Some(dir) = dir {
        for file_name in [CONFIG_FILE_NAME, LEGACY_CONFIG_FILE_NAME] {
            let path = dir.join(file_name);
            match std::fs::read_to_string(&path) {
                Ok(content) => return Ok((ConfigSource::File(path), content)),
                Err(error) => {
                    tracing::warn!("Cannot load configuration file {}: {error}", path.display())
                }
            }
        }
    }

    bundled
        .map(|content| (ConfigSource::Bundled, content.to_owned()))
        .ok_or(ConfigError::NotFound)
}
