//! Typed materialization of raw config documents.
//!
//! Each getter extracts the relevant section, drops keys outside the
//! record's known field set (one warning per record), fills gaps with
//! defaults, and returns the record together with the dropped-key
//! diagnostics so callers can assert on what was discarded.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use super::cookies::CookieSource;
use super::error::{ConfigError, ConfigResult};
use super::loader::RawDocument;
use super::models::{Account, DebugConfig, RequesterConfig, SiteConfig, TaskerConfig};

/// A materialized record plus the diagnostics produced along the way.
#[derive(Debug, Clone)]
pub struct Materialized<T> {
    pub value: T,
    /// Unknown keys dropped from the raw section, sorted by name.
    pub dropped_keys: Vec<String>,
}

/// Adapter over a parsed site-config document.
pub struct ConfigAdapter {
    raw: Arc<RawDocument>,
}

impl ConfigAdapter {
    pub fn new(raw: Arc<RawDocument>) -> Self {
        Self { raw }
    }

    pub fn from_map(raw: RawDocument) -> Self {
        Self::new(Arc::new(raw))
    }

    fn section(&self, outer: &str, inner: &str) -> Map<String, Value> {
        self.raw
            .get(outer)
            .and_then(|v| v.get(inner))
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default()
    }

    fn materialize<T: DeserializeOwned>(
        record: &str,
        known: &[&str],
        mut section: Map<String, Value>,
    ) -> ConfigResult<Materialized<T>> {
        let mut dropped: Vec<String> = section
            .keys()
            .filter(|k| !known.contains(&k.as_str()))
            .cloned()
            .collect();
        dropped.sort();

        if !dropped.is_empty() {
            section.retain(|k, _| known.contains(&k.as_str()));
            tracing::warn!("ignoring unknown keys for {record}: {}", dropped.join(", "));
        }

        let value = serde_json::from_value(Value::Object(section))?;
        Ok(Materialized {
            value,
            dropped_keys: dropped,
        })
    }

    pub fn requester_config(&self) -> ConfigResult<Materialized<RequesterConfig>> {
        let m: Materialized<RequesterConfig> = Self::materialize(
            "RequesterConfig",
            RequesterConfig::FIELDS,
            self.section("global", "requests"),
        )?;
        Ok(Materialized {
            value: m.value.normalized(),
            dropped_keys: m.dropped_keys,
        })
    }

    pub fn tasker_config(&self) -> ConfigResult<Materialized<TaskerConfig>> {
        let m: Materialized<TaskerConfig> = Self::materialize(
            "TaskerConfig",
            TaskerConfig::FIELDS,
            self.section("global", "runtime"),
        )?;
        Ok(Materialized {
            value: m.value.normalized(),
            dropped_keys: m.dropped_keys,
        })
    }

    pub fn debug_config(&self) -> ConfigResult<Materialized<DebugConfig>> {
        Self::materialize(
            "DebugConfig",
            DebugConfig::FIELDS,
            self.section("global", "debug"),
        )
    }

    /// Names of all configured sites, in document order.
    pub fn site_names(&self) -> Vec<String> {
        self.raw
            .get("sites")
            .and_then(Value::as_object)
            .map(|sites| sites.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Materialize one site's config. Unknown keys are preserved verbatim
    /// as extension attributes, never filtered. A missing block yields the
    /// defaults; a present non-mapping block is a type error.
    pub fn site_config(&self, site: &str) -> ConfigResult<SiteConfig> {
        match self.raw.get("sites").and_then(|sites| sites.get(site)) {
            None => Ok(SiteConfig::default()),
            Some(Value::Object(block)) => {
                Ok(serde_json::from_value(Value::Object(block.clone()))?)
            }
            Some(other) => Err(ConfigError::InvalidSiteBlock {
                site: site.to_string(),
                found: json_type_name(other),
            }),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "table",
    }
}

/// The full nested account registry: site → account key → [`Account`].
pub type AccountRegistry = BTreeMap<String, BTreeMap<String, Account>>;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AccountSpec {
    username: String,
    password: String,
    cookies: CookieSource,
}

/// Adapter over a parsed accounts document. The registry is built exactly
/// once per adapter; later `parse()` calls return the cached result even
/// if the raw source could have changed.
pub struct AccountsAdapter {
    raw: Arc<RawDocument>,
    registry: OnceLock<AccountRegistry>,
}

impl AccountsAdapter {
    pub fn new(raw: Arc<RawDocument>) -> Self {
        Self {
            raw,
            registry: OnceLock::new(),
        }
    }

    pub fn from_map(raw: RawDocument) -> Self {
        Self::new(Arc::new(raw))
    }

    /// Parse all sites and accounts once and cache the registry.
    pub fn parse(&self) -> &AccountRegistry {
        self.registry.get_or_init(|| {
            let mut registry = AccountRegistry::new();
            for (site_name, site_block) in self.raw.iter() {
                let accounts_block = site_block
                    .get("accounts")
                    .and_then(Value::as_object)
                    .cloned()
                    .unwrap_or_default();

                let mut parsed = BTreeMap::new();
                for (user_key, data) in accounts_block {
                    match serde_json::from_value::<AccountSpec>(data) {
                        Ok(spec) => {
                            parsed.insert(
                                user_key,
                                Account::new(&spec.username, &spec.password, spec.cookies),
                            );
                        }
                        Err(e) => {
                            tracing::warn!(
                                "skipping malformed account '{user_key}' for site '{site_name}': {e}"
                            );
                        }
                    }
                }
                registry.insert(site_name.clone(), parsed);
            }
            tracing::debug!("account registry parsed: {} site(s)", registry.len());
            registry
        })
    }

    /// All accounts for a site; an unknown site yields an empty mapping.
    pub fn accounts(&self, site: &str) -> &BTreeMap<String, Account> {
        static EMPTY: BTreeMap<String, Account> = BTreeMap::new();
        self.parse().get(site).unwrap_or(&EMPTY)
    }

    /// A single account; missing site or user key is a lookup error.
    pub fn account(&self, site: &str, user: &str) -> ConfigResult<&Account> {
        self.accounts(site)
            .get(user)
            .ok_or_else(|| ConfigError::UnknownAccount {
                site: site.to_string(),
                user: user.to_string(),
            })
    }
}
