//! Cookie normalization — one contract for every account construction path.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw cookie input as it appears in an accounts file: either an
/// already-structured map or a single `;`-delimited header string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum CookieSource {
    Map(BTreeMap<String, String>),
    Header(String),
}

impl Default for CookieSource {
    fn default() -> Self {
        CookieSource::Map(BTreeMap::new())
    }
}

/// Normalize a raw cookie representation into a key → value map.
///
/// Malformed segments (missing `=`, empty name) are skipped with a warning,
/// never fatal. Empty input yields an empty map.
pub fn resolve_cookies(raw: &CookieSource) -> BTreeMap<String, String> {
    match raw {
        CookieSource::Map(map) => map.clone(),
        CookieSource::Header(header) => {
            let mut cookies = BTreeMap::new();
            for segment in header.split(';') {
                let segment = segment.trim();
                if segment.is_empty() {
                    continue;
                }
                match segment.split_once('=') {
                    Some((name, value)) if !name.trim().is_empty() => {
                        cookies.insert(name.trim().to_string(), value.trim().to_string());
                    }
                    _ => {
                        tracing::warn!("skipping malformed cookie segment: {segment:?}");
                    }
                }
            }
            cookies
        }
    }
}
