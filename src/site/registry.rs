//! Site implementation registry.
//!
//! Concrete sites are variants satisfying the [`Site`] interface,
//! selected by name rather than by class hierarchy: lookup uses the
//! site's `variant` extension attribute when present, else the site
//! name itself.

use anyhow::{anyhow, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::context::SiteContext;
use super::runner::SiteRunner;
use super::Site;
use crate::sites;

type SiteBuilder = Arc<dyn Fn(SiteContext) -> Result<Box<dyn Site>> + Send + Sync>;

pub struct SiteRegistry {
    builders: BTreeMap<String, SiteBuilder>,
}

impl SiteRegistry {
    pub fn new() -> Self {
        Self {
            builders: BTreeMap::new(),
        }
    }

    /// A registry preloaded with the bundled variants.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register("http_checkin", sites::checkin::build);
        registry
    }

    pub fn register(
        &mut self,
        name: &str,
        builder: impl Fn(SiteContext) -> Result<Box<dyn Site>> + Send + Sync + 'static,
    ) {
        self.builders.insert(name.to_string(), Arc::new(builder));
    }

    pub fn variants(&self) -> Vec<&str> {
        self.builders.keys().map(String::as_str).collect()
    }

    /// Construct a runner for one account of the named site.
    pub fn build_runner(&self, site_name: &str, ctx: SiteContext) -> Result<SiteRunner> {
        let variant = match ctx.site_conf().attr("variant") {
            Ok(Value::String(name)) => name,
            _ => site_name.to_string(),
        };

        let builder = self.builders.get(&variant).ok_or_else(|| {
            anyhow!(
                "unknown site variant '{variant}' (registered: {})",
                self.variants().join(", ")
            )
        })?;

        let site = builder(ctx)?;
        Ok(SiteRunner::new(site))
    }
}

impl Default for SiteRegistry {
    fn default() -> Self {
        Self::new()
    }
}
