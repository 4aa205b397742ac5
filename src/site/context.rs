//! Per-account execution context.

use anyhow::Result;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::client::{BrowserClient, HttpClient};
use crate::config::{Account, RequesterConfig, SiteConfig};

/// Everything one account's task bodies can reach: the config records,
/// the resolved credentials, an isolated HTTP session seeded with the
/// account's cookies, and the optional shared browser handle.
pub struct SiteContext {
    request_conf: RequesterConfig,
    site_conf: SiteConfig,
    account: Account,
    http: HttpClient,
    use_browser: bool,
    browser: Option<Arc<BrowserClient>>,
}

impl SiteContext {
    pub fn new(
        request_conf: RequesterConfig,
        site_conf: SiteConfig,
        account: Account,
        use_browser: bool,
        browser: Option<Arc<BrowserClient>>,
    ) -> Result<Self> {
        let http = HttpClient::new(&request_conf, &account.cookies, site_conf.signin_url())?;
        Ok(Self {
            request_conf,
            site_conf,
            account,
            http,
            use_browser,
            browser,
        })
    }

    pub fn username(&self) -> &str {
        &self.account.username
    }

    pub fn password(&self) -> &str {
        &self.account.password
    }

    pub fn cookies(&self) -> &BTreeMap<String, String> {
        &self.account.cookies
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn request_conf(&self) -> &RequesterConfig {
        &self.request_conf
    }

    pub fn site_conf(&self) -> &SiteConfig {
        &self.site_conf
    }

    pub fn enabled(&self) -> bool {
        self.site_conf.enabled
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    pub fn use_browser(&self) -> bool {
        self.use_browser
    }

    pub fn browser(&self) -> Option<&Arc<BrowserClient>> {
        self.browser.as_ref()
    }
}
