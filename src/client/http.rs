//! Resilient HTTP client wrapping reqwest.
//!
//! Carries default headers and a per-account cookie jar, and applies two
//! deliberately different retry policies: GET trusts a fixed status
//! allow-list with linear sleeps, while non-idempotent verbs run an
//! explicit application-level loop with exponential backoff — transport
//! auto-retry is unsafe for them without an idempotency guarantee.

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::{RequestBuilder, Response};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::config::RequesterConfig;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/136.0.0.0 Safari/537.36 Edg/136.0.0.0";

const DEFAULT_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
const DEFAULT_ACCEPT_LANGUAGE: &str = "en,zh;q=0.9,zh-CN;q=0.8";

/// Server/overload statuses worth an automatic retry for safe methods.
const STATUS_FORCELIST: [u16; 5] = [429, 500, 502, 503, 504];

/// Per-account HTTP client with a persistent session cookie jar.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    retry_times: u32,
    retry_interval: f64,
    request_interval: f64,
}

impl HttpClient {
    /// Build a session from the requester config, seeding the cookie jar
    /// with the account's resolved cookies scoped to the signin origin.
    pub fn new(
        config: &RequesterConfig,
        cookies: &BTreeMap<String, String>,
        signin_url: Option<&str>,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(DEFAULT_ACCEPT));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(DEFAULT_ACCEPT_LANGUAGE));

        let user_agent: &str = if config.user_agent.is_empty() {
            DEFAULT_USER_AGENT
        } else {
            config.user_agent.as_str()
        };

        let jar = Arc::new(reqwest::cookie::Jar::default());
        if !cookies.is_empty() {
            match signin_url.map(Url::parse) {
                Some(Ok(origin)) => {
                    for (name, value) in cookies {
                        jar.add_cookie_str(&format!("{name}={value}"), &origin);
                    }
                }
                Some(Err(e)) => {
                    tracing::warn!("cannot seed cookies, invalid signin_url: {e}");
                }
                None => {
                    tracing::warn!("cannot seed cookies without a signin_url");
                }
            }
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs_f64(config.timeout.max(0.0)))
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(user_agent)
            .default_headers(headers)
            .cookie_provider(jar)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            retry_times: config.retry_times,
            retry_interval: config.retry_interval.max(0.0),
            request_interval: config.request_interval.max(0.0),
        })
    }

    /// GET with the session-level retry policy: up to `retry_times`
    /// retries on transport errors and the status allow-list, sleeping
    /// `retry_interval × attempt` between tries. Any other non-success
    /// status fails immediately.
    pub async fn get(&self, url: &str, query: &[(String, String)]) -> Result<Response> {
        let mut attempt = 0u32;
        loop {
            let mut request = self.client.get(url);
            if !query.is_empty() {
                request = request.query(query);
            }

            match request.send().await {
                Ok(resp)
                    if STATUS_FORCELIST.contains(&resp.status().as_u16())
                        && attempt < self.retry_times =>
                {
                    let status = resp.status();
                    attempt += 1;
                    let delay = self.safe_retry_delay(attempt);
                    tracing::warn!(
                        "GET {url} returned {status}; retry {attempt}/{} in {delay:?}",
                        self.retry_times
                    );
                    tokio::time::sleep(delay).await;
                }
                Ok(resp) => return Ok(resp.error_for_status()?),
                Err(e) if attempt < self.retry_times => {
                    attempt += 1;
                    let delay = self.safe_retry_delay(attempt);
                    tracing::warn!(
                        "GET {url} transport error: {e}; retry {attempt}/{} in {delay:?}",
                        self.retry_times
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// POST url-encoded form data.
    pub async fn post_form<T: Serialize + ?Sized>(&self, url: &str, form: &T) -> Result<Response> {
        self.request_with_retry("POST", url, self.client.post(url).form(form))
            .await
    }

    /// POST a JSON body.
    pub async fn post_json<T: Serialize + ?Sized>(&self, url: &str, body: &T) -> Result<Response> {
        self.request_with_retry("POST", url, self.client.post(url).json(body))
            .await
    }

    /// PUT a JSON body.
    pub async fn put_json<T: Serialize + ?Sized>(&self, url: &str, body: &T) -> Result<Response> {
        self.request_with_retry("PUT", url, self.client.put(url).json(body))
            .await
    }

    /// PATCH a JSON body.
    pub async fn patch_json<T: Serialize + ?Sized>(&self, url: &str, body: &T) -> Result<Response> {
        self.request_with_retry("PATCH", url, self.client.patch(url).json(body))
            .await
    }

    pub async fn delete(&self, url: &str) -> Result<Response> {
        self.request_with_retry("DELETE", url, self.client.delete(url))
            .await
    }

    /// Explicit retry loop for non-idempotent verbs: at most
    /// `retry_times + 1` attempts on *any* transport failure or raised
    /// status, sleeping `retry_interval × 2^attempt` between attempts.
    /// The final failure propagates to the caller.
    async fn request_with_retry(
        &self,
        verb: &str,
        url: &str,
        request: RequestBuilder,
    ) -> Result<Response> {
        let mut attempt = 0u32;
        loop {
            let this_attempt = request
                .try_clone()
                .with_context(|| format!("{verb} {url}: request body is not retryable"))?;

            match this_attempt.send().await.and_then(|r| r.error_for_status()) {
                Ok(resp) => return Ok(resp),
                Err(e) if attempt < self.retry_times => {
                    let delay = self.backoff_delay(attempt);
                    tracing::warn!(
                        "{verb} {url} failed: {e}; retry {}/{} in {delay:?}",
                        attempt + 1,
                        self.retry_times
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Linear delay for safe-method retries (`attempt` is 1-based).
    fn safe_retry_delay(&self, attempt: u32) -> Duration {
        Duration::from_secs_f64(self.retry_interval * f64::from(attempt))
    }

    /// Exponential backoff for non-idempotent retries (`attempt` is
    /// zero-based): `retry_interval × 2^attempt`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        Duration::from_secs_f64(self.retry_interval * 2f64.powi(attempt as i32))
    }

    pub fn retry_times(&self) -> u32 {
        self.retry_times
    }

    pub fn retry_interval(&self) -> f64 {
        self.retry_interval
    }

    /// Base interval between consecutive requests, for task bodies that
    /// pace themselves.
    pub fn request_interval(&self) -> f64 {
        self.request_interval
    }
}
