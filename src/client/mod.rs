//! Network clients: the resilient HTTP session and the browser handle.

pub mod browser;
pub mod http;

pub use browser::BrowserClient;
pub use http::HttpClient;
