//! Shared helpers

pub mod cron_helper;
pub mod http_client_factory;
pub mod url;

pub use http_client_factory::HttpClientFactory;
pub use url::UrlUtils;
