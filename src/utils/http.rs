use std::time::Duration;

use reqwest::Client;

/// Timeouts and pooling for the provider HTTP clients.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub tcp_keepalive: Option<Duration>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
            pool_max_idle_per_host: 4,
            tcp_keepalive: Some(Duration::from_secs(30)),
        }
    }
}

/// Build a long-lived client shared by every request to one provider.
///
/// Connections are kept idle in the pool between turns so the next request
/// skips the TCP and TLS handshakes.
pub fn build_http_client(config: &HttpClientConfig) -> reqwest::Result<Client> {
    Client::builder()
        .pool_idle_timeout(None)
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .tcp_keepalive(config.tcp_keepalive)
        .tcp_nodelay(true)
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout)
        .user_agent(concat!("voiceform/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Join a base URL and a path without doubling or dropping the slash.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
