//! HTTP implementation of [`Probe`].
//!
//! Every probe is a single `GET <base><candidate>` through a shared
//! [`reqwest::Client`] built from an explicit [`ProbeConfig`]. Only hit
//! responses have their body read; the title comes from `<title>`, falling
//! back to the first `<h1>`.
use std::{error::Error as StdError, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, redirect::Policy};
use scraper::{Html, Selector};

use super::{NetworkErrorKind, Probe, ProbeError, ProbeResult, is_hit};
use crate::{error::Error, utils::TargetUrl};

/// Settings for the HTTP client shared by all probes of a run.
///
/// # Defaults
/// ```rust,ignore
/// ProbeConfig {
///     timeout: Duration::from_secs(5),
///     user_agent: "Mozilla/5.0".into(),
///     accept_invalid_certs: true,
///     follow_redirects: true,
/// }
/// ```
#[derive(Clone, Debug)]
pub struct ProbeConfig {
    /// Deadline for the whole request, body included.
    pub timeout: Duration,
    pub user_agent: String,
    /// Skips certificate validation. Targets are routinely self-signed test
    /// hosts, so the default is `true`; it only ever affects clients built
    /// from this config.
    pub accept_invalid_certs: bool,
    /// Follow up to 10 redirects and classify the final response.
    pub follow_redirects: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            user_agent: "Mozilla/5.0".to_string(),
            accept_invalid_certs: true,
            follow_redirects: true,
        }
    }
}

impl ProbeConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    pub fn build_client(&self) -> Result<Client, Error> {
        let redirect = if self.follow_redirects {
            Policy::limited(10)
        } else {
            Policy::none()
        };

        Ok(Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.as_str())
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .redirect(redirect)
            .build()?)
    }
}

/// Probes candidates under one base URL.
#[derive(Clone, Debug)]
pub struct HttpProbe {
    client: Client,
    target: TargetUrl,
}

impl HttpProbe {
    pub fn new(target: TargetUrl, config: &ProbeConfig) -> Result<Self, Error> {
        Ok(Self::with_client(target, config.build_client()?))
    }

    pub fn with_client(target: TargetUrl, client: Client) -> Self {
        Self { client, target }
    }

    pub fn target(&self) -> &TargetUrl {
        &self.target
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn probe(&self, candidate: &str) -> Result<ProbeResult, ProbeError> {
        let url = self.target.candidate_url(candidate);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| network_error(candidate, e))?;

        let status = response.status().as_u16();
        if !is_hit(status) {
            return Ok(ProbeResult::miss(candidate, status));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| network_error(candidate, e))?;
        let title = extract_title(&String::from_utf8_lossy(&body));

        Ok(ProbeResult::hit(candidate, status, body.len(), title))
    }
}

/// The page title on a single line: `<title>` if the document has one
/// (even when empty), else the first `<h1>`, else `""`.
pub fn extract_title(html: &str) -> String {
    let document = Html::parse_document(html);
    let title = first_text(&document, "title")
        .or_else(|| first_text(&document, "h1"))
        .unwrap_or_default();
    title.replace('\n', " ").replace('\r', "")
}

fn first_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()
        .map(|element| element.text().collect())
}

fn network_error(candidate: &str, err: reqwest::Error) -> ProbeError {
    let kind = if err.is_timeout() {
        NetworkErrorKind::Timeout
    } else if is_tls_failure(&err) {
        NetworkErrorKind::TlsFailure
    } else if err.is_connect() {
        NetworkErrorKind::ConnectionFailure
    } else {
        NetworkErrorKind::Protocol
    };
    ProbeError::network(candidate, kind, err)
}

// reqwest does not expose TLS failures as a category; they surface as
// connect errors whose source chain mentions the handshake or certificate.
fn is_tls_failure(err: &reqwest::Error) -> bool {
    let mut source: Option<&(dyn StdError + 'static)> = err.source();
    while let Some(e) = source {
        let msg = e.to_string().to_ascii_lowercase();
        if msg.contains("tls") || msg.contains("certificate") || msg.contains("handshake") {
            return true;
        }
        source = e.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, Route};

    fn probe_for(base: &str, config: &ProbeConfig) -> HttpProbe {
        HttpProbe::new(TargetUrl::new(base).unwrap(), config).unwrap()
    }

    #[test]
    fn test_extract_title_prefers_title_tag() {
        let html = "<html><head><title>Admin</title></head><body><h1>Other</h1></body></html>";
        assert_eq!(extract_title(html), "Admin");
    }

    #[test]
    fn test_extract_title_falls_back_to_h1() {
        let html = "<html><body><h1>Welcome\r\nhome</h1><h1>Second</h1></body></html>";
        assert_eq!(extract_title(html), "Welcome home");
    }

    #[test]
    fn test_extract_title_empty_title_tag_wins() {
        let html = "<html><head><title></title></head><body><h1>Ignored</h1></body></html>";
        assert_eq!(extract_title(html), "");
    }

    #[test]
    fn test_extract_title_non_html_body() {
        assert_eq!(extract_title("{\"status\":\"ok\"}"), "");
        assert_eq!(extract_title(""), "");
    }

    #[test]
    fn test_probe_config_defaults() {
        let config = ProbeConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.user_agent, "Mozilla/5.0");
        assert!(config.accept_invalid_certs);
        assert!(config.follow_redirects);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_http_probe_classifies_and_reads_hits_only() {
        let admin = "<html><head><title>Admin</title></head></html>";
        let server = testing::spawn(vec![
            ("/admin", Route::new(200, admin)),
            ("/robots.txt", Route::new(500, "oops")),
            ("/hidden", Route::new(403, "<title>Forbidden</title>")),
        ])
        .await;
        let probe = probe_for(&server.base_url(), &ProbeConfig::default());

        let hit = probe.probe("admin").await.unwrap();
        assert_eq!(hit, ProbeResult::hit("admin", 200, admin.len(), "Admin"));

        let error_page = probe.probe("robots.txt").await.unwrap();
        assert_eq!(error_page, ProbeResult::hit("robots.txt", 500, 4, ""));

        let forbidden = probe.probe("hidden").await.unwrap();
        assert_eq!(forbidden, ProbeResult::miss("hidden", 403));

        let root = probe.probe("").await.unwrap();
        assert_eq!(root, ProbeResult::miss("", 404));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_http_probe_sends_user_agent() {
        let server = testing::spawn(vec![("/ua", Route::new(200, ""))]).await;
        let probe = probe_for(&server.base_url(), &ProbeConfig::default());

        probe.probe("ua").await.unwrap();

        let requests = server.requests.lock();
        let head = requests[0].to_ascii_lowercase();
        assert!(head.starts_with("get /ua "));
        assert!(head.contains("user-agent: mozilla/5.0"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_http_probe_timeout() {
        let server = testing::spawn(vec![(
            "/slow",
            Route::new(200, "late").delayed(Duration::from_secs(2)),
        )])
        .await;
        let config = ProbeConfig::default().with_timeout(Duration::from_millis(200));
        let probe = probe_for(&server.base_url(), &config);

        let err = probe.probe("slow").await.unwrap_err();
        assert_eq!(err.kind(), NetworkErrorKind::Timeout);
        assert_eq!(err.candidate(), "slow");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_http_probe_connection_refused() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let probe = probe_for(&format!("http://{addr}/"), &ProbeConfig::default());
        let err = probe.probe("admin").await.unwrap_err();
        assert_eq!(err.kind(), NetworkErrorKind::ConnectionFailure);
    }
}
