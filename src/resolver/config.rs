// Resolver configuration: endpoints, mirrors, proxies and timeouts

use std::time::Duration;

/// How the backend's info endpoint is called
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendMethod {
    /// `POST {base}/api/info` with JSON body `{"url": ...}`
    #[default]
    Post,
    /// `GET {base}/api/info?url=...`
    Get,
}

pub const DEFAULT_INVIDIOUS_INSTANCES: &[&str] = &[
    "https://inv.nadeko.net",
    "https://invidious.nerdvpn.de",
    "https://yewtu.be",
];

pub const DEFAULT_CORS_PROXIES: &[&str] = &[
    "https://corsproxy.io/?",
    "https://api.allorigins.win/raw?url=",
    "https://cors-anywhere.herokuapp.com/",
];

/// `{id}` is replaced by the video id
pub const DEFAULT_REDIRECT_SERVICES: &[&str] = &[
    "https://ssyoutube.com/watch?v={id}",
    "https://yt5s.com/api/ajaxSearch/index?url=https://www.youtube.com/watch?v={id}",
];

/// Configuration for the resolution chain and download trigger
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Base URL of the optional backend server
    pub backend_url: Option<String>,
    pub backend_method: BackendMethod,
    /// Invidious hosts, tried in order
    pub invidious_instances: Vec<String>,
    /// CORS proxy prefixes; the encoded watch URL is appended
    pub cors_proxies: Vec<String>,
    pub oembed_endpoint: String,
    /// Duration enrichment after oEmbed; `None` disables it
    pub noembed_endpoint: Option<String>,
    /// Whether the HTML scrape step is part of the chain
    pub enable_scrape: bool,
    /// Base used to build watch URLs handed to oEmbed and proxies
    pub watch_base: String,
    /// SOCKS5/HTTP proxy URL for all requests
    pub proxy: Option<String>,
    pub user_agent: String,
    pub request_timeout: Duration,
    /// Bound on the backend health probe
    pub health_timeout: Duration,
    /// Redirect service templates; the first one is opened
    pub redirect_services: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            backend_url: None,
            backend_method: BackendMethod::Post,
            invidious_instances: to_strings(DEFAULT_INVIDIOUS_INSTANCES),
            cors_proxies: to_strings(DEFAULT_CORS_PROXIES),
            oembed_endpoint: "https://www.youtube.com/oembed".to_string(),
            noembed_endpoint: Some("https://noembed.com/embed".to_string()),
            enable_scrape: true,
            watch_base: "https://www.youtube.com".to_string(),
            proxy: None,
            user_agent: concat!("tubenova-fallback/", env!("CARGO_PKG_VERSION")).to_string(),
            request_timeout: Duration::from_secs(20),
            health_timeout: Duration::from_secs(5),
            redirect_services: to_strings(DEFAULT_REDIRECT_SERVICES),
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl ResolverConfig {
    /// Defaults overlaid with `TUBENOVA_*` environment variables.
    pub fn from_env() -> Self {
        Self::default().apply_env(|key| std::env::var(key).ok())
    }

    fn apply_env(mut self, get: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = get("TUBENOVA_BACKEND_URL").filter(|v| !v.trim().is_empty()) {
            self.backend_url = Some(url.trim().to_string());
        }
        if let Some(proxy) = get("TUBENOVA_PROXY").filter(|v| !v.trim().is_empty()) {
            self.proxy = Some(proxy.trim().to_string());
        }
        if let Some(list) = get("TUBENOVA_INVIDIOUS") {
            self.invidious_instances = split_list(&list);
        }
        if let Some(list) = get("TUBENOVA_CORS_PROXIES") {
            self.cors_proxies = split_list(&list);
        }
        if let Some(flag) = get("TUBENOVA_DISABLE_SCRAPE") {
            if matches!(flag.trim(), "1" | "true" | "yes") {
                self.enable_scrape = false;
            }
        }
        self
    }

    pub fn with_backend_url(mut self, url: Option<String>) -> Self {
        self.backend_url = url;
        self
    }

    pub fn with_backend_method(mut self, method: BackendMethod) -> Self {
        self.backend_method = method;
        self
    }

    pub fn with_invidious_instances(mut self, instances: Vec<String>) -> Self {
        self.invidious_instances = instances;
        self
    }

    pub fn with_cors_proxies(mut self, proxies: Vec<String>) -> Self {
        self.cors_proxies = proxies;
        self
    }

    pub fn with_oembed_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.oembed_endpoint = endpoint.into();
        self
    }

    pub fn with_noembed_endpoint(mut self, endpoint: Option<String>) -> Self {
        self.noembed_endpoint = endpoint;
        self
    }

    pub fn with_scrape(mut self, enabled: bool) -> Self {
        self.enable_scrape = enabled;
        self
    }

    pub fn with_watch_base(mut self, base: impl Into<String>) -> Self {
        self.watch_base = base.into();
        self
    }

    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_health_timeout(mut self, timeout: Duration) -> Self {
        self.health_timeout = timeout;
        self
    }

    pub fn with_redirect_services(mut self, services: Vec<String>) -> Self {
        self.redirect_services = services;
        self
    }

    /// Watch page URL for an id, built on `watch_base`.
    pub fn watch_url(&self, video_id: &str) -> String {
        format!("{}/watch?v={}", self.watch_base.trim_end_matches('/'), video_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ResolverConfig::default();
        assert!(config.backend_url.is_none());
        assert_eq!(config.cors_proxies.len(), 3);
        assert!(config.enable_scrape);
        assert_eq!(
            config.watch_url("dQw4w9WgXcQ"),
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        );
    }

    #[test]
    fn test_env_overlay() {
        let env: HashMap<&str, &str> = [
            ("TUBENOVA_BACKEND_URL", " http://localhost:5000 "),
            ("TUBENOVA_INVIDIOUS", "https://a.example, ,https://b.example"),
            ("TUBENOVA_DISABLE_SCRAPE", "true"),
        ]
        .into_iter()
        .collect();

        let config = ResolverConfig::default().apply_env(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.backend_url.as_deref(), Some("http://localhost:5000"));
        assert_eq!(
            config.invidious_instances,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
        assert!(!config.enable_scrape);
        assert!(config.proxy.is_none());
    }
}
