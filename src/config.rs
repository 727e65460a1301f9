use menva::FromEnv;
use std::{fmt, net::Ipv4Addr, path::PathBuf, str::FromStr, time::Duration};

#[derive(Debug, Clone, PartialEq)]
pub enum Env {
    Development,
    Production,
    Test,
}

impl FromStr for Env {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" => Ok(Env::Development),
            "production" => Ok(Env::Production),
            "test" => Ok(Env::Test),
            _ => Err(format!("Invalid value for enum Env: {}", s)),
        }
    }
}

impl fmt::Display for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Test => write!(f, "test"),
        }
    }
}

#[derive(Debug, Clone, FromEnv)]
pub struct SharedConfig {
    pub env: Env,
    pub database_url: String,
    pub worker_threads: usize,
    pub max_blocking_threads: usize,
    sentry_dsn: String,
}

impl SharedConfig {
    pub fn stub() -> Self {
        Self {
            env: Env::Test,
            database_url: "sqlite::memory:".to_owned(),
            worker_threads: 1,
            max_blocking_threads: 1,
            sentry_dsn: String::new(),
        }
    }

    pub fn sentry_token(&self) -> Option<&str> {
        if self.sentry_dsn.is_empty() {
            None
        } else {
            Some(&self.sentry_dsn)
        }
    }
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self::stub()
    }
}

#[derive(Debug, Clone, FromEnv)]
pub struct WebsiteConfig {
    ip: Ipv4Addr,
    port: u16,
    domain: String,
    pub session_key: String,
    pub session_cookie_name: String,
    /// Days.
    pub session_expiration: i64,
    pub secure_cookies: bool,
    pub login_url: String,
    pub login_redirect_to: String,
    pub page_size: usize,
    index_cache_seconds: u64,
    pub max_upload_size: usize,
    media_root: String,
}

impl WebsiteConfig {
    pub fn stub() -> Self {
        Self {
            ip: Ipv4Addr::new(0, 0, 0, 0),
            port: 8000,
            domain: "test.com".into(),
            session_key: "session_key".into(),
            session_cookie_name: "session_id".into(),
            session_expiration: 30,
            secure_cookies: false,
            login_url: "/auth/login/".into(),
            login_redirect_to: "/".into(),
            page_size: 10,
            index_cache_seconds: 20,
            max_upload_size: 10485760,
            media_root: std::env::temp_dir()
                .join("yatube-test-media")
                .to_string_lossy()
                .into_owned(),
        }
    }

    pub fn socket_addr(&self) -> (Ipv4Addr, u16) {
        (self.ip, self.port)
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn index_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.index_cache_seconds)
    }

    pub fn media_root(&self) -> PathBuf {
        PathBuf::from(&self.media_root)
    }

    pub fn with_media_root(mut self, media_root: PathBuf) -> Self {
        self.media_root = media_root.to_string_lossy().into_owned();
        self
    }

    pub fn build_url(&self, path: &str) -> String {
        let (protocol, domain) = if self.domain.starts_with("localhost")
            || self.domain.starts_with("127.0.0.1")
            || self.domain.starts_with("0.0.0.0")
        {
            ("http", &format!("{}:{}", self.domain, self.port))
        } else {
            ("https", &self.domain)
        };

        format!("{}://{}{}", protocol, domain, path)
    }

    pub fn print(&self) {
        tracing::info!("listening on http://{}:{}", self.ip, self.port)
    }
}
