use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub monitored_brands: Vec<String>,
    pub monitored_keywords: Vec<String>,
    pub monitored_handles: Vec<String>,
    pub collect_interval_minutes: u64,
    pub source_timeout_secs: u64,
    pub source_user_agent: String,
    pub enrich_batch_size: usize,
    pub enrich_batch_delay_ms: u64,
    pub enrich_max_attempts: u32,
    pub enrich_timeout_secs: u64,
    pub twitter_bearer_token: Option<String>,
    pub reddit_client_id: Option<String>,
    pub reddit_client_secret: Option<String>,
    pub reddit_user_agent: String,
    pub news_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("monitored_brands", &self.monitored_brands)
            .field("monitored_keywords", &self.monitored_keywords)
            .field("monitored_handles", &self.monitored_handles)
            .field("collect_interval_minutes", &self.collect_interval_minutes)
            .field("source_timeout_secs", &self.source_timeout_secs)
            .field("source_user_agent", &self.source_user_agent)
            .field("enrich_batch_size", &self.enrich_batch_size)
            .field("enrich_batch_delay_ms", &self.enrich_batch_delay_ms)
            .field("enrich_max_attempts", &self.enrich_max_attempts)
            .field("enrich_timeout_secs", &self.enrich_timeout_secs)
            .field(
                "twitter_bearer_token",
                &self.twitter_bearer_token.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "reddit_client_id",
                &self.reddit_client_id.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "reddit_client_secret",
                &self.reddit_client_secret.as_ref().map(|_| "[redacted]"),
            )
            .field("reddit_user_agent", &self.reddit_user_agent)
            .field(
                "news_api_key",
                &self.news_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "gemini_api_key",
                &self.gemini_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("gemini_model", &self.gemini_model)
            .finish()
    }
}
