//! Server configuration, loaded from environment variables at startup.

use std::time::Duration;

/// Which [`newsdesk_core::StatusStore`] backend to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Sqlite,
    Memory,
}

impl StoreKind {
    fn from_env_value(value: &str) -> Self {
        if value.eq_ignore_ascii_case("memory") {
            StoreKind::Memory
        } else {
            StoreKind::Sqlite
        }
    }
}

/// Runtime configuration for newsdesk-server.
///
/// Every field has a default so the server starts without any environment
/// variables set. Provider credentials are optional; calls made without them
/// go out unauthenticated.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to bind (default: `"0.0.0.0:3000"`).
    pub bind_address: String,

    /// Status store backend (default: SQLite).
    pub store: StoreKind,

    /// sqlx SQLite connection string.
    pub database_url: String,

    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,

    /// Directory for daily-rolling log files; console only when unset.
    pub log_dir: Option<String>,

    /// Serve Swagger UI and the OpenAPI document.
    pub enable_swagger: bool,

    /// Comma-separated CORS allow-list. `None` allows any origin.
    pub cors_allowed_origins: Option<String>,

    pub queue_capacity: usize,
    pub worker_concurrency: usize,

    /// Soft ceiling after which a task is recorded as FAILED.
    pub execution_timeout: Duration,

    /// Hard ceiling after which a run is aborted without a terminal write.
    pub hard_timeout: Option<Duration>,

    /// Reap `PROCESSING` records older than this. Reaper is off when unset.
    /// Always longer than the longest run the pool allows.
    pub reap_after: Option<Duration>,
    pub reap_interval: Duration,

    pub news_api_url: String,
    pub news_api_key: Option<String>,

    pub llm_base_url: String,
    pub llm_api_key: Option<String>,
    pub llm_model: String,

    /// Per-request timeout for provider calls.
    pub http_timeout: Duration,
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let execution_timeout =
            Duration::from_secs(parse_env("NEWSDESK_EXECUTION_TIMEOUT_SECS", 840));
        let hard_timeout = match parse_env("NEWSDESK_HARD_TIMEOUT_SECS", 900u64) {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        Self {
            bind_address: env_or("NEWSDESK_BIND", "0.0.0.0:3000"),
            store: StoreKind::from_env_value(&env_or("NEWSDESK_STORE", "sqlite")),
            database_url: env_or("NEWSDESK_DATABASE_URL", "sqlite://newsdesk.db?mode=rwc"),
            log_level: env_or("NEWSDESK_LOG", "info"),
            log_json: env_flag("NEWSDESK_LOG_JSON", false),
            log_dir: env_opt("NEWSDESK_LOG_DIR"),
            enable_swagger: env_flag("NEWSDESK_ENABLE_SWAGGER", true),
            cors_allowed_origins: env_opt("NEWSDESK_CORS_ORIGINS"),
            queue_capacity: parse_env("NEWSDESK_QUEUE_CAPACITY", 64),
            worker_concurrency: parse_env("NEWSDESK_WORKER_CONCURRENCY", 4),
            execution_timeout,
            hard_timeout,
            reap_after: env_opt("NEWSDESK_REAP_AFTER_SECS")
                .and_then(|v| v.parse().ok())
                .map(|secs| reap_window(Duration::from_secs(secs), execution_timeout, hard_timeout)),
            reap_interval: Duration::from_secs(parse_env::<u64>("NEWSDESK_REAP_INTERVAL_SECS", 60).max(1)),
            news_api_url: env_or("NEWSDESK_NEWS_API_URL", "http://localhost:8090"),
            news_api_key: env_opt("NEWSDESK_NEWS_API_KEY"),
            llm_base_url: env_or("NEWSDESK_LLM_BASE_URL", "https://api.groq.com/openai/v1"),
            llm_api_key: env_opt("NEWSDESK_LLM_API_KEY"),
            llm_model: env_or("NEWSDESK_LLM_MODEL", "llama3-70b-8192"),
            http_timeout: Duration::from_secs(parse_env("NEWSDESK_HTTP_TIMEOUT_SECS", 60)),
        }
    }
}

impl Default for Config {
    /// Defaults with no environment lookups; used by tests.
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_owned(),
            store: StoreKind::Memory,
            database_url: "sqlite::memory:".to_owned(),
            log_level: "info".to_owned(),
            log_json: false,
            log_dir: None,
            enable_swagger: true,
            cors_allowed_origins: None,
            queue_capacity: 64,
            worker_concurrency: 4,
            execution_timeout: Duration::from_secs(840),
            hard_timeout: Some(Duration::from_secs(900)),
            reap_after: None,
            reap_interval: Duration::from_secs(60),
            news_api_url: "http://localhost:8090".to_owned(),
            news_api_key: None,
            llm_base_url: "https://api.groq.com/openai/v1".to_owned(),
            llm_api_key: None,
            llm_model: "llama3-70b-8192".to_owned(),
            http_timeout: Duration::from_secs(60),
        }
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

/// Raise `requested` above the longest run the pool allows: the hard limit
/// when set, the soft budget otherwise.
fn reap_window(requested: Duration, execution_timeout: Duration, hard_timeout: Option<Duration>) -> Duration {
    let longest_run = hard_timeout.unwrap_or(execution_timeout);
    requested.max(longest_run + Duration::from_secs(1))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Set and non-blank, or `None`.
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
