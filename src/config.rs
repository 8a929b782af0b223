use serde::Deserialize;

pub const PLACEHOLDER_PASS_SECRET: &str = "CHANGE_ME_PASS_SIGNING_SECRET";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub store: StoreBackend,
    /// HMAC key for pass tokens.
    pub pass_secret: String,
    pub session_ttl_secs: u64,
    /// Validity of on-the-spot visitor passes.
    pub visitor_pass_hours: i64,
    /// Comma-separated list of URLs notified on request decisions.
    pub webhook_urls: Vec<String>,
    pub webhook_secret: Option<String>,
    /// Contact line the chatbot hands out.
    pub admin_contact: String,
    /// Extra CORS origin allowed besides localhost.
    pub dashboard_origin: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            database_url: "postgres://localhost/hostel".into(),
            store: StoreBackend::Postgres,
            pass_secret: PLACEHOLDER_PASS_SECRET.into(),
            session_ttl_secs: 86_400,
            visitor_pass_hours: 8,
            webhook_urls: Vec::new(),
            webhook_secret: None,
            admin_contact: "the hostel office".into(),
            dashboard_origin: "http://localhost:3000".into(),
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();
    let defaults = Config::default();

    let pass_secret =
        std::env::var("HOSTEL_PASS_SECRET").unwrap_or_else(|_| PLACEHOLDER_PASS_SECRET.into());
    if pass_secret == PLACEHOLDER_PASS_SECRET {
        let env_mode = std::env::var("HOSTEL_ENV").unwrap_or_default();
        if env_mode == "production" {
            anyhow::bail!(
                "HOSTEL_PASS_SECRET is still the insecure placeholder. \
                 Set a long random secret before running in production."
            );
        }
        tracing::warn!("HOSTEL_PASS_SECRET is not set, passes are signed with an insecure placeholder");
    }

    let store = match std::env::var("HOSTEL_STORE")
        .unwrap_or_default()
        .trim()
        .to_lowercase()
        .as_str()
    {
        "" | "postgres" => StoreBackend::Postgres,
        "memory" => StoreBackend::Memory,
        other => anyhow::bail!("HOSTEL_STORE must be 'postgres' or 'memory', got '{other}'"),
    };

    Ok(Config {
        port: env_or("HOSTEL_PORT", defaults.port),
        database_url: std::env::var("DATABASE_URL").unwrap_or(defaults.database_url),
        store,
        pass_secret,
        session_ttl_secs: env_or("HOSTEL_SESSION_TTL_SECS", defaults.session_ttl_secs),
        visitor_pass_hours: env_or("HOSTEL_VISITOR_PASS_HOURS", defaults.visitor_pass_hours),
        webhook_urls: std::env::var("HOSTEL_WEBHOOK_URLS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        webhook_secret: std::env::var("HOSTEL_WEBHOOK_SECRET")
            .ok()
            .filter(|s| !s.is_empty()),
        admin_contact: std::env::var("HOSTEL_ADMIN_CONTACT").unwrap_or(defaults.admin_contact),
        dashboard_origin: std::env::var("HOSTEL_DASHBOARD_ORIGIN")
            .unwrap_or(defaults.dashboard_origin),
    })
}
