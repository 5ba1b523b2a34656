use std::env;
use std::time::Duration;

use crate::external::UPSTREAM_TIMEOUT;

pub mod cors;

pub use cors::create_cors_layer;

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";
const DEFAULT_TICKETMASTER_HOST: &str = "app.ticketmaster.com";
const DEFAULT_RAPIDAPI_TICKETMASTER_HOST: &str = "ticketmaster-discovery.p.rapidapi.com";
const DEFAULT_RAPIDAPI_SEATGEEK_HOST: &str = "seatgeek.p.rapidapi.com";

/// Credentials for one OAuth provider.
#[derive(Debug, Clone, Default)]
pub struct OAuthClient {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

/// Discovery API settings. Base URLs default to `https://<host>` and can be
/// pointed elsewhere (a local stub in tests).
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    pub ticketmaster_api_key: Option<String>,
    pub ticketmaster_base_url: String,
    pub rapidapi_key: Option<String>,
    pub use_rapidapi: bool,
    pub rapidapi_ticketmaster_host: String,
    pub rapidapi_ticketmaster_base_url: String,
    pub rapidapi_seatgeek_host: String,
    pub rapidapi_seatgeek_base_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: Option<String>,
    pub frontend_url: String,
    /// Comma separated `CORS_ALLOWED_ORIGINS`; falls back to `frontend_url`.
    pub cors_allowed_origins: Option<String>,
    pub api_base_url: String,
    pub development: bool,
    pub discovery: DiscoveryConfig,
    pub google: OAuthClient,
    pub github: OAuthClient,
}

impl Config {
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|p| match p.parse::<u16>() {
                Ok(port) => Some(port),
                Err(e) => {
                    tracing::warn!("Invalid PORT '{}': {}, using {}", p, e, DEFAULT_PORT);
                    None
                }
            })
            .unwrap_or(DEFAULT_PORT);

        let jwt_secret = non_empty_var("JWT_SECRET");
        if jwt_secret.is_none() {
            tracing::warn!("JWT_SECRET is not set. JWT generation will fail.");
        }

        let ticketmaster_host = env::var("TICKETMASTER_HOST")
            .unwrap_or_else(|_| DEFAULT_TICKETMASTER_HOST.to_string());
        let rapidapi_ticketmaster_host = env::var("RAPIDAPI_TICKETMASTER_HOST")
            .unwrap_or_else(|_| DEFAULT_RAPIDAPI_TICKETMASTER_HOST.to_string());
        let rapidapi_seatgeek_host = env::var("RAPIDAPI_SEATGEEK_HOST")
            .unwrap_or_else(|_| DEFAULT_RAPIDAPI_SEATGEEK_HOST.to_string());

        let discovery = DiscoveryConfig {
            ticketmaster_api_key: non_empty_var("TICKETMASTER_API_KEY"),
            ticketmaster_base_url: format!("https://{}", ticketmaster_host),
            rapidapi_key: non_empty_var("RAPIDAPI_KEY"),
            use_rapidapi: env::var("USE_RAPIDAPI_TICKETMASTER")
                .map(|v| v == "true")
                .unwrap_or(false),
            rapidapi_ticketmaster_base_url: format!("https://{}", rapidapi_ticketmaster_host),
            rapidapi_ticketmaster_host,
            rapidapi_seatgeek_base_url: format!("https://{}", rapidapi_seatgeek_host),
            rapidapi_seatgeek_host,
            timeout: env::var("UPSTREAM_TIMEOUT_MS")
                .ok()
                .and_then(|ms| ms.parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(UPSTREAM_TIMEOUT),
        };

        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost/campus_events".to_string()),
            port,
            jwt_secret,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| DEFAULT_FRONTEND_URL.to_string()),
            cors_allowed_origins: non_empty_var("CORS_ALLOWED_ORIGINS"),
            api_base_url: env::var("API_BASE_URL")
                .unwrap_or_else(|_| format!("http://localhost:{}", port)),
            development: env::var("RUST_ENV")
                .map(|v| v.to_lowercase() == "development")
                .unwrap_or(false),
            discovery,
            google: OAuthClient {
                client_id: non_empty_var("GOOGLE_CLIENT_ID"),
                client_secret: non_empty_var("GOOGLE_CLIENT_SECRET"),
            },
            github: OAuthClient {
                client_id: non_empty_var("GITHUB_CLIENT_ID"),
                client_secret: non_empty_var("GITHUB_CLIENT_SECRET"),
            },
        }
    }

    /// Config with nothing external configured.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            database_url: String::new(),
            port: DEFAULT_PORT,
            jwt_secret: Some("test-secret".to_string()),
            frontend_url: DEFAULT_FRONTEND_URL.to_string(),
            cors_allowed_origins: None,
            api_base_url: format!("http://localhost:{}", DEFAULT_PORT),
            development: false,
            discovery: DiscoveryConfig {
                ticketmaster_api_key: None,
                ticketmaster_base_url: format!("https://{}", DEFAULT_TICKETMASTER_HOST),
                rapidapi_key: None,
                use_rapidapi: false,
                rapidapi_ticketmaster_host: DEFAULT_RAPIDAPI_TICKETMASTER_HOST.to_string(),
                rapidapi_ticketmaster_base_url: format!(
                    "https://{}",
                    DEFAULT_RAPIDAPI_TICKETMASTER_HOST
                ),
                rapidapi_seatgeek_host: DEFAULT_RAPIDAPI_SEATGEEK_HOST.to_string(),
                rapidapi_seatgeek_base_url: format!("https://{}", DEFAULT_RAPIDAPI_SEATGEEK_HOST),
                timeout: UPSTREAM_TIMEOUT,
            },
            google: OAuthClient::default(),
            github: OAuthClient::default(),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
