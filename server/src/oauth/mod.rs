//! Google and GitHub authorization-code sign-in.
//!
//! The provider calls are plain `reqwest` requests; every step returns
//! `Result<_, OAuthError>` and the callback handler turns any error into a
//! redirect back to the frontend login page.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{Config, OAuthClient};
use crate::models::User;

const GOOGLE_AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
const GITHUB_AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
const GITHUB_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const GITHUB_USER_URL: &str = "https://api.github.com/user";
const GITHUB_EMAILS_URL: &str = "https://api.github.com/user/emails";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Google,
    GitHub,
}

impl Provider {
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Google => "Google",
            Provider::GitHub => "GitHub",
        }
    }

    fn slug(&self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::GitHub => "github",
        }
    }

    fn client<'a>(&self, config: &'a Config) -> &'a OAuthClient {
        match self {
            Provider::Google => &config.google,
            Provider::GitHub => &config.github,
        }
    }

    /// The callback URL registered with the provider.
    pub fn redirect_uri(&self, config: &Config) -> String {
        format!(
            "{}/api/auth/callback/{}",
            config.api_base_url.trim_end_matches('/'),
            self.slug()
        )
    }
}

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("{0} OAuth not configured")]
    NotConfigured(&'static str),

    #[error("Authorization code missing")]
    MissingCode,

    #[error("Provider returned no access token")]
    NoAccessToken,

    #[error("Provider account has no email address")]
    EmailRequired,

    #[error("OAuth request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid OAuth URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to encode user: {0}")]
    Encode(#[from] serde_json::Error),
}

impl OAuthError {
    /// Value of the `error` query param on the frontend login redirect.
    pub fn redirect_code(&self) -> &'static str {
        match self {
            OAuthError::EmailRequired => "email_required",
            _ => "oauth_failed",
        }
    }
}

/// What the local account is found or created from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthProfile {
    pub email: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleUser {
    email: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubUser {
    email: Option<String>,
    name: Option<String>,
    login: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubEmail {
    email: String,
    #[serde(default)]
    primary: bool,
}

/// User fields carried to the frontend in the success redirect.
#[derive(Debug, Serialize)]
struct RedirectUser<'a> {
    id: i64,
    email: &'a str,
    name: Option<&'a str>,
    role: &'a str,
}

pub fn authorize_url(provider: Provider, config: &Config) -> Result<Url, OAuthError> {
    let client_id = provider
        .client(config)
        .client_id
        .as_deref()
        .ok_or(OAuthError::NotConfigured(provider.name()))?;
    let redirect_uri = provider.redirect_uri(config);

    let url = match provider {
        Provider::Google => Url::parse_with_params(
            GOOGLE_AUTHORIZE_URL,
            &[
                ("client_id", client_id),
                ("redirect_uri", redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", "openid email profile"),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        ),
        Provider::GitHub => Url::parse_with_params(
            GITHUB_AUTHORIZE_URL,
            &[
                ("client_id", client_id),
                ("redirect_uri", redirect_uri.as_str()),
                ("scope", "user:email"),
            ],
        ),
    };

    url.map_err(|e| OAuthError::InvalidUrl(e.to_string()))
}

/// Exchanges `code` and fetches the provider profile.
pub async fn fetch_profile(
    http: &reqwest::Client,
    provider: Provider,
    config: &Config,
    code: Option<&str>,
) -> Result<OAuthProfile, OAuthError> {
    let code = code.filter(|c| !c.is_empty()).ok_or(OAuthError::MissingCode)?;
    match provider {
        Provider::Google => google_profile(http, config, code).await,
        Provider::GitHub => github_profile(http, config, code).await,
    }
}

async fn google_profile(
    http: &reqwest::Client,
    config: &Config,
    code: &str,
) -> Result<OAuthProfile, OAuthError> {
    let client = &config.google;
    let redirect_uri = Provider::Google.redirect_uri(config);
    let form = [
        ("code", code),
        ("client_id", client.client_id.as_deref().unwrap_or_default()),
        (
            "client_secret",
            client.client_secret.as_deref().unwrap_or_default(),
        ),
        ("redirect_uri", redirect_uri.as_str()),
        ("grant_type", "authorization_code"),
    ];

    let tokens: TokenResponse = http
        .post(GOOGLE_TOKEN_URL)
        .form(&form)
        .send()
        .await?
        .json()
        .await?;
    let access_token = tokens.access_token.ok_or(OAuthError::NoAccessToken)?;

    let user: GoogleUser = http
        .get(GOOGLE_USERINFO_URL)
        .bearer_auth(&access_token)
        .send()
        .await?
        .json()
        .await?;

    let email = user.email.ok_or(OAuthError::EmailRequired)?;
    let name = display_name(&email, [user.name.as_deref()]);
    Ok(OAuthProfile { email, name })
}

async fn github_profile(
    http: &reqwest::Client,
    config: &Config,
    code: &str,
) -> Result<OAuthProfile, OAuthError> {
    let client = &config.github;
    let body = serde_json::json!({
        "client_id": client.client_id,
        "client_secret": client.client_secret,
        "code": code,
    });

    let tokens: TokenResponse = http
        .post(GITHUB_TOKEN_URL)
        .header(reqwest::header::ACCEPT, "application/json")
        .json(&body)
        .send()
        .await?
        .json()
        .await?;
    let access_token = tokens.access_token.ok_or(OAuthError::NoAccessToken)?;

    let user: GitHubUser = http
        .get(GITHUB_USER_URL)
        .bearer_auth(&access_token)
        .send()
        .await?
        .json()
        .await?;

    let email = match user.email.clone().filter(|e| !e.is_empty()) {
        Some(email) => Some(email),
        None => {
            let emails: Vec<GitHubEmail> = http
                .get(GITHUB_EMAILS_URL)
                .bearer_auth(&access_token)
                .send()
                .await?
                .json()
                .await?;
            pick_github_email(emails)
        }
    };

    let email = email.ok_or(OAuthError::EmailRequired)?;
    let name = display_name(&email, [user.name.as_deref(), user.login.as_deref()]);
    Ok(OAuthProfile { email, name })
}

/// The primary address, else the first listed.
fn pick_github_email(mut emails: Vec<GitHubEmail>) -> Option<String> {
    let primary = emails.iter().position(|e| e.primary);
    match primary {
        Some(i) => Some(emails.swap_remove(i).email),
        None => emails.into_iter().next().map(|e| e.email),
    }
}

/// First non-empty candidate, else the local part of the email.
fn display_name<const N: usize>(email: &str, candidates: [Option<&str>; N]) -> String {
    candidates
        .into_iter()
        .flatten()
        .find(|n| !n.trim().is_empty())
        .unwrap_or_else(|| email.split('@').next().unwrap_or(email))
        .to_string()
}

/// `<frontend>/api/auth/callback?token=..&user=<json>`.
pub fn success_redirect(frontend_url: &str, token: &str, user: &User) -> Result<Url, OAuthError> {
    let payload = RedirectUser {
        id: user.id,
        email: &user.email,
        name: user.name.as_deref(),
        role: &user.role,
    };
    let user_json = serde_json::to_string(&payload)?;

    Url::parse_with_params(
        &format!("{}/api/auth/callback", frontend_url.trim_end_matches('/')),
        &[("token", token), ("user", user_json.as_str())],
    )
    .map_err(|e| OAuthError::InvalidUrl(e.to_string()))
}

/// `<frontend>/login?error=<code>`.
pub fn failure_redirect(frontend_url: &str, code: &str) -> String {
    format!("{}/login?error={}", frontend_url.trim_end_matches('/'), code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn config_with_clients() -> Config {
        let mut config = Config::for_tests();
        config.api_base_url = "http://api.campus.test".to_string();
        config.google.client_id = Some("g-client".to_string());
        config.github.client_id = Some("gh-client".to_string());
        config
    }

    #[test]
    fn test_authorize_url_requires_client_id() {
        let config = Config::for_tests();
        assert!(matches!(
            authorize_url(Provider::Google, &config),
            Err(OAuthError::NotConfigured("Google"))
        ));
        assert!(matches!(
            authorize_url(Provider::GitHub, &config),
            Err(OAuthError::NotConfigured("GitHub"))
        ));
    }

    #[test]
    fn test_google_authorize_url() {
        let url = authorize_url(Provider::Google, &config_with_clients()).unwrap();
        assert_eq!(url.host_str(), Some("accounts.google.com"));

        let params: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(params.contains(&("client_id".into(), "g-client".into())));
        assert!(params.contains(&(
            "redirect_uri".into(),
            "http://api.campus.test/api/auth/callback/google".into()
        )));
        assert!(params.contains(&("scope".into(), "openid email profile".into())));
    }

    #[test]
    fn test_github_authorize_url() {
        let url = authorize_url(Provider::GitHub, &config_with_clients()).unwrap();
        let params: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(params.contains(&("scope".into(), "user:email".into())));
        assert!(params.contains(&(
            "redirect_uri".into(),
            "http://api.campus.test/api/auth/callback/github".into()
        )));
    }

    #[tokio::test]
    async fn test_missing_code_fails_before_any_request() {
        let http = reqwest::Client::new();
        let err = fetch_profile(&http, Provider::GitHub, &config_with_clients(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, OAuthError::MissingCode));
        assert_eq!(err.redirect_code(), "oauth_failed");
    }

    #[test]
    fn test_primary_github_email_wins() {
        let emails = vec![
            GitHubEmail {
                email: "old@example.com".into(),
                primary: false,
            },
            GitHubEmail {
                email: "main@example.com".into(),
                primary: true,
            },
        ];
        assert_eq!(pick_github_email(emails).as_deref(), Some("main@example.com"));

        let emails = vec![GitHubEmail {
            email: "only@example.com".into(),
            primary: false,
        }];
        assert_eq!(pick_github_email(emails).as_deref(), Some("only@example.com"));
        assert_eq!(pick_github_email(Vec::new()), None);
    }

    #[test]
    fn test_display_name_fallbacks() {
        assert_eq!(display_name("ada@x.edu", [Some("Ada L"), Some("ada")]), "Ada L");
        assert_eq!(display_name("ada@x.edu", [None, Some("adal")]), "adal");
        assert_eq!(display_name("ada@x.edu", [Some(" "), None]), "ada");
    }

    #[test]
    fn test_redirects() {
        let user = User {
            id: 4,
            email: "ada@x.edu".into(),
            password: String::new(),
            name: Some("Ada".into()),
            role: "student".into(),
            college_id: None,
            created_at: Utc::now(),
        };
        let url = success_redirect("http://localhost:3000/", "tok", &user).unwrap();
        assert_eq!(url.path(), "/api/auth/callback");

        let params: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(params[0], ("token".into(), "tok".into()));
        let user_json: serde_json::Value = serde_json::from_str(&params[1].1).unwrap();
        assert_eq!(user_json["id"], 4);
        assert_eq!(user_json["role"], "student");

        let anonymous = User { name: None, ..user };
        let url = success_redirect("http://localhost:3000", "tok", &anonymous).unwrap();
        let (_, user_param) = url.query_pairs().find(|(k, _)| k == "user").unwrap();
        let user_json: serde_json::Value = serde_json::from_str(&user_param).unwrap();
        assert_eq!(user_json["name"], serde_json::Value::Null);

        let encode = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(OAuthError::from(encode).redirect_code(), "oauth_failed");

        assert_eq!(
            failure_redirect("http://localhost:3000", OAuthError::EmailRequired.redirect_code()),
            "http://localhost:3000/login?error=email_required"
        );
    }
}
