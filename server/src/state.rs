use std::sync::Arc;

use crate::config::Config;
use crate::external::UPSTREAM_TIMEOUT;
use crate::repository::Repository;

/// Shared by every handler. Built once at startup; cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub repo: Arc<dyn Repository>,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: Config, repo: Arc<dyn Repository>) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(UPSTREAM_TIMEOUT)
            .user_agent(concat!("campus-events-server/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            config: Arc::new(config),
            repo,
            http,
        })
    }
}
