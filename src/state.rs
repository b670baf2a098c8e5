use crate::config::Config;
use crate::npm_api::{NpmApiError, NpmClient};
use reqwest::Client;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub npm: NpmClient,
    /// Shared client for the suggestions proxy.
    pub http: Client,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, NpmApiError> {
        let npm = NpmClient::new(&config)?;
        Ok(Self {
            config: Arc::new(config),
            npm,
            http: Client::new(),
        })
    }
}
