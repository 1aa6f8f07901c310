use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use reqwest::header::USER_AGENT;

use crate::config::PipelineConfig;
use crate::error::ScrapeError;

static CLIENT: OnceCell<Client> = OnceCell::new();

/// Shared blocking client. Timeout and User-Agent come from the first config
/// that reaches this call.
pub fn http_client(config: &PipelineConfig) -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .context("failed to build http client")
    })
}

/// Anything that can hand back the HTML of one page.
pub trait PageSource: Sync {
    fn fetch_page(&self, url: &str) -> Result<String, ScrapeError>;
}

pub struct HttpSource {
    client: &'static Client,
    user_agent: String,
}

impl HttpSource {
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(config)?,
            user_agent: config.user_agent.clone(),
        })
    }
}

impl PageSource for HttpSource {
    fn fetch_page(&self, url: &str) -> Result<String, ScrapeError> {
        let resp = self
            .client
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .map_err(|err| ScrapeError::transport(url, err))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ScrapeError::transport(url, format!("http {status}")));
        }
        resp.text().map_err(|err| ScrapeError::transport(url, err))
    }
}
