use crate::types::{ChangeSet, Configuration};
use anyhow::{Context, Result, ensure};
use log::info;
#[cfg(any(test, feature = "mock"))]
use mockall::automock;
use reqwest::{Client, Response};
use trait_variant::make;

/// Remote side of the configuration form
#[make(Send)]
#[cfg_attr(any(test, feature = "mock"), automock)]
pub trait ConfigApi {
    /// Read the current configuration
    async fn fetch_config(&self) -> Result<Configuration>;
    /// Apply `change_set` and return the resulting configuration
    async fn send_change(&self, change_set: ChangeSet) -> Result<Configuration>;
}

/// HTTP client for the device's `/api/config` endpoint
#[derive(Clone, Debug)]
pub struct ConfigApiClient {
    client: Client,
    base_url: String,
}

impl ConfigApiClient {
    const CONFIG_ENDPOINT: &str = "/api/config";

    /// Create a client for the device reachable at `base_url`
    ///
    /// # Examples
    /// ```no_run
    /// use alarmclock_ui::http_client::ConfigApiClient;
    ///
    /// let client = ConfigApiClient::new("http://192.168.0.42:8080")
    ///     .expect("failed to create client");
    /// ```
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/');

        ensure!(
            base_url.starts_with("http://") || base_url.starts_with("https://"),
            "failed since base url has no http(s) scheme: {base_url}"
        );

        let client = Client::builder()
            .build()
            .context("failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    /// Full URL of the config endpoint, with `query` appended verbatim
    pub fn config_url(&self, query: &str) -> String {
        format!("{}{}{query}", self.base_url, Self::CONFIG_ENDPOINT)
    }

    async fn get(&self, url: &str) -> Result<Configuration> {
        info!("GET {url}");

        let res = self
            .client
            .get(url)
            .send()
            .await
            .context(format!("failed to send GET request to {url}"))?;

        let body = handle_http_response(res, &format!("GET {url}")).await?;

        serde_json::from_str(&body).context("failed to parse configuration")
    }
}

impl ConfigApi for ConfigApiClient {
    async fn fetch_config(&self) -> Result<Configuration> {
        self.get(&self.config_url("")).await
    }

    async fn send_change(&self, change_set: ChangeSet) -> Result<Configuration> {
        self.get(&self.config_url(&change_set.to_query_string()))
            .await
    }
}

/// Body of a successful config API response, or an error naming the request,
/// the status and the device's message
pub async fn handle_http_response(res: Response, context_msg: &str) -> Result<String> {
    let status = res.status();
    let body = res.text().await.context("failed to read response body")?;

    ensure!(
        status.is_success(),
        "{context_msg} failed with status {status} and body: {body}"
    );

    Ok(body)
}
