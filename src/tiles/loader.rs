use crate::{MapError, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;

use crate::core::constants::USER_AGENT;

/// Client shared by tile downloads and geocoding. Public tile servers reject
/// requests without an identifying User-Agent.
pub(crate) static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .tcp_keepalive(std::time::Duration::from_secs(30))
        .pool_idle_timeout(std::time::Duration::from_secs(90))
        .pool_max_idle_per_host(16)
        .build()
        .expect("failed to build reqwest async client")
});

/// Dedicated client for a non-default `user_agent`; `None` means use [`HTTP_CLIENT`]
pub(crate) fn client_for(user_agent: &str) -> Result<Option<reqwest::Client>> {
    if user_agent == USER_AGENT {
        return Ok(None);
    }
    let client = reqwest::Client::builder()
        .user_agent(user_agent)
        .pool_max_idle_per_host(16)
        .build()?;
    Ok(Some(client))
}

/// Network seam for raw tile bytes.
///
/// Timeouts are applied by the caller, so implementations can simply await
/// the transfer.
#[async_trait]
pub trait TileFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Fetches tiles over HTTP(S) with the shared client
#[derive(Debug, Clone, Default)]
pub struct HttpTileFetcher {
    client: Option<reqwest::Client>,
}

impl HttpTileFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a dedicated client, e.g. one with a different User-Agent
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client: Some(client),
        }
    }

    /// Shared client unless `user_agent` differs from the crate default
    pub fn with_user_agent(user_agent: &str) -> Result<Self> {
        Ok(Self {
            client: client_for(user_agent)?,
        })
    }

    fn client(&self) -> &reqwest::Client {
        self.client.as_ref().unwrap_or(&HTTP_CLIENT)
    }
}

#[async_trait]
impl TileFetcher for HttpTileFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client().get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MapError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let data = response.bytes().await?.to_vec();
        log::debug!("downloaded {} ({} bytes)", url, data.len());
        Ok(data)
    }
}
