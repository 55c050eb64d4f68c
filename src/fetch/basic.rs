use std::time::Duration;

use super::client::HttpClient;
use async_trait::async_trait;

/// Plain reqwest client. Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct BasicClient(reqwest::Client);

impl BasicClient {
    pub fn new() -> Self {
        Self(reqwest::Client::new())
    }

    /// Client with an overall request timeout and a separate connect timeout.
    pub fn with_timeouts(request: Duration, connect: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request)
            .connect_timeout(connect)
            .build()?;
        Ok(Self(client))
    }
}

#[async_trait]
impl HttpClient for BasicClient {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.0.execute(req).await
    }
}
