use async_trait::async_trait;
use reqwest::{Request, Response};

/// Sends a prepared request. Vendor adapters talk to the network only through
/// this trait so auth wrappers can be layered on top.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
