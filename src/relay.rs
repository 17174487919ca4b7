use std::time::Duration;

use tracing::debug;

use crate::error::RelayError;
use crate::types::{VerificationOutcome, VerifyReq};

/// Client for the backend membership-verification endpoint.
///
/// One POST per scan, bounded by the configured timeout. There is no retry:
/// any transport or decode problem comes back as a [`RelayError`] and the
/// caller decides what the device sees.
#[derive(Debug, Clone)]
pub struct VerifyClient {
    http: reqwest::Client,
    url: String,
    shop_id: i64,
}

impl VerifyClient {
    pub fn new(url: impl Into<String>, shop_id: i64, timeout: Duration) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.into(),
            shop_id,
        })
    }

    pub async fn relay(&self, code_val: &str) -> Result<VerificationOutcome, RelayError> {
        let res = self
            .http
            .post(&self.url)
            .json(&VerifyReq::for_code(self.shop_id, code_val))
            .send()
            .await?;
        let status = res.status();
        let body = res.bytes().await?;
        debug!(%status, len = body.len(), "verification backend replied");
        Ok(serde_json::from_slice(&body)?)
    }
}
