use std::time::Duration;

use bytes::Bytes;
use reqwest::StatusCode;

use crate::error::CollectError;

/// Retrieves raw report bodies over HTTP. One GET per source per cycle,
/// no retries; anything other than a 200 fails the source for this
/// cycle.
pub struct ReportFetcher {
    client: reqwest::Client,
}

impl ReportFetcher {
    pub fn new(timeout: Duration) -> Result<ReportFetcher, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(ReportFetcher { client })
    }

    pub async fn fetch(&self, url: &str) -> Result<Bytes, CollectError> {
        let response = self.client.get(url).send().await?;

        if response.status() != StatusCode::OK {
            return Err(CollectError::NonOkStatus {
                status: response.status(),
            });
        }

        Ok(response.bytes().await?)
    }
}
