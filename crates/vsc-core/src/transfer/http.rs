//! HTTP transport

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use tracing::{debug, info};

use super::decoder::{decode_response, FileDescriptor, RepositoryList};
use super::encoder::encode_batch;
use super::{Remote, LIST_ENDPOINT, PULL_ENDPOINT, PUSH_ENDPOINT};
use crate::config::ServerAddress;
use crate::error::TransferError;
use crate::walker::DirectoryBatch;

/// A [`Remote`] reached over HTTP
///
/// One client is shared by every request of a command, so connections can
/// be reused between batches.
pub struct HttpRemote {
    client: Client,
    base_url: String,
}

impl HttpRemote {
    /// Create a remote for `address`, with an optional per-request timeout
    pub fn new(address: &ServerAddress, timeout: Option<Duration>) -> Result<Self, TransferError> {
        let mut builder =
            Client::builder().user_agent(concat!("vsc/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(TransferError::Client)?;
        Ok(Self::with_client(client, address))
    }

    /// Create a remote with a custom reqwest client
    pub fn with_client(client: Client, address: &ServerAddress) -> Self {
        Self {
            client,
            base_url: address.as_str().to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn push_url(&self) -> String {
        format!("{}{}", self.base_url, PUSH_ENDPOINT)
    }

    fn pull_url(&self, directory_name: &str) -> String {
        format!("{}{}{}", self.base_url, PULL_ENDPOINT, directory_name)
    }

    fn list_url(&self) -> String {
        format!("{}{}", self.base_url, LIST_ENDPOINT)
    }

    /// Read the whole body of a successful response
    async fn body(url: &str, response: Response) -> Result<Vec<u8>, TransferError> {
        let response = check_status(url, response)?;
        let bytes = response
            .bytes()
            .await
            .map_err(|source| TransferError::Transport {
                url: url.to_string(),
                source,
            })?;
        Ok(bytes.to_vec())
    }

    async fn get(&self, url: &str) -> Result<Vec<u8>, TransferError> {
        let response =
            self.client
                .get(url)
                .send()
                .await
                .map_err(|source| TransferError::Transport {
                    url: url.to_string(),
                    source,
                })?;
        Self::body(url, response).await
    }
}

#[async_trait]
impl Remote for HttpRemote {
    async fn push_batch(&self, batch: &DirectoryBatch) -> Result<(), TransferError> {
        let url = self.push_url();
        let form = encode_batch(batch).await?;

        debug!(
            "POST {} ({} file(s) for {})",
            url,
            batch.files.len(),
            batch.relative_dir
        );
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|source| TransferError::Transport {
                url: url.clone(),
                source,
            })?;

        // The body carries nothing the client needs
        check_status(&url, response)?;
        info!("Pushed {}", batch.relative_dir);
        Ok(())
    }

    async fn pull(&self, directory_name: &str) -> Result<Vec<FileDescriptor>, TransferError> {
        let url = self.pull_url(directory_name);
        debug!("GET {}", url);

        let body = self.get(&url).await?;
        decode_response(&body).map_err(|e| TransferError::Protocol {
            url,
            details: e.to_string(),
        })
    }

    async fn list(&self) -> Result<RepositoryList, TransferError> {
        let url = self.list_url();
        debug!("GET {}", url);

        let body = self.get(&url).await?;
        serde_json::from_slice(&body).map_err(|e| TransferError::Protocol {
            url,
            details: e.to_string(),
        })
    }
}

fn check_status(url: &str, response: Response) -> Result<Response, TransferError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(TransferError::Status {
            url: url.to_string(),
            status,
        })
    }
}
