//! HTTP client for the speed-test server endpoints


use crate::{
    error::{AppError, Result},
    models::{GeoInfo, LogSubmission},
};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt};
use reqwest::{header, Client, Url};
use std::time::Duration;
use uuid::Uuid;

/// Stream of chunk sizes read from a download body
pub type ChunkStream = BoxStream<'static, Result<usize>>;

/// Speed-test server operations, abstracted for probes and tests
#[async_trait]
pub trait SpeedTestClient: Send + Sync {
    /// One cache-busted round trip to the latency endpoint
    async fn ping(&self) -> Result<()>;

    /// Start a streamed download of `size` bytes
    async fn open_download(&self, size: u64) -> Result<ChunkStream>;

    /// POST one chunk; the buffer is shared, so cloning it is cheap
    async fn upload(&self, chunk: Bytes) -> Result<()>;

    /// Client and server geolocation
    async fn geo_info(&self) -> Result<GeoInfo>;

    /// Submit a finished run to the logging endpoint
    async fn log_results(&self, submission: &LogSubmission) -> Result<()>;
}

/// Resolved endpoint URLs under one server base
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub ping: Url,
    pub download: Url,
    pub upload: Url,
    pub geo_info: Url,
    pub log_results: Url,
}

impl Endpoints {
    /// Resolve every endpoint relative to `base_url`; a base path is kept
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base = Url::parse(base_url)
            .map_err(|e| AppError::config(format!("Invalid server URL '{}': {}", base_url, e)))?;

        match base.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(AppError::config(format!("Unsupported server URL scheme: {}", scheme)));
            }
        }

        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.set_query(None);
        base.set_fragment(None);

        Ok(Self {
            ping: base.join("ping")?,
            download: base.join("download")?,
            upload: base.join("upload")?,
            geo_info: base.join("get_geo_info")?,
            log_results: base.join("log_results")?,
        })
    }
}

/// reqwest-backed client
pub struct NetworkClient {
    client: Client,
    endpoints: Endpoints,
}

impl NetworkClient {
    /// Create a client for the given server
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_connect_timeout(base_url, crate::defaults::DEFAULT_CONNECT_TIMEOUT)
    }

    /// Create a client with a custom connect timeout; there is no overall request timeout
    pub fn with_connect_timeout(base_url: &str, connect_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoints: Endpoints::new(base_url)?,
        })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    fn no_cache(builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header(header::CACHE_CONTROL, "no-store")
            .header(header::PRAGMA, "no-cache")
            .query(&[("_", Uuid::new_v4().simple().to_string())])
    }
}

#[async_trait]
impl SpeedTestClient for NetworkClient {
    async fn ping(&self) -> Result<()> {
        // Any HTTP status counts as a completed round trip
        let response = Self::no_cache(self.client.get(self.endpoints.ping.clone()))
            .send()
            .await?;
        response.bytes().await?;
        Ok(())
    }

    async fn open_download(&self, size: u64) -> Result<ChunkStream> {
        let response = Self::no_cache(self.client.get(self.endpoints.download.clone()))
            .query(&[("size", size)])
            .send()
            .await?
            .error_for_status()
            .map_err(|e| AppError::http_request(format!("Download rejected: {}", e)))?;

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.len()).map_err(AppError::from))
            .boxed())
    }

    async fn upload(&self, chunk: Bytes) -> Result<()> {
        self.client
            .post(self.endpoints.upload.clone())
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .body(chunk)
            .send()
            .await?;
        Ok(())
    }

    async fn geo_info(&self) -> Result<GeoInfo> {
        let info = self
            .client
            .get(self.endpoints.geo_info.clone())
            .send()
            .await?
            .error_for_status()?
            .json::<GeoInfo>()
            .await?;
        Ok(info)
    }

    async fn log_results(&self, submission: &LogSubmission) -> Result<()> {
        // Only a transport failure counts; the response is not inspected
        self.client
            .post(self.endpoints.log_results.clone())
            .json(submission)
            .send()
            .await?;
        Ok(())
    }
}
