//! Concrete [`DirectorySource`]s: an HTTP(S) URL or a local file.

use std::{path::PathBuf, time::Duration};

use agenda_core::directory::{DirectoryError, DirectorySource};
use anyhow::Context as _;
use reqwest::{
  Client,
  header::{CACHE_CONTROL, PRAGMA},
};
use serde_json::Value;

/// Fetches the directory over HTTP, asking every cache along the way for a
/// fresh copy.
pub struct HttpSource {
  client: Client,
  url:    String,
}

impl HttpSource {
  pub fn new(url: impl Into<String>) -> anyhow::Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, url: url.into() })
  }
}

impl DirectorySource for HttpSource {
  fn location(&self) -> String { self.url.clone() }

  async fn fetch(&self) -> Result<Value, DirectoryError> {
    let resp = self
      .client
      .get(&self.url)
      .header(CACHE_CONTROL, "no-cache, no-store")
      .header(PRAGMA, "no-cache")
      .send()
      .await
      .map_err(|e| DirectoryError::Fetch(e.to_string()))?;

    if !resp.status().is_success() {
      return Err(DirectoryError::Status(resp.status().as_u16()));
    }
    resp
      .json()
      .await
      .map_err(|e| DirectoryError::Parse(e.to_string()))
  }
}

/// Reads the directory from the local filesystem on every load.
pub struct FileSource {
  path: PathBuf,
}

impl FileSource {
  pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }
}

impl DirectorySource for FileSource {
  fn location(&self) -> String { self.path.display().to_string() }

  async fn fetch(&self) -> Result<Value, DirectoryError> {
    let raw = tokio::fs::read_to_string(&self.path)
      .await
      .map_err(|e| DirectoryError::Fetch(e.to_string()))?;
    serde_json::from_str(&raw).map_err(|e| DirectoryError::Parse(e.to_string()))
  }
}

/// Either kind of source, picked from the configured location.
pub enum AnySource {
  Http(HttpSource),
  File(FileSource),
}

impl AnySource {
  /// `http://` and `https://` locations are fetched over the network;
  /// anything else is a file path.
  pub fn from_location(location: &str) -> anyhow::Result<Self> {
    if location.starts_with("http://") || location.starts_with("https://") {
      Ok(Self::Http(HttpSource::new(location)?))
    } else {
      Ok(Self::File(FileSource::new(location)))
    }
  }
}

impl DirectorySource for AnySource {
  fn location(&self) -> String {
    match self {
      Self::Http(s) => s.location(),
      Self::File(s) => s.location(),
    }
  }

  async fn fetch(&self) -> Result<Value, DirectoryError> {
    match self {
      Self::Http(s) => s.fetch().await,
      Self::File(s) => s.fetch().await,
    }
  }
}
