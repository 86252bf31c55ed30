//! Data Source Module
//! Fetch-and-parse collaborators for the enrollment document.
//!
//! Fetches run on a background thread and hand their result back through a
//! oneshot channel, so the returned future never blocks the UI thread.

use crate::data::model::Dataset;
use futures::channel::oneshot;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::path::PathBuf;
use std::thread;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Server responded with status {0}")]
    Status(reqwest::StatusCode),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed dataset: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Fetch was abandoned before completing")]
    Cancelled,
}

/// Something that can produce the raw dataset.
pub trait DataSource {
    /// Human readable location, used in logs and the status line.
    fn describe(&self) -> String;

    /// Start fetching and parsing the dataset.
    fn fetch(&self) -> BoxFuture<'static, Result<Dataset, FetchError>>;
}

/// Pick an HTTP or file source based on the location string.
pub fn source_for(location: &str) -> Box<dyn DataSource> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Box::new(HttpSource::new(location))
    } else {
        Box::new(FileSource::new(location))
    }
}

/// Run `job` on a worker thread and resolve with its result.
fn spawn_fetch<F>(job: F) -> BoxFuture<'static, Result<Dataset, FetchError>>
where
    F: FnOnce() -> Result<Dataset, FetchError> + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    thread::spawn(move || {
        let _ = tx.send(job());
    });
    async move { rx.await.unwrap_or(Err(FetchError::Cancelled)) }.boxed()
}

/// Loads the dataset with an HTTP GET.
pub struct HttpSource {
    url: String,
    use_proxy: bool,
}

impl HttpSource {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            use_proxy: true,
        }
    }

    /// Connect directly, ignoring any proxy configured in the environment.
    pub fn without_proxy(mut self) -> Self {
        self.use_proxy = false;
        self
    }

    fn fetch_blocking(url: &str, use_proxy: bool) -> Result<Dataset, FetchError> {
        let mut builder = reqwest::blocking::Client::builder();
        if !use_proxy {
            builder = builder.no_proxy();
        }
        let response = builder.build()?.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        let body = response.bytes()?;
        Ok(Dataset::from_slice(&body)?)
    }
}

impl DataSource for HttpSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    fn fetch(&self) -> BoxFuture<'static, Result<Dataset, FetchError>> {
        let url = self.url.clone();
        let use_proxy = self.use_proxy;
        spawn_fetch(move || Self::fetch_blocking(&url, use_proxy))
    }
}

/// Loads the dataset from a local JSON file.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_blocking(path: PathBuf) -> Result<Dataset, FetchError> {
        let bytes = std::fs::read(&path).map_err(|source| FetchError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(Dataset::from_slice(&bytes)?)
    }
}

impl DataSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&self) -> BoxFuture<'static, Result<Dataset, FetchError>> {
        let path = self.path.clone();
        spawn_fetch(move || Self::read_blocking(path))
    }
}
