use std::collections::HashMap;
use std::path::Path;

use anyhow::Context as _;
use async_trait::async_trait;
use url::Url;

use crate::static_page::{Fetch, FetchedPage, StaticDriver};

pub type SnapshotDriver = StaticDriver<SnapshotFetcher>;

/// Recorded HTML documents keyed by URL.
///
/// Navigating to a URL without a recording fails the way a network error
/// would.
#[derive(Debug, Clone, Default)]
pub struct SnapshotFetcher {
    pages: HashMap<String, String>,
}

impl SnapshotFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &Url, html: impl Into<String>) -> Self {
        self.pages.insert(url.as_str().to_owned(), html.into());
        self
    }

    pub fn with_file(self, url: &Url, path: &Path) -> anyhow::Result<Self> {
        let html = std::fs::read_to_string(path)
            .with_context(|| format!("read html snapshot: {}", path.display()))?;
        Ok(self.with_page(url, html))
    }

    pub fn into_driver(self) -> SnapshotDriver {
        StaticDriver::new(self)
    }
}

#[async_trait]
impl Fetch for SnapshotFetcher {
    async fn fetch(&mut self, url: &Url) -> anyhow::Result<FetchedPage> {
        let html = self
            .pages
            .get(url.as_str())
            .ok_or_else(|| anyhow::anyhow!("no snapshot recorded for {url}"))?;
        Ok(FetchedPage {
            url: url.clone(),
            html: html.clone(),
        })
    }
}
