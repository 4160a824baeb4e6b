use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, USER_AGENT};
use url::Url;

use crate::static_page::{Fetch, FetchedPage, StaticDriver};

pub type HttpDriver = StaticDriver<HttpFetcher>;

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .context("build http client")?;
        Ok(Self { client })
    }
}

pub fn http_driver(timeout: Duration) -> anyhow::Result<HttpDriver> {
    Ok(StaticDriver::new(HttpFetcher::new(timeout)?))
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&mut self, url: &Url) -> anyhow::Result<FetchedPage> {
        let response = self
            .client
            .get(url.clone())
            .header(USER_AGENT, "ticketwatch/0.1")
            .header(ACCEPT, "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8")
            .header(ACCEPT_LANGUAGE, "pl,en;q=0.8")
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("GET {url}: HTTP {status}");
        }

        if let Some(content_type) = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            let content_type = content_type.to_ascii_lowercase();
            if !(content_type.starts_with("text/html")
                || content_type.starts_with("application/xhtml+xml"))
            {
                anyhow::bail!("GET {url}: not an html page ({content_type})");
            }
        }

        let final_url = response.url().clone();
        let html = response
            .text()
            .await
            .with_context(|| format!("read body: {url}"))?;

        Ok(FetchedPage {
            url: final_url,
            html,
        })
    }
}
