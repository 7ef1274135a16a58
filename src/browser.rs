use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::dom::DocumentReader;

/// One headless browser session per run: launched once, its page reused for
/// every series in the slice, closed before the run ends on success and
/// error paths alike.
pub struct Session {
    browser: Browser,
    handler: JoinHandle<()>,
    page: Page,
    page_timeout: Duration,
}

impl Session {
    pub async fn launch(page_timeout: Duration) -> Result<Self> {
        let config = BrowserConfig::builder().build().map_err(|e| anyhow!(e))?;
        let (browser, mut events) = Browser::launch(config)
            .await
            .context("launching headless browser")?;

        // Drive the CDP event stream for the life of the session.
        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .context("opening page")?;

        Ok(Self {
            browser,
            handler,
            page,
            page_timeout,
        })
    }

    /// Navigate the session's page and wait for the load to settle. The
    /// timeout covers the whole load; on expiry the caller abandons the
    /// affected series.
    pub async fn goto(&self, url: &str) -> Result<()> {
        debug!(url, "loading page");
        let load = async {
            self.page.goto(url.to_string()).await?;
            self.page.wait_for_navigation().await?;
            Ok::<_, chromiumoxide::error::CdpError>(())
        };

        match timeout(self.page_timeout, load).await {
            Ok(result) => result.with_context(|| format!("loading {url}")),
            Err(_) => Err(anyhow!(
                "page load timed out after {}s: {url}",
                self.page_timeout.as_secs()
            )),
        }
    }

    pub async fn close(mut self) {
        if let Err(e) = self.page.close().await {
            warn!(error = %e, "failed to close page");
        }
        if let Err(e) = self.browser.close().await {
            warn!(error = %e, "failed to close browser");
        }
        let _ = self.browser.wait().await;
        self.handler.abort();
    }

    async fn eval(&self, expression: &str) -> Result<Option<String>> {
        let result = self
            .page
            .evaluate(expression)
            .await
            .context("evaluating locator")?;
        result.into_value().context("decoding evaluation result")
    }
}

fn js_str(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| String::from("\"\""))
}

#[async_trait]
impl DocumentReader for Session {
    async fn text(&self, locator: &str) -> Result<Option<String>> {
        self.eval(&format!(
            "document.querySelector({})?.innerText ?? null",
            js_str(locator)
        ))
        .await
    }

    async fn markup(&self, locator: &str) -> Result<Option<String>> {
        self.eval(&format!(
            "document.querySelector({})?.innerHTML ?? null",
            js_str(locator)
        ))
        .await
    }

    async fn attr(&self, locator: &str, name: &str) -> Result<Option<String>> {
        self.eval(&format!(
            "document.querySelector({})?.getAttribute({}) ?? null",
            js_str(locator),
            js_str(name)
        ))
        .await
    }
}
