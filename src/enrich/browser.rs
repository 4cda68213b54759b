// src/enrich/browser.rs
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, EventLifecycleEvent, SetLifecycleEventsEnabledParams,
};
use chromiumoxide::listeners::EventStream;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Starts one isolated browser per call.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>>;
}

/// A single page in a browser owned by the caller until `close`.
#[async_trait]
pub trait BrowserSession: Send {
    /// Resolves once the page has finished loading.
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// Resolves once the main frame of the last navigation reports network idle.
    /// Sessions without lifecycle tracking treat the load as idle.
    async fn wait_for_network_idle(&mut self) -> Result<()> {
        Ok(())
    }

    async fn title(&mut self) -> Result<Option<String>>;

    async fn screenshot_full_page(&mut self) -> Result<Vec<u8>>;

    /// Rendered, visible text of `<body>`.
    async fn inner_text(&mut self) -> Result<String>;

    async fn close(self: Box<Self>) -> Result<()>;
}

const USER_AGENT_ARG: &str = "--user-agent=Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

static SESSION_SEQ: AtomicU64 = AtomicU64::new(0);

/// Chromium over CDP. Every launch gets its own throwaway profile directory.
#[derive(Debug, Clone)]
pub struct ChromeDriver {
    headless: bool,
    window: (u32, u32),
}

impl ChromeDriver {
    pub fn new(headless: bool) -> Self {
        Self {
            headless,
            window: (1280, 1024),
        }
    }

    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window = (width, height);
        self
    }

    fn profile_dir() -> PathBuf {
        let seq = SESSION_SEQ.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!(
            "hotspot-chrome-{}-{}-{}",
            std::process::id(),
            chrono::Utc::now().timestamp_millis(),
            seq
        ))
    }
}

#[async_trait]
impl BrowserDriver for ChromeDriver {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>> {
        let user_data_dir = Self::profile_dir();
        let mut builder = BrowserConfig::builder()
            .window_size(self.window.0, self.window.1)
            .user_data_dir(&user_data_dir)
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-blink-features=AutomationControlled")
            .arg(USER_AGENT_ARG);
        if !self.headless {
            builder = builder.with_head();
        }
        let config = builder
            .build()
            .map_err(|e| anyhow!("building browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("launching chromium")?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "browser handler event error");
                }
            }
        });

        let mut session = ChromeSession {
            browser,
            page: None,
            lifecycle: None,
            handler: Some(handler),
            user_data_dir,
            closed: false,
        };

        match session.browser.new_page("about:blank").await {
            Ok(page) => {
                session.page = Some(page);
                info!(profile = %session.user_data_dir.display(), "browser session launched");
                Ok(Box::new(session))
            }
            Err(e) => {
                if let Err(close_err) = Box::new(session).close().await {
                    warn!(error = ?close_err, "closing half-started browser failed");
                }
                Err(anyhow!(e).context("opening browser page"))
            }
        }
    }
}

pub struct ChromeSession {
    browser: Browser,
    page: Option<Page>,
    // subscribed before `goto`, so no lifecycle event of the navigation is missed
    lifecycle: Option<EventStream<EventLifecycleEvent>>,
    handler: Option<JoinHandle<()>>,
    user_data_dir: PathBuf,
    closed: bool,
}

impl ChromeSession {
    fn page(&self) -> Result<&Page> {
        self.page.as_ref().ok_or_else(|| anyhow!("no page available"))
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        let page = self.page()?;
        page.execute(SetLifecycleEventsEnabledParams::new(true))
            .await
            .context("enabling lifecycle events")?;
        let events = page
            .event_listener::<EventLifecycleEvent>()
            .await
            .context("subscribing to lifecycle events")?;
        page.goto(url)
            .await
            .with_context(|| format!("navigating to {url}"))?;
        self.lifecycle = Some(events);
        Ok(())
    }

    async fn wait_for_network_idle(&mut self) -> Result<()> {
        let mut events = self
            .lifecycle
            .take()
            .ok_or_else(|| anyhow!("no navigation to wait on"))?;
        let main_frame = self
            .page()?
            .mainframe()
            .await
            .context("resolving main frame")?;

        // Idle events of the previous document may still be queued; only count
        // the ones that follow this navigation's `init`.
        let mut started = false;
        while let Some(event) = events.next().await {
            if main_frame.as_ref().is_some_and(|f| *f != event.frame_id) {
                continue;
            }
            match event.name.as_str() {
                "init" => started = true,
                "networkIdle" if started => {
                    debug!("network idle");
                    return Ok(());
                }
                _ => {}
            }
        }
        bail!("page closed before network idle")
    }

    async fn title(&mut self) -> Result<Option<String>> {
        self.page()?.get_title().await.context("reading page title")
    }

    async fn screenshot_full_page(&mut self) -> Result<Vec<u8>> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();
        self.page()?
            .screenshot(params)
            .await
            .context("capturing screenshot")
    }

    async fn inner_text(&mut self) -> Result<String> {
        self.page()?
            .evaluate("document.body ? document.body.innerText : ''")
            .await
            .context("evaluating body text")?
            .into_value::<String>()
            .context("decoding body text")
    }

    async fn close(mut self: Box<Self>) -> Result<()> {
        self.closed = true;
        self.lifecycle = None;
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                debug!(error = %e, "page close failed");
            }
        }
        let res = self
            .browser
            .close()
            .await
            .map(|_| ())
            .context("closing browser");
        if let Err(e) = self.browser.wait().await {
            debug!(error = %e, "waiting for browser exit failed");
        }
        if let Some(h) = self.handler.take() {
            h.abort();
        }
        if let Err(e) = tokio::fs::remove_dir_all(&self.user_data_dir).await {
            debug!(error = %e, "profile cleanup failed");
        }
        res
    }
}

// Reached without `close` only when the owning future was dropped mid-call.
// chromiumoxide kills the child process when `Browser` drops; the rest is ours.
impl Drop for ChromeSession {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Some(h) = self.handler.take() {
            h.abort();
        }
        let _ = std::fs::remove_dir_all(&self.user_data_dir);
        warn!("browser session dropped without close");
    }
}
