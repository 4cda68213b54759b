// tests/common/mod.rs
//
// Scripted browser for enrichment and API tests: no Chromium needed.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use hotspot_crawler::enrich::browser::{BrowserDriver, BrowserSession};

/// How a fake navigation or network-idle step behaves.
#[derive(Clone, Debug)]
pub enum Nav {
    Ok,
    Fail(&'static str),
    Hang,
}

#[derive(Clone, Debug)]
pub struct Script {
    pub launch_fails: bool,
    pub nav: Nav,
    pub idle: Nav,
    pub title: Result<Option<String>, &'static str>,
    pub screenshot: Result<Vec<u8>, &'static str>,
    pub text: Result<String, &'static str>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            launch_fails: false,
            nav: Nav::Ok,
            idle: Nav::Ok,
            title: Ok(Some("Fake Page".to_string())),
            screenshot: Ok(b"\x89PNG fake".to_vec()),
            text: Ok("  Headline  \n\n  first paragraph \n\t\nsecond paragraph".to_string()),
        }
    }
}

#[derive(Clone, Default)]
pub struct FakeDriver {
    pub script: Script,
    pub launches: Arc<AtomicUsize>,
    pub closes: Arc<AtomicUsize>,
    pub visited: Arc<Mutex<Vec<String>>>,
}

impl FakeDriver {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            ..Self::default()
        }
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().unwrap().clone()
    }
}

#[async_trait]
impl BrowserDriver for FakeDriver {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        if self.script.launch_fails {
            return Err(anyhow!("no browser binary"));
        }
        Ok(Box::new(FakeSession {
            script: self.script.clone(),
            closes: self.closes.clone(),
            visited: self.visited.clone(),
        }))
    }
}

struct FakeSession {
    script: Script,
    closes: Arc<AtomicUsize>,
    visited: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.visited.lock().unwrap().push(url.to_string());
        play(&self.script.nav).await
    }

    async fn wait_for_network_idle(&mut self) -> Result<()> {
        play(&self.script.idle).await
    }

    async fn title(&mut self) -> Result<Option<String>> {
        self.script.title.clone().map_err(|m| anyhow!(m))
    }

    async fn screenshot_full_page(&mut self) -> Result<Vec<u8>> {
        self.script.screenshot.clone().map_err(|m| anyhow!(m))
    }

    async fn inner_text(&mut self) -> Result<String> {
        self.script.text.clone().map_err(|m| anyhow!(m))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

async fn play(step: &Nav) -> Result<()> {
    match step {
        Nav::Ok => Ok(()),
        Nav::Fail(msg) => Err(anyhow!(*msg)),
        Nav::Hang => std::future::pending().await,
    }
}
