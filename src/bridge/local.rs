//! In-process transport: simulated tabs, each with a host page and, once
//! injected, a page agent. Commands and replies cross as JSON text, the
//! same way they cross a context boundary.

use std::collections::BTreeMap;

use tokio::sync::Mutex;
use tracing::debug;

use super::client::{Tab, TabId, Transport};
use super::message::{Command, Response};
use crate::agent::PageAgent;
use crate::config::ReaderConfig;
use crate::disguise::HostSurface;
use crate::error::CommunicationError;
use crate::store::KeyValueStore;

struct LocalTab<S, H> {
    url: String,
    /// The page before injection, or after the agent was unloaded.
    page: Option<H>,
    agent: Option<PageAgent<S, H>>,
    injectable: bool,
    /// Injections that fail before one succeeds.
    failing_injections: u32,
    injections: u32,
}

struct Tabs<S, H> {
    tabs: BTreeMap<TabId, LocalTab<S, H>>,
    active: Option<TabId>,
    next_id: TabId,
}

pub struct LocalTransport<S, H> {
    store: S,
    config: ReaderConfig,
    inner: Mutex<Tabs<S, H>>,
}

impl<S, H> LocalTransport<S, H>
where
    S: KeyValueStore + Clone,
    H: HostSurface,
{
    /// Every injected agent shares `store`.
    pub fn new(store: S, config: ReaderConfig) -> Self {
        Self {
            store,
            config,
            inner: Mutex::new(Tabs {
                tabs: BTreeMap::new(),
                active: None,
                next_id: 1,
            }),
        }
    }

    /// Open `page` at `url` in a new, active tab with no agent yet.
    pub async fn open_tab(&self, url: &str, page: H) -> TabId {
        self.open(url, page, true).await
    }

    /// A tab that refuses every injection, like a store page.
    pub async fn open_restricted_tab(&self, url: &str, page: H) -> TabId {
        self.open(url, page, false).await
    }

    pub async fn activate(&self, tab: TabId) -> bool {
        let mut inner = self.inner.lock().await;
        let exists = inner.tabs.contains_key(&tab);
        if exists {
            inner.active = Some(tab);
        }
        exists
    }

    pub async fn close_tab(&self, tab: TabId) -> Option<H> {
        let mut inner = self.inner.lock().await;
        let closed = inner.tabs.remove(&tab)?;
        if inner.active == Some(tab) {
            inner.active = None;
        }
        match closed.agent {
            Some(agent) => Some(agent.shutdown().await),
            None => closed.page,
        }
    }

    /// Make the next `count` injections into `tab` fail.
    pub async fn fail_injections(&self, tab: TabId, count: u32) {
        if let Some(entry) = self.inner.lock().await.tabs.get_mut(&tab) {
            entry.failing_injections = count;
        }
    }

    /// Injection attempts made so far, successful or not.
    pub async fn injections(&self, tab: TabId) -> u32 {
        self.inner
            .lock()
            .await
            .tabs
            .get(&tab)
            .map_or(0, |entry| entry.injections)
    }

    pub async fn has_agent(&self, tab: TabId) -> bool {
        self.inner
            .lock()
            .await
            .tabs
            .get(&tab)
            .is_some_and(|entry| entry.agent.is_some())
    }

    /// Unload the agent (with its final persist) and keep the page, as a
    /// navigation within the tab would.
    pub async fn reload(&self, tab: TabId) -> bool {
        let mut inner = self.inner.lock().await;
        let Some(entry) = inner.tabs.get_mut(&tab) else {
            return false;
        };
        if let Some(agent) = entry.agent.take() {
            entry.page = Some(agent.shutdown().await);
        }
        true
    }

    /// Run `f` against the tab's agent, if one is running.
    pub async fn with_agent<R>(&self, tab: TabId, f: impl FnOnce(&mut PageAgent<S, H>) -> R) -> Option<R> {
        let mut inner = self.inner.lock().await;
        inner.tabs.get_mut(&tab)?.agent.as_mut().map(f)
    }

    async fn open(&self, url: &str, page: H, injectable: bool) -> TabId {
        let mut inner = self.inner.lock().await;
        let id = inner.next_id;
        inner.next_id += 1;
        inner.tabs.insert(
            id,
            LocalTab {
                url: url.to_string(),
                page: Some(page),
                agent: None,
                injectable,
                failing_injections: 0,
                injections: 0,
            },
        );
        inner.active = Some(id);
        id
    }
}

impl<S, H> Transport for LocalTransport<S, H>
where
    S: KeyValueStore + Clone,
    H: HostSurface,
{
    async fn active_tab(&self) -> Result<Tab, CommunicationError> {
        let inner = self.inner.lock().await;
        let id = inner.active.ok_or(CommunicationError::NoActiveTab)?;
        let entry = inner.tabs.get(&id).ok_or(CommunicationError::NoActiveTab)?;
        Ok(Tab {
            id,
            url: entry.url.clone(),
        })
    }

    async fn send(&self, tab: TabId, command: &Command) -> Result<Response, CommunicationError> {
        let raw = serde_json::to_string(command)
            .map_err(|e| CommunicationError::UnexpectedReply(e.to_string()))?;

        let mut inner = self.inner.lock().await;
        let agent = inner
            .tabs
            .get_mut(&tab)
            .and_then(|entry| entry.agent.as_mut())
            .ok_or(CommunicationError::NoReceiver)?;
        let reply = agent.handle_message(&raw).await;
        drop(inner);

        serde_json::from_str(&reply).map_err(|e| CommunicationError::UnexpectedReply(e.to_string()))
    }

    async fn inject(&self, tab: TabId) -> Result<(), CommunicationError> {
        let mut inner = self.inner.lock().await;
        let entry = inner.tabs.get_mut(&tab).ok_or(CommunicationError::NoActiveTab)?;
        entry.injections += 1;

        if !entry.injectable {
            return Err(CommunicationError::InjectionFailed(format!(
                "cannot script {}",
                entry.url
            )));
        }
        if entry.failing_injections > 0 {
            entry.failing_injections -= 1;
            return Err(CommunicationError::InjectionFailed("page still loading".into()));
        }
        if entry.agent.is_some() {
            return Ok(());
        }

        let page = entry
            .page
            .take()
            .ok_or_else(|| CommunicationError::InjectionFailed("tab has no page".into()))?;
        let agent = PageAgent::start(self.store.clone(), page, &self.config)
            .await
            .map_err(|e| CommunicationError::InjectionFailed(e.to_string()))?;
        entry.agent = Some(agent);
        debug!(tab, "agent running");
        Ok(())
    }
}
