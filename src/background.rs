//! The long-lived background context: keyboard shortcuts and store
//! housekeeping.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::bridge::{Bridge, Command, Transport};
use crate::store::KeyValueStore;

/// Global shortcuts registered by the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    NextPage,
    PrevPage,
}

impl Shortcut {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "next-page" => Some(Shortcut::NextPage),
            "prev-page" => Some(Shortcut::PrevPage),
            _ => None,
        }
    }

    pub fn command(self) -> Command {
        match self {
            Shortcut::NextPage => Command::NextPage,
            Shortcut::PrevPage => Command::PrevPage,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum BackgroundRequest {
    GetStorageUsage,
    ClearStorage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BackgroundResponse {
    Usage { usage: u64 },
    Cleared { success: bool },
}

pub struct Background<S, T> {
    store: S,
    bridge: Bridge<T>,
}

impl<S: KeyValueStore, T: Transport> Background<S, T> {
    pub fn new(store: S, bridge: Bridge<T>) -> Self {
        Self { store, bridge }
    }

    pub fn bridge(&self) -> &Bridge<T> {
        &self.bridge
    }

    pub async fn handle(&self, request: BackgroundRequest) -> BackgroundResponse {
        match request {
            BackgroundRequest::GetStorageUsage => {
                let usage = match self.store.bytes_in_use().await {
                    Ok(bytes) => bytes as u64,
                    Err(e) => {
                        warn!(error = %e, "could not measure storage");
                        0
                    }
                };
                debug!(usage, "storage usage");
                BackgroundResponse::Usage { usage }
            }
            BackgroundRequest::ClearStorage => {
                let success = match self.store.clear().await {
                    Ok(()) => {
                        info!("storage cleared");
                        true
                    }
                    Err(e) => {
                        warn!(error = %e, "could not clear storage");
                        false
                    }
                };
                BackgroundResponse::Cleared { success }
            }
        }
    }

    /// Forward a page-turn shortcut to the active tab. The agent is never
    /// injected from here; if none answers the shortcut is dropped.
    pub async fn on_shortcut(&self, name: &str) -> bool {
        let Some(shortcut) = Shortcut::from_name(name) else {
            debug!(name, "ignoring unknown shortcut");
            return false;
        };
        match self.bridge.deliver(shortcut.command()).await {
            Ok(_) => true,
            Err(e) => {
                warn!(name, error = %e, "page did not take the shortcut, it may need a reload");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::LocalTransport;
    use crate::config::ReaderConfig;
    use crate::disguise::StaticPage;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn background(store: MemoryStore) -> Background<MemoryStore, LocalTransport<MemoryStore, StaticPage>> {
        let config = ReaderConfig::default();
        let transport = LocalTransport::new(store.clone(), config.clone());
        Background::new(store, Bridge::new(transport, config.bridge))
    }

    #[test]
    fn test_shortcut_names() {
        assert_eq!(Shortcut::from_name("next-page"), Some(Shortcut::NextPage));
        assert_eq!(Shortcut::from_name("prev-page").map(Shortcut::command), Some(Command::PrevPage));
        assert_eq!(Shortcut::from_name("boss-key"), None);
    }

    #[test]
    fn test_request_wire_format() {
        let request: BackgroundRequest = serde_json::from_value(json!({"action": "getStorageUsage"})).unwrap();
        assert_eq!(request, BackgroundRequest::GetStorageUsage);
        assert_eq!(
            serde_json::to_value(BackgroundResponse::Cleared { success: true }).unwrap(),
            json!({"success": true})
        );
    }

    #[tokio::test]
    async fn test_usage_and_clear() {
        let store = MemoryStore::with_entries([("session.active".to_string(), json!(true))].into_iter().collect());
        let background = background(store.clone());

        let BackgroundResponse::Usage { usage } = background.handle(BackgroundRequest::GetStorageUsage).await else {
            panic!("expected usage");
        };
        assert_eq!(usage, r#"{"session.active":true}"#.len() as u64);

        assert_eq!(
            background.handle(BackgroundRequest::ClearStorage).await,
            BackgroundResponse::Cleared { success: true }
        );
        assert!(store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_shortcut_never_injects() {
        let background = background(MemoryStore::new());
        let tab = background
            .bridge()
            .transport()
            .open_tab("https://example.com", StaticPage::new())
            .await;

        assert!(!background.on_shortcut("next-page").await);
        assert_eq!(background.bridge().transport().injections(tab).await, 0);
        assert!(!background.on_shortcut("unknown").await);
    }
}
