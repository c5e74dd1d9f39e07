use std::future::Future;

use tracing::{debug, info, warn};

use super::message::{Command, LoadedBook, Response, Status};
use crate::config::BridgeConfig;
use crate::error::CommunicationError;
use crate::library::Library;

pub type TabId = u64;

/// The page the user is looking at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tab {
    pub id: TabId,
    pub url: String,
}

/// How the initiating contexts reach a page.
///
/// `send` delivers one command and waits for its single reply; it fails
/// with [`CommunicationError::NoReceiver`] when no agent is listening in
/// the tab.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn active_tab(&self) -> Result<Tab, CommunicationError>;

    async fn send(&self, tab: TabId, command: &Command) -> Result<Response, CommunicationError>;

    /// Install the page agent (and its styling) in the tab.
    async fn inject(&self, tab: TabId) -> Result<(), CommunicationError>;
}

/// Client side of the command bridge.
#[derive(Debug, Clone)]
pub struct Bridge<T> {
    transport: T,
    config: BridgeConfig,
}

impl<T: Transport> Bridge<T> {
    pub fn new(transport: T, config: BridgeConfig) -> Self {
        Self { transport, config }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Whether the page agent can never run at `url`.
    pub fn is_address_blocked(&self, url: &str) -> bool {
        let url = url.trim_start().to_ascii_lowercase();
        self.config
            .blocked_schemes
            .iter()
            .any(|scheme| url.starts_with(&scheme.to_ascii_lowercase()))
    }

    /// Active tab, refused if its address is blocked.
    pub async fn target(&self) -> Result<Tab, CommunicationError> {
        let tab = self.transport.active_tab().await?;
        if self.is_address_blocked(&tab.url) {
            return Err(CommunicationError::PageNotSupported(tab.url));
        }
        Ok(tab)
    }

    /// Ping the tab and inject the agent if nothing answers in time, then
    /// wait for it to settle.
    pub async fn ensure_receiver_ready(&self, tab: &Tab) -> Result<(), CommunicationError> {
        let ping = self.transport.send(tab.id, &Command::Ping);
        let reply = tokio::time::timeout(self.config.ping_timeout(), ping)
            .await
            .unwrap_or(Err(CommunicationError::NoReceiver));
        match reply {
            Ok(Response::Pong(pong)) if pong.alive => return Ok(()),
            Ok(other) => debug!(tab = tab.id, reply = ?other, "odd ping reply, injecting"),
            Err(e) => debug!(tab = tab.id, error = %e, "no pong, injecting"),
        }

        self.transport.inject(tab.id).await.map_err(|e| match e {
            CommunicationError::InjectionFailed(_) | CommunicationError::PageNotSupported(_) => e,
            other => CommunicationError::InjectionFailed(other.to_string()),
        })?;
        info!(tab = tab.id, "page agent injected");
        tokio::time::sleep(self.config.settle_delay()).await;
        Ok(())
    }

    /// Run `op` up to `max_load_attempts` times. After failed attempt `n`
    /// wait `n * backoff_step`. Terminal errors end the loop at once.
    pub async fn with_retry<R, F, Fut>(&self, mut op: F) -> Result<R, CommunicationError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<R, CommunicationError>>,
    {
        let attempts = self.config.max_load_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_terminal() || attempt >= attempts => return Err(e),
                Err(e) => {
                    let wait = self.config.backoff_step() * attempt;
                    warn!(attempt, error = %e, wait_ms = wait.as_millis() as u64, "attempt failed, retrying");
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Deliver one command with the ready check but no retry.
    pub async fn send(&self, command: Command) -> Result<Response, CommunicationError> {
        let tab = self.target().await?;
        self.ensure_receiver_ready(&tab).await?;
        self.transport.send(tab.id, &command).await
    }

    /// Deliver one command to an agent that must already be running.
    pub async fn deliver(&self, command: Command) -> Result<Response, CommunicationError> {
        let tab = self.target().await?;
        self.transport.send(tab.id, &command).await
    }

    /// Send a document to the page, retrying while the agent starts up.
    pub async fn load_book(
        &self,
        content: &str,
        title: Option<&str>,
    ) -> Result<LoadedBook, CommunicationError> {
        let command = Command::LoadBook {
            content: content.to_string(),
            title: title.map(str::to_string),
        };
        let command = &command;
        self.with_retry(move |attempt| async move {
            debug!(attempt, "sending document to page");
            let tab = self.target().await?;
            self.ensure_receiver_ready(&tab).await?;
            match self.transport.send(tab.id, command).await? {
                Response::Loaded(loaded) => Ok(loaded),
                Response::Failure(failure) => Err(CommunicationError::Rejected(failure.error)),
                other => Err(unexpected(&other)),
            }
        })
        .await
    }

    /// Page status for display. Never injects; anything short of a status
    /// reply yields the all-off default.
    pub async fn status(&self) -> Status {
        match self.deliver(Command::GetStatus).await {
            Ok(Response::Status(status)) => status,
            Ok(other) => {
                debug!(reply = ?other, "status query got another reply");
                Status::default()
            }
            Err(e) => {
                debug!(error = %e, "status unavailable");
                Status::default()
            }
        }
    }

    pub async fn toggle_active(&self) -> Result<bool, CommunicationError> {
        match self.send(Command::ToggleActive).await? {
            Response::Active(state) => Ok(state.active),
            other => Err(unexpected(&other)),
        }
    }

    pub async fn next_page(&self) -> Result<bool, CommunicationError> {
        self.acked(Command::NextPage).await
    }

    pub async fn prev_page(&self) -> Result<bool, CommunicationError> {
        self.acked(Command::PrevPage).await
    }

    pub async fn enter_selecting_mode(&self) -> Result<bool, CommunicationError> {
        self.acked(Command::EnterSelectingMode).await
    }

    pub async fn exit_selecting_mode(&self) -> Result<bool, CommunicationError> {
        self.acked(Command::ExitSelectingMode).await
    }

    pub async fn restore_original_content(&self) -> Result<bool, CommunicationError> {
        self.acked(Command::RestoreOriginalContent).await
    }

    pub async fn book_list(&self) -> Result<Library, CommunicationError> {
        match self.send(Command::GetBookList).await? {
            Response::BookList(library) => Ok(library),
            Response::Failure(failure) => Err(CommunicationError::Rejected(failure.error)),
            other => Err(unexpected(&other)),
        }
    }

    pub async fn switch_book(&self, id: &str) -> Result<(), CommunicationError> {
        let command = Command::SwitchBook { id: id.to_string() };
        match self.acked(command).await? {
            true => Ok(()),
            false => Err(CommunicationError::Rejected(format!("switch to {id} refused"))),
        }
    }

    /// Returns the page's new current document id.
    pub async fn delete_book(&self, id: &str) -> Result<Option<String>, CommunicationError> {
        match self.send(Command::DeleteBook { id: id.to_string() }).await? {
            Response::Deleted(deleted) => Ok(deleted.new_current_id),
            Response::Failure(failure) => Err(CommunicationError::Rejected(failure.error)),
            other => Err(unexpected(&other)),
        }
    }

    async fn acked(&self, command: Command) -> Result<bool, CommunicationError> {
        match self.send(command).await? {
            Response::Ack(ack) => Ok(ack.success),
            Response::Failure(failure) => Err(CommunicationError::Rejected(failure.error)),
            other => Err(unexpected(&other)),
        }
    }
}

fn unexpected(reply: &Response) -> CommunicationError {
    CommunicationError::UnexpectedReply(format!("{reply:?}"))
}
