//! The page agent: the one object that lives in a page context.
//!
//! It owns the disguise session, the host page and a handle to the library,
//! answers every bridge command, and turns user input into session
//! transitions. State that must survive the page (the page index, the
//! active flag) is written through the library after each change.

use tracing::{debug, warn};

use crate::bridge::{ActiveState, Command, Deleted, LoadedBook, Pong, Response, Status};
use crate::config::ReaderConfig;
use crate::disguise::{
    Direction, HostHandle, HostSurface, KeyPress, LoadedDocument, Session, TextSelection,
};
use crate::error::StorageError;
use crate::library::{DocumentRecord, LibraryStore};
use crate::store::KeyValueStore;

pub struct PageAgent<S, H> {
    session: Session,
    library: LibraryStore<S>,
    host: H,
}

impl<S: KeyValueStore, H: HostSurface> PageAgent<S, H> {
    /// Start an agent in a freshly loaded page.
    ///
    /// Upgrades a legacy single-document store, then restores the active
    /// flag and the current document. Apart from the corner controls the
    /// page is untouched until the user picks a host.
    pub async fn start(store: S, mut host: H, config: &ReaderConfig) -> Result<Self, StorageError> {
        let library = LibraryStore::new(store);
        let mut session = Session::new(config.paging.clone());

        library
            .migrate_legacy_schema(session.page_size())
            .await?;

        let active = library.session_active().await?;
        session.restore_active(active);
        if let Some(record) = library.current_document().await? {
            session.load_document(loaded(&record), &mut host);
        }
        host.install_controls();
        host.set_status_indicator(active);

        debug!(active, has_book = session.has_book(), "page agent started");
        Ok(Self {
            session,
            library,
            host,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn library(&self) -> &LibraryStore<S> {
        &self.library
    }

    pub fn status(&self) -> Status {
        Status {
            active: self.session.is_active(),
            has_book: self.session.has_book(),
            current_page: self.session.current_page(),
            total_pages: self.session.total_pages(),
            selecting_mode: self.session.is_selecting(),
        }
    }

    /// Answer one command. Never fails: problems become a failure reply.
    pub async fn handle(&mut self, command: Command) -> Response {
        debug!(command = command.name(), "handling command");
        match command {
            Command::Ping => Response::Pong(Pong { alive: true }),
            Command::LoadBook { content, title } => self.load_book(&content, title.as_deref()).await,
            Command::ToggleActive => {
                let active = self.session.toggle_active(&mut self.host);
                self.persist_active().await;
                Response::Active(ActiveState { active })
            }
            Command::GetStatus => Response::Status(self.status()),
            Command::NextPage => {
                let turned = self.session.next_page(&mut self.host);
                self.persist_page(turned).await;
                Response::ack(true)
            }
            Command::PrevPage => {
                let turned = self.session.prev_page(&mut self.host);
                self.persist_page(turned).await;
                Response::ack(true)
            }
            Command::EnterSelectingMode => {
                Response::ack(self.session.enter_selecting_mode(&mut self.host))
            }
            Command::ExitSelectingMode => {
                self.session.exit_selecting_mode(&mut self.host);
                Response::ack(true)
            }
            Command::RestoreOriginalContent => {
                self.session.restore_original_content(&mut self.host);
                Response::ack(true)
            }
            Command::GetBookList => match self.library.list_documents().await {
                Ok(library) => Response::BookList(library),
                Err(e) => Response::failure(e),
            },
            Command::SwitchBook { id } => match self.library.switch_current(&id).await {
                Ok(record) => {
                    self.session.load_document(loaded(&record), &mut self.host);
                    Response::ack(true)
                }
                Err(e) => Response::failure(e),
            },
            Command::DeleteBook { id } => self.delete_book(&id).await,
        }
    }

    /// Message-handler entry point: JSON in, JSON out.
    pub async fn handle_message(&mut self, raw: &str) -> String {
        let response = match serde_json::from_str::<Command>(raw) {
            Ok(command) => self.handle(command).await,
            Err(e) => {
                warn!(error = %e, "unreadable command");
                Response::failure(format!("unreadable command: {e}"))
            }
        };
        serde_json::to_string(&response)
            .unwrap_or_else(|e| format!(r#"{{"success":false,"error":"{e}"}}"#))
    }

    pub fn pointer_over(&mut self, target: HostHandle) {
        self.session.hover(&mut self.host, target);
    }

    pub async fn element_clicked(&mut self, target: HostHandle) -> bool {
        let selected = self.session.select_element(&mut self.host, target);
        if selected {
            self.persist_position().await;
        }
        selected
    }

    pub async fn text_selected(&mut self, selection: &TextSelection) -> bool {
        let selected = self.session.select_text_range(&mut self.host, selection);
        if selected {
            self.persist_position().await;
        }
        selected
    }

    /// A click on one of the corner page-turn controls. Returns the new
    /// page index when the page moved.
    pub async fn control_clicked(&mut self, direction: Direction) -> Option<usize> {
        let turned = match direction {
            Direction::Prev => self.session.prev_page(&mut self.host),
            Direction::Next => self.session.next_page(&mut self.host),
        };
        self.persist_page(turned).await;
        turned
    }

    pub async fn key_pressed(&mut self, press: KeyPress) {
        let turned = self.session.key_pressed(&mut self.host, press);
        self.persist_page(turned).await;
    }

    /// Final persist before the page goes away. Returns the host page.
    pub async fn shutdown(self) -> H {
        self.persist_position().await;
        self.persist_active().await;
        debug!("page agent shut down");
        self.host
    }

    async fn load_book(&mut self, content: &str, title: Option<&str>) -> Response {
        if content.trim().is_empty() {
            return Response::failure("book content is empty");
        }
        let record = match self
            .library
            .import_document(content, title, self.session.page_size())
            .await
        {
            Ok(record) => record,
            Err(e) => return Response::failure(e),
        };
        self.session.load_document(loaded(&record), &mut self.host);
        self.persist_active().await;

        Response::Loaded(LoadedBook {
            success: true,
            id: record.id,
            total_pages: record.total_pages,
            current_page: 0,
        })
    }

    async fn delete_book(&mut self, id: &str) -> Response {
        let new_current_id = match self.library.delete_document(id).await {
            Ok(new_current) => new_current,
            Err(e) => return Response::failure(e),
        };

        let showing = self.session.document().map(|d| d.id.as_str());
        if showing != new_current_id.as_deref() {
            match self.library.current_document().await {
                Ok(Some(record)) => self.session.load_document(loaded(&record), &mut self.host),
                Ok(None) => self.session.clear_document(),
                Err(e) => warn!(error = %e, "could not reload current document"),
            }
        }

        Response::Deleted(Deleted {
            success: true,
            new_current_id,
        })
    }

    async fn persist_page(&self, turned: Option<usize>) {
        if turned.is_some() {
            self.persist_position().await;
        }
    }

    /// Only a page showing the document has a page size worth saving.
    async fn persist_position(&self) {
        let Some(document) = self.session.document() else {
            return;
        };
        if self.session.selected_host().is_none() {
            return;
        }
        if let Err(e) = self
            .library
            .update_current_page(
                &document.id,
                document.page_index,
                self.session.page_size(),
            )
            .await
        {
            warn!(id = %document.id, error = %e, "could not save reading position");
        }
    }

    async fn persist_active(&self) {
        if let Err(e) = self.library.set_session_active(self.session.is_active()).await {
            warn!(error = %e, "could not save active flag");
        }
    }
}

fn loaded(record: &DocumentRecord) -> LoadedDocument {
    LoadedDocument {
        id: record.id.clone(),
        text: record.full_text.clone(),
        page_index: record.current_page_index,
    }
}
