//! # touchfish
//!
//! Read plain text, EPUB and PDF documents inside the text of an ordinary
//! web page.
//!
//! ## Components
//!
//! - [`extract`]: turn `.txt`, `.epub` and `.pdf` files into normalized text
//! - [`library`]: the persisted multi-document library over a [`KeyValueStore`]
//! - [`paging`]: character-based pagination
//! - [`disguise`]: the session that overwrites one host element with pages
//! - [`bridge`]: the closed command set between the popup and the page agent
//!
//! ## Quick Start
//!
//! ```
//! use touchfish::disguise::{HostSurface, StaticPage};
//! use touchfish::{Command, MemoryStore, PageAgent, ReaderConfig};
//!
//! # tokio_test_block_on(async {
//! let mut page = StaticPage::new();
//! let host = page.add_block("p", "A paragraph of the page being disguised.");
//!
//! let config = ReaderConfig::default();
//! let mut agent = PageAgent::start(MemoryStore::new(), page, &config).await.unwrap();
//! agent.handle(Command::LoadBook { content: "Chapter one.".into(), title: None }).await;
//! agent.handle(Command::ToggleActive).await;
//! agent.handle(Command::EnterSelectingMode).await;
//! agent.element_clicked(host).await;
//!
//! assert_eq!(agent.host().text_content(host).as_deref(), Some("Chapter one."));
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
//! # }
//! ```

pub mod agent;
pub mod background;
pub mod bridge;
pub mod config;
pub mod disguise;
pub(crate) mod epub;
pub mod error;
pub mod extract;
pub mod library;
pub mod paging;
pub mod store;
pub(crate) mod util;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use agent::PageAgent;
pub use background::{Background, BackgroundRequest, BackgroundResponse, Shortcut};
pub use bridge::{Bridge, Command, LocalTransport, Response, Status, Transport};
pub use config::ReaderConfig;
pub use error::{CommunicationError, Error, IngestionError, Result, StorageError};
pub use extract::{Extraction, Extractor, Format, IngestedFile, admit, extract, ingest};
pub use library::{DocumentRecord, Library, LibraryStore};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
