//! Wire format of the page-context message handler.
//!
//! Requests are tagged by `action`. Replies carry no tag; each reply shape
//! has a distinct field set and rejects unknown fields, so a reply parses
//! back into exactly one variant.

use serde::{Deserialize, Serialize};

use crate::library::{Library, progress_percent};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Command {
    Ping,
    LoadBook {
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
    ToggleActive,
    GetStatus,
    NextPage,
    PrevPage,
    EnterSelectingMode,
    ExitSelectingMode,
    RestoreOriginalContent,
    GetBookList,
    SwitchBook {
        id: String,
    },
    DeleteBook {
        id: String,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Ping => "ping",
            Command::LoadBook { .. } => "loadBook",
            Command::ToggleActive => "toggleActive",
            Command::GetStatus => "getStatus",
            Command::NextPage => "nextPage",
            Command::PrevPage => "prevPage",
            Command::EnterSelectingMode => "enterSelectingMode",
            Command::ExitSelectingMode => "exitSelectingMode",
            Command::RestoreOriginalContent => "restoreOriginalContent",
            Command::GetBookList => "getBookList",
            Command::SwitchBook { .. } => "switchBook",
            Command::DeleteBook { .. } => "deleteBook",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Pong {
    pub alive: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActiveState {
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Ack {
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Failure {
    pub success: bool,
    pub error: String,
}

impl Failure {
    pub fn new(error: impl ToString) -> Self {
        Self {
            success: false,
            error: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Deleted {
    pub success: bool,
    pub new_current_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct LoadedBook {
    pub success: bool,
    pub id: String,
    pub total_pages: usize,
    pub current_page: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Status {
    pub active: bool,
    pub has_book: bool,
    pub current_page: usize,
    pub total_pages: usize,
    pub selecting_mode: bool,
}

impl Status {
    pub fn progress_percent(&self) -> u32 {
        progress_percent(self.current_page, self.total_pages)
    }
}

/// Every reply the page agent can send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Pong(Pong),
    Active(ActiveState),
    Ack(Ack),
    Failure(Failure),
    Deleted(Deleted),
    Loaded(LoadedBook),
    Status(Status),
    BookList(Library),
}

impl Response {
    pub fn ack(success: bool) -> Self {
        Response::Ack(Ack { success })
    }

    pub fn failure(error: impl ToString) -> Self {
        Response::Failure(Failure::new(error))
    }
}
