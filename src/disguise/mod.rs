//! Disguise: overwrite one element of the host page with document pages
//! and put its own text back on request.

mod host;
mod page;
mod session;

pub use host::{
    Direction, HostHandle, HostSurface, OWN_ID_PREFIX, SKIP_TAGS, TextSelection, should_skip,
};
pub use page::StaticPage;
pub use session::{Key, KeyPress, LoadedDocument, Session};
