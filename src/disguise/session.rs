use tracing::{debug, trace};

use super::host::{HostHandle, HostSurface, TextSelection, should_skip};
use crate::config::PagingConfig;
use crate::paging;

/// The document the session is paging through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedDocument {
    pub id: String,
    pub text: String,
    pub page_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    Escape,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub key: Key,
    pub ctrl: bool,
}

impl KeyPress {
    pub fn plain(key: Key) -> Self {
        Self { key, ctrl: false }
    }

    pub fn ctrl(key: Key) -> Self {
        Self { key, ctrl: true }
    }
}

/// Per-page disguise state.
///
/// `Inactive -> Active(no host) -> Active(host) <-> SelectingMode`.
/// Every operation whose precondition is unmet (no document, no host, not
/// active) does nothing and reports that through its return value; none of
/// them fail.
#[derive(Debug, Clone)]
pub struct Session {
    active: bool,
    selecting_mode: bool,
    selected_host: Option<HostHandle>,
    /// First capture of the selected host's text.
    original_content: String,
    page_size: usize,
    document: Option<LoadedDocument>,
    paging: PagingConfig,
}

impl Session {
    pub fn new(paging: PagingConfig) -> Self {
        Self {
            active: false,
            selecting_mode: false,
            selected_host: None,
            original_content: String::new(),
            page_size: paging.default_page_size.max(1),
            document: None,
            paging,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_selecting(&self) -> bool {
        self.selecting_mode
    }

    pub fn selected_host(&self) -> Option<HostHandle> {
        self.selected_host
    }

    pub fn original_content(&self) -> &str {
        &self.original_content
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn document(&self) -> Option<&LoadedDocument> {
        self.document.as_ref()
    }

    pub fn has_book(&self) -> bool {
        self.document.is_some()
    }

    pub fn current_page(&self) -> usize {
        self.document.as_ref().map_or(0, |d| d.page_index)
    }

    /// Page count of the loaded document at the session's page size.
    pub fn total_pages(&self) -> usize {
        self.document
            .as_ref()
            .map_or(0, |d| paging::total_pages(&d.text, self.page_size))
    }

    /// Restore the persisted flag without touching the page.
    pub fn restore_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Swap in a document. If a host is already showing a page, the new
    /// document's page is rendered right away.
    pub fn load_document<H: HostSurface + ?Sized>(&mut self, document: LoadedDocument, host: &mut H) {
        debug!(id = %document.id, index = document.page_index, "session document loaded");
        self.document = Some(document);
        if self.active && self.selected_host.is_some() {
            self.render(host);
        }
    }

    /// Forget the document. The host keeps whatever it shows until restored.
    pub fn clear_document(&mut self) {
        self.document = None;
    }

    /// Flip `active`. Deactivating puts the host's original text back and
    /// releases it.
    pub fn toggle_active<H: HostSurface + ?Sized>(&mut self, host: &mut H) -> bool {
        self.active = !self.active;
        if !self.active {
            if self.selecting_mode {
                self.exit_selecting_mode(host);
            }
            if let Some(handle) = self.selected_host.take() {
                host.set_text_content(handle, &self.original_content);
                self.original_content.clear();
            }
        }
        host.set_status_indicator(self.active);
        debug!(active = self.active, "toggled");
        self.active
    }

    pub fn enter_selecting_mode<H: HostSurface + ?Sized>(&mut self, host: &mut H) -> bool {
        if !self.active {
            return false;
        }
        self.selecting_mode = true;
        host.set_selecting_indicator(true);
        true
    }

    pub fn exit_selecting_mode<H: HostSurface + ?Sized>(&mut self, host: &mut H) {
        self.selecting_mode = false;
        host.highlight(None);
        host.set_selecting_indicator(false);
    }

    /// Pointer moved over `target` while picking a host.
    pub fn hover<H: HostSurface + ?Sized>(&mut self, host: &mut H, target: HostHandle) {
        if !self.selecting_mode {
            return;
        }
        if should_skip(host, target, self.paging.min_selection_chars) {
            host.highlight(None);
        } else {
            host.highlight(Some(target));
        }
    }

    /// Click on `target` in selecting mode.
    pub fn select_element<H: HostSurface + ?Sized>(&mut self, host: &mut H, target: HostHandle) -> bool {
        if !self.selecting_mode || should_skip(host, target, self.paging.min_selection_chars) {
            return false;
        }
        let Some(length) = self.adopt_host(host, target) else {
            return false;
        };
        self.page_size = paging::page_size_for(length, self.paging.min_page_size);
        self.exit_selecting_mode(host);
        if self.document.is_some() {
            self.render(host);
        }
        true
    }

    /// A text selection made while active and not picking. Selections longer
    /// than the threshold take over their nearest element.
    pub fn select_text_range<H: HostSurface + ?Sized>(
        &mut self,
        host: &mut H,
        selection: &TextSelection,
    ) -> bool {
        if !self.active || self.selecting_mode || self.document.is_none() {
            return false;
        }
        let length = selection.text.chars().count();
        if length <= self.paging.min_selection_chars {
            return false;
        }
        let Some(target) = host.nearest_element(selection.common_ancestor) else {
            return false;
        };
        if should_skip(host, target, self.paging.min_selection_chars) || self.adopt_host(host, target).is_none() {
            return false;
        }
        self.page_size = paging::page_size_for(length, self.paging.min_page_size);
        self.render(host)
    }

    /// Write the current page into the host.
    ///
    /// The stored index is clamped first, since the page size may have
    /// changed since it was saved.
    pub fn render<H: HostSurface + ?Sized>(&mut self, host: &mut H) -> bool {
        let Some(handle) = self.selected_host else {
            return false;
        };
        let page_size = self.page_size;
        let Some(document) = self.document.as_mut() else {
            return false;
        };

        let total = paging::total_pages(&document.text, page_size);
        document.page_index = paging::clamp_index(document.page_index, total);
        let text = paging::page(&document.text, page_size, document.page_index);

        if host.set_text_content(handle, text) {
            trace!(index = document.page_index, total, "rendered page");
            true
        } else {
            self.drop_host();
            false
        }
    }

    /// Advance one page. Returns the new index when it moved.
    pub fn next_page<H: HostSurface + ?Sized>(&mut self, host: &mut H) -> Option<usize> {
        self.selected_host?;
        let total = self.total_pages();
        let current = self.document.as_ref()?.page_index;
        let index = paging::next_index(current, total)?;
        self.turn_to(host, index)
    }

    /// Go back one page. Returns the new index when it moved.
    pub fn prev_page<H: HostSurface + ?Sized>(&mut self, host: &mut H) -> Option<usize> {
        self.selected_host?;
        let current = self.document.as_ref()?.page_index;
        let index = paging::prev_index(current)?;
        self.turn_to(host, index)
    }

    /// Show the host's own text again, keeping the selection.
    pub fn restore_original_content<H: HostSurface + ?Sized>(&mut self, host: &mut H) -> bool {
        let Some(handle) = self.selected_host else {
            return false;
        };
        if self.original_content.is_empty() {
            return false;
        }
        if host.set_text_content(handle, &self.original_content) {
            true
        } else {
            self.drop_host();
            false
        }
    }

    /// Keyboard routing. Returns the new page index when a page turned.
    pub fn key_pressed<H: HostSurface + ?Sized>(&mut self, host: &mut H, press: KeyPress) -> Option<usize> {
        if press.key == Key::Escape && self.selecting_mode {
            self.exit_selecting_mode(host);
            return None;
        }
        if !self.active || self.selected_host.is_none() || !press.ctrl {
            return None;
        }
        match press.key {
            Key::ArrowRight => self.next_page(host),
            Key::ArrowLeft => self.prev_page(host),
            _ => None,
        }
    }

    /// Render page `index`; on failure the index is left where it was.
    fn turn_to<H: HostSurface + ?Sized>(&mut self, host: &mut H, index: usize) -> Option<usize> {
        let document = self.document.as_mut()?;
        let previous = std::mem::replace(&mut document.page_index, index);
        if self.render(host) {
            Some(index)
        } else {
            if let Some(document) = self.document.as_mut() {
                document.page_index = previous;
            }
            None
        }
    }

    /// Take `target` as the host, capturing its text unless it is already the
    /// host. A different previous host gets its own text back first. Returns
    /// the character count of the captured text.
    fn adopt_host<H: HostSurface + ?Sized>(&mut self, host: &mut H, target: HostHandle) -> Option<usize> {
        if self.selected_host == Some(target) {
            return Some(self.original_content.chars().count());
        }
        let captured = host.text_content(target)?;
        if let Some(previous) = self.selected_host.take() {
            host.set_text_content(previous, &self.original_content);
        }
        let length = captured.chars().count();
        debug!(host = target.0, length, "host selected");
        self.selected_host = Some(target);
        self.original_content = captured;
        Some(length)
    }

    fn drop_host(&mut self) {
        if let Some(handle) = self.selected_host.take() {
            debug!(host = handle.0, "host no longer in page, selection dropped");
        }
        self.original_content.clear();
    }
}
