//! The seam between the session and the page it disguises itself in.

/// Non-owning reference to a node in the host page.
///
/// The page owns its nodes. A handle may outlive the node it names, in
/// which case every lookup through it fails and the session treats the
/// operation as a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostHandle(pub u64);

/// Tags that are never content, whatever text they hold.
pub const SKIP_TAGS: &[&str] = &["html", "body", "head", "script", "style", "meta", "link"];

/// Id prefix of the reader's own injected controls.
pub const OWN_ID_PREFIX: &str = "touchfish-";

/// Which way one of the reader's page-turn controls flips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Prev,
    Next,
}

/// The host page as seen by the disguise session.
///
/// Lookups return `None` (and writes return `false`) when the handle no
/// longer names a live node. The presentation hooks have no effect on the
/// page text and default to doing nothing.
pub trait HostSurface {
    /// Concatenated text of the node and its descendants.
    fn text_content(&self, handle: HostHandle) -> Option<String>;

    /// Replace the node's children with a single text node. Attributes and
    /// styling of the node itself are left alone.
    fn set_text_content(&mut self, handle: HostHandle, text: &str) -> bool;

    /// Lowercase tag name; `None` for text nodes.
    fn tag_name(&self, handle: HostHandle) -> Option<String>;

    fn element_id(&self, handle: HostHandle) -> Option<String>;

    /// The node itself if it is an element, else its closest element ancestor.
    fn nearest_element(&self, handle: HostHandle) -> Option<HostHandle>;

    /// Add the reader's corner controls: a previous and a next button and
    /// the status badge. Their ids carry [`OWN_ID_PREFIX`].
    fn install_controls(&mut self) {}

    /// Outline the hovered candidate, or hide the outline.
    fn highlight(&mut self, _target: Option<HostHandle>) {}

    /// Crosshair cursor and the "pick an area" hint.
    fn set_selecting_indicator(&mut self, _on: bool) {}

    /// ON/OFF badge in the reader's corner control.
    fn set_status_indicator(&mut self, _active: bool) {}
}

/// A text selection made by the user outside selecting mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSelection {
    /// Deepest node containing the whole selection.
    pub common_ancestor: HostHandle,
    pub text: String,
}

/// Whether `target` is unfit to host the disguise.
///
/// Structural tags, the reader's own controls, and nodes with fewer than
/// `min_chars` characters of trimmed text are skipped, as are handles that
/// no longer resolve.
pub fn should_skip<H: HostSurface + ?Sized>(host: &H, target: HostHandle, min_chars: usize) -> bool {
    let Some(tag) = host.tag_name(target) else {
        return true;
    };
    if SKIP_TAGS.contains(&tag.as_str()) {
        return true;
    }
    if host
        .element_id(target)
        .is_some_and(|id| id.starts_with(OWN_ID_PREFIX))
    {
        return true;
    }
    host.text_content(target)
        .is_none_or(|text| text.trim().chars().count() < min_chars)
}
