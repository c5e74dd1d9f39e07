//! In-memory page model.
//!
//! Mirrors the parts of a DOM the session touches: element/text nodes,
//! parent links, ids and attributes. Used by tests and doc examples.

use std::collections::{BTreeMap, HashMap};

use super::host::{Direction, HostHandle, HostSurface};

#[derive(Debug, Clone)]
enum NodeKind {
    Element {
        tag: String,
        id: Option<String>,
        attributes: BTreeMap<String, String>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<HostHandle>,
    children: Vec<HostHandle>,
}

#[derive(Debug, Clone, Copy)]
struct Controls {
    prev: HostHandle,
    next: HostHandle,
    status: HostHandle,
}

#[derive(Debug, Clone)]
pub struct StaticPage {
    nodes: HashMap<HostHandle, Node>,
    next_handle: u64,
    root: HostHandle,
    body: HostHandle,
    highlighted: Option<HostHandle>,
    selecting_indicator: bool,
    status_indicator: Option<bool>,
    controls: Option<Controls>,
}

impl Default for StaticPage {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticPage {
    /// An empty `html > body` document.
    pub fn new() -> Self {
        let mut page = Self {
            nodes: HashMap::new(),
            next_handle: 0,
            root: HostHandle(0),
            body: HostHandle(0),
            highlighted: None,
            selecting_indicator: false,
            status_indicator: None,
            controls: None,
        };
        let root = page.insert(None, element("html"));
        page.root = root;
        page.body = page.insert(Some(root), element("body"));
        page
    }

    pub fn root(&self) -> HostHandle {
        self.root
    }

    pub fn body(&self) -> HostHandle {
        self.body
    }

    /// Append an element under `parent`. Returns `None` if `parent` is gone
    /// or is a text node.
    pub fn append_element(&mut self, parent: HostHandle, tag: &str) -> Option<HostHandle> {
        self.is_element(parent)
            .then(|| self.insert(Some(parent), element(tag)))
    }

    pub fn append_text(&mut self, parent: HostHandle, text: &str) -> Option<HostHandle> {
        self.is_element(parent)
            .then(|| self.insert(Some(parent), NodeKind::Text(text.to_string())))
    }

    /// Append `<tag>text</tag>` to the body.
    pub fn add_block(&mut self, tag: &str, text: &str) -> HostHandle {
        let block = self.insert(Some(self.body), element(tag));
        self.insert(Some(block), NodeKind::Text(text.to_string()));
        block
    }

    pub fn set_id(&mut self, handle: HostHandle, value: &str) -> bool {
        match self.nodes.get_mut(&handle).map(|n| &mut n.kind) {
            Some(NodeKind::Element { id, .. }) => {
                *id = Some(value.to_string());
                true
            }
            _ => false,
        }
    }

    pub fn set_attribute(&mut self, handle: HostHandle, name: &str, value: &str) -> bool {
        match self.nodes.get_mut(&handle).map(|n| &mut n.kind) {
            Some(NodeKind::Element { attributes, .. }) => {
                attributes.insert(name.to_string(), value.to_string());
                true
            }
            _ => false,
        }
    }

    pub fn attribute(&self, handle: HostHandle, name: &str) -> Option<&str> {
        match self.nodes.get(&handle).map(|n| &n.kind) {
            Some(NodeKind::Element { attributes, .. }) => attributes.get(name).map(String::as_str),
            _ => None,
        }
    }

    pub fn children(&self, handle: HostHandle) -> &[HostHandle] {
        self.nodes
            .get(&handle)
            .map_or(&[][..], |n| n.children.as_slice())
    }

    /// Detach `handle` and drop its whole subtree. Handles into the subtree
    /// stay around but no longer resolve.
    pub fn remove(&mut self, handle: HostHandle) -> bool {
        let Some(node) = self.nodes.get(&handle) else {
            return false;
        };
        if let Some(parent) = node.parent
            && let Some(parent) = self.nodes.get_mut(&parent)
        {
            parent.children.retain(|&child| child != handle);
        }

        let mut stack = vec![handle];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.remove(&next) {
                stack.extend(node.children);
            }
        }
        if self.highlighted == Some(handle) {
            self.highlighted = None;
        }
        true
    }

    pub fn contains(&self, handle: HostHandle) -> bool {
        self.nodes.contains_key(&handle)
    }

    pub fn highlighted(&self) -> Option<HostHandle> {
        self.highlighted
    }

    pub fn selecting_indicator(&self) -> bool {
        self.selecting_indicator
    }

    /// `None` until the session first reports its state.
    pub fn status_indicator(&self) -> Option<bool> {
        self.status_indicator
    }

    /// The installed page-turn button for `direction`, while it exists.
    pub fn control(&self, direction: Direction) -> Option<HostHandle> {
        let controls = self.controls?;
        let handle = match direction {
            Direction::Prev => controls.prev,
            Direction::Next => controls.next,
        };
        self.contains(handle).then_some(handle)
    }

    /// Text of the ON/OFF badge, once the controls are installed.
    pub fn status_badge(&self) -> Option<String> {
        self.text_content(self.controls?.status)
    }

    fn labelled(&mut self, parent: HostHandle, id: &str, label: &str) -> HostHandle {
        let handle = self.insert(Some(parent), element("div"));
        self.set_id(handle, id);
        self.insert(Some(handle), NodeKind::Text(label.to_string()));
        handle
    }

    fn insert(&mut self, parent: Option<HostHandle>, kind: NodeKind) -> HostHandle {
        let handle = HostHandle(self.next_handle);
        self.next_handle += 1;
        self.nodes.insert(
            handle,
            Node {
                kind,
                parent,
                children: Vec::new(),
            },
        );
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.push(handle);
        }
        handle
    }

    fn is_element(&self, handle: HostHandle) -> bool {
        matches!(
            self.nodes.get(&handle).map(|n| &n.kind),
            Some(NodeKind::Element { .. })
        )
    }

    fn collect_text(&self, handle: HostHandle, out: &mut String) {
        let Some(node) = self.nodes.get(&handle) else {
            return;
        };
        match &node.kind {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Element { .. } => {
                for child in &node.children {
                    self.collect_text(*child, out);
                }
            }
        }
    }
}

fn element(tag: &str) -> NodeKind {
    NodeKind::Element {
        tag: tag.to_ascii_lowercase(),
        id: None,
        attributes: BTreeMap::new(),
    }
}

impl HostSurface for StaticPage {
    fn text_content(&self, handle: HostHandle) -> Option<String> {
        let node = self.nodes.get(&handle)?;
        match &node.kind {
            NodeKind::Text(text) => Some(text.clone()),
            NodeKind::Element { .. } => {
                let mut out = String::new();
                self.collect_text(handle, &mut out);
                Some(out)
            }
        }
    }

    fn set_text_content(&mut self, handle: HostHandle, text: &str) -> bool {
        let Some(node) = self.nodes.get_mut(&handle) else {
            return false;
        };
        if let NodeKind::Text(existing) = &mut node.kind {
            *existing = text.to_string();
            return true;
        }

        let children = std::mem::take(&mut node.children);
        for child in children {
            let mut stack = vec![child];
            while let Some(next) = stack.pop() {
                if let Some(removed) = self.nodes.remove(&next) {
                    stack.extend(removed.children);
                }
            }
        }
        if !text.is_empty() {
            self.insert(Some(handle), NodeKind::Text(text.to_string()));
        }
        true
    }

    fn tag_name(&self, handle: HostHandle) -> Option<String> {
        match &self.nodes.get(&handle)?.kind {
            NodeKind::Element { tag, .. } => Some(tag.clone()),
            NodeKind::Text(_) => None,
        }
    }

    fn element_id(&self, handle: HostHandle) -> Option<String> {
        match &self.nodes.get(&handle)?.kind {
            NodeKind::Element { id, .. } => id.clone(),
            NodeKind::Text(_) => None,
        }
    }

    fn nearest_element(&self, handle: HostHandle) -> Option<HostHandle> {
        let mut current = handle;
        loop {
            let node = self.nodes.get(&current)?;
            match node.kind {
                NodeKind::Element { .. } => return Some(current),
                NodeKind::Text(_) => current = node.parent?,
            }
        }
    }

    fn install_controls(&mut self) {
        if self.controls.is_some() {
            return;
        }
        let panel = self.insert(Some(self.body), element("div"));
        self.set_id(panel, "touchfish-controls");
        let prev = self.labelled(panel, "touchfish-prev", "◀");
        let next = self.labelled(panel, "touchfish-next", "▶");
        let badge = if self.status_indicator == Some(true) { "ON" } else { "OFF" };
        let status = self.labelled(panel, "touchfish-status", badge);
        self.controls = Some(Controls { prev, next, status });
    }

    fn highlight(&mut self, target: Option<HostHandle>) {
        self.highlighted = target;
    }

    fn set_selecting_indicator(&mut self, on: bool) {
        self.selecting_indicator = on;
    }

    fn set_status_indicator(&mut self, active: bool) {
        self.status_indicator = Some(active);
        if let Some(controls) = self.controls {
            self.set_text_content(controls.status, if active { "ON" } else { "OFF" });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controls_are_own_and_track_status() {
        let mut page = StaticPage::new();
        assert_eq!(page.control(Direction::Next), None);

        page.install_controls();
        page.install_controls();
        assert_eq!(page.children(page.body()).len(), 1);

        let next = page.control(Direction::Next).unwrap();
        assert_eq!(page.element_id(next).as_deref(), Some("touchfish-next"));
        assert_eq!(page.text_content(next).as_deref(), Some("▶"));
        assert_eq!(page.status_badge().as_deref(), Some("OFF"));

        page.set_status_indicator(true);
        assert_eq!(page.status_badge().as_deref(), Some("ON"));

        let panel = page.children(page.body())[0];
        page.remove(panel);
        assert_eq!(page.control(Direction::Prev), None);
        assert_eq!(page.status_badge(), None);
    }

    #[test]
    fn test_text_content_concatenates_descendants() {
        let mut page = StaticPage::new();
        let div = page.append_element(page.body(), "DIV").unwrap();
        page.append_text(div, "Hello ").unwrap();
        let em = page.append_element(div, "em").unwrap();
        page.append_text(em, "world").unwrap();

        assert_eq!(page.text_content(div).as_deref(), Some("Hello world"));
        assert_eq!(page.tag_name(div).as_deref(), Some("div"));
    }

    #[test]
    fn test_set_text_content_keeps_attributes() {
        let mut page = StaticPage::new();
        let p = page.add_block("p", "original text");
        page.set_attribute(p, "style", "color: red");
        let text = page.children(p)[0];

        assert!(page.set_text_content(p, "replacement"));
        assert_eq!(page.text_content(p).as_deref(), Some("replacement"));
        assert_eq!(page.attribute(p, "style"), Some("color: red"));
        assert!(!page.contains(text));
    }

    #[test]
    fn test_nearest_element_from_text_node() {
        let mut page = StaticPage::new();
        let p = page.add_block("p", "some text here");
        let text = page.children(p)[0];
        assert_eq!(page.nearest_element(text), Some(p));
        assert_eq!(page.nearest_element(p), Some(p));
    }

    #[test]
    fn test_remove_invalidates_subtree() {
        let mut page = StaticPage::new();
        let p = page.add_block("p", "to be removed");
        let text = page.children(p)[0];

        assert!(page.remove(p));
        assert!(!page.contains(p));
        assert!(!page.contains(text));
        assert!(!page.set_text_content(p, "late write"));
        assert!(page.children(page.body()).is_empty());
        assert!(!page.remove(p));
    }
}
