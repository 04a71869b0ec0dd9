//! Style isolation and page-wide, once-only registration.

pub mod sheet;

pub use sheet::{SCOPE_ATTR, STYLESHEET};

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use crate::render::{Element, Node};
use crate::types::SessionId;

/// Id of the single `<style>` element shared by all widgets on a page.
pub const STYLE_MARKER_ID: &str = "embedchat-styles";
/// Custom element tag.
pub const ELEMENT_TAG: &str = "embedchat-widget";

static GLOBAL_PAGE: OnceLock<HostPage> = OnceLock::new();

/// Page-wide registration state: injected style blocks, defined elements and
/// the sessions owned by live widgets.
///
/// Every registration goes through a checked guard, so loading the widget
/// script twice or mounting many instances installs each thing once.
#[derive(Debug, Default)]
pub struct HostPage {
    state: Mutex<PageState>,
    sessions: Arc<Mutex<HashSet<String>>>,
}

#[derive(Debug, Default)]
struct PageState {
    styles: Vec<(String, String)>,
    defined: HashSet<String>,
}

impl HostPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide page.
    pub fn global() -> &'static HostPage {
        GLOBAL_PAGE.get_or_init(HostPage::new)
    }

    fn state(&self) -> MutexGuard<'_, PageState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Install `css` under `marker_id` unless it is already present.
    /// Returns `true` if this call installed it.
    pub fn inject_style_once(&self, marker_id: &str, css: &str) -> bool {
        let mut state = self.state();
        if state.styles.iter().any(|(id, _)| id == marker_id) {
            return false;
        }
        state.styles.push((marker_id.to_string(), css.to_string()));
        tracing::debug!(marker_id, "Injected widget styles");
        true
    }

    /// Register a custom element tag unless already defined.
    /// Returns `true` if this call defined it.
    pub fn define_element_once(&self, tag: &str) -> bool {
        let inserted = self.state().defined.insert(tag.to_string());
        if inserted {
            tracing::debug!(tag, "Defined custom element");
        }
        inserted
    }

    pub fn is_defined(&self, tag: &str) -> bool {
        self.state().defined.contains(tag)
    }

    pub fn style_marker_count(&self, marker_id: &str) -> usize {
        self.state()
            .styles
            .iter()
            .filter(|(id, _)| id == marker_id)
            .count()
    }

    /// Take ownership of `session_id` for one live widget.
    ///
    /// Returns `None` while another widget on this page holds it. The claim
    /// is released when the returned guard is dropped.
    pub fn claim_session(&self, session_id: &SessionId) -> Option<SessionClaim> {
        let mut sessions = self.sessions.lock().unwrap_or_else(|p| p.into_inner());
        if !sessions.insert(session_id.as_str().to_string()) {
            return None;
        }
        Some(SessionClaim {
            session_id: session_id.as_str().to_string(),
            sessions: Arc::clone(&self.sessions),
        })
    }

    pub fn is_session_claimed(&self, session_id: &SessionId) -> bool {
        self.sessions
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .contains(session_id.as_str())
    }

    /// `<style>` elements to place in the document head.
    pub fn head_nodes(&self) -> Vec<Node> {
        self.state()
            .styles
            .iter()
            .map(|(id, css)| {
                Element::new("style")
                    .attr("id", id.as_str())
                    .child(Node::RawText(css.clone()))
                    .into()
            })
            .collect()
    }
}

/// A live widget's hold on its session id. Dropping it frees the id.
#[derive(Debug)]
pub struct SessionClaim {
    session_id: String,
    sessions: Arc<Mutex<HashSet<String>>>,
}

impl Drop for SessionClaim {
    fn drop(&mut self) {
        self.sessions
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(&self.session_id);
    }
}

/// Isolated style scope around a widget's root.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShadowScope;

impl ShadowScope {
    /// Make sure the shared stylesheet is on the page.
    pub fn install(page: &HostPage) -> bool {
        page.inject_style_once(STYLE_MARKER_ID, STYLESHEET)
    }

    /// Wrap widget content in the scoped container.
    pub fn wrap(children: impl IntoIterator<Item = Node>, state: &str) -> Node {
        Element::new("div")
            .attr(SCOPE_ATTR, "")
            .class("ec-root")
            .attr("data-state", state)
            .children(children)
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_injected_once_per_page() {
        let page = HostPage::new();
        assert!(ShadowScope::install(&page));
        assert!(!ShadowScope::install(&page));
        assert!(!ShadowScope::install(&page));
        assert_eq!(page.style_marker_count(STYLE_MARKER_ID), 1);
        assert_eq!(page.head_nodes().len(), 1);
    }

    #[test]
    fn element_defined_once() {
        let page = HostPage::new();
        assert!(page.define_element_once(ELEMENT_TAG));
        assert!(!page.define_element_once(ELEMENT_TAG));
        assert!(page.is_defined(ELEMENT_TAG));
    }

    #[test]
    fn separate_pages_do_not_share_guards() {
        let a = HostPage::new();
        let b = HostPage::new();
        assert!(ShadowScope::install(&a));
        assert!(ShadowScope::install(&b));
    }

    #[test]
    fn session_claim_is_exclusive_until_dropped() {
        let page = HostPage::new();
        let id = SessionId::from_existing("conv_shared");
        let claim = page.claim_session(&id);
        assert!(claim.is_some());
        assert!(page.claim_session(&id).is_none());
        assert!(page.is_session_claimed(&id));

        drop(claim);
        assert!(!page.is_session_claimed(&id));
        assert!(page.claim_session(&id).is_some());
    }

    #[test]
    fn stylesheet_body_is_kept_verbatim_but_cannot_break_out() {
        let page = HostPage::new();
        page.inject_style_once("x", "a > b { font-family: \"X\"; } </style>");
        let html = page.head_nodes()[0].to_html();
        assert!(html.contains("a > b { font-family: \"X\"; }"));
        assert!(html.ends_with("<\\/style></style>"));
    }
}
