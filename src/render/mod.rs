//! Render engine: projects the message log into nodes, append-only.

pub mod bubble;
pub mod chrome;
pub mod node;

pub use bubble::{greeting_node, message_node, typing_node};
pub use node::{escape_html, Element, Node};

use crate::types::{Message, MessageId, Role};

/// Distance from the bottom, in pixels, still counted as "at the bottom".
pub const STICKY_SCROLL_THRESHOLD: f64 = 40.0;

/// Incremental change for a live DOM binding to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch {
    AppendMessage(Node),
    ShowTyping,
    HideTyping,
    ScrollToLatest,
}

/// Whether the message list is pinned to its newest entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollState {
    pub at_bottom: bool,
}

impl Default for ScrollState {
    fn default() -> Self {
        Self { at_bottom: true }
    }
}

/// Owns the rendered message list.
///
/// Each append costs one node and one patch; the existing list is never
/// rebuilt. Appending a message whose id was already rendered is a no-op.
#[derive(Debug, Default)]
pub struct RenderEngine {
    bubbles: Vec<Node>,
    last_rendered: Option<MessageId>,
    greeting: Option<String>,
    typing: bool,
    scroll: ScrollState,
    patches: Vec<Patch>,
}

impl RenderEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.greeting = Some(greeting.into());
        self
    }

    /// Append one bubble. Returns `false` if the message was already rendered.
    pub fn append_message(&mut self, message: &Message) -> bool {
        if self.last_rendered.is_some_and(|last| message.id <= last) {
            return false;
        }
        let node = message_node(message);
        self.bubbles.push(node.clone());
        self.last_rendered = Some(message.id);
        self.patches.push(Patch::AppendMessage(node));

        // The user's own message always brings the list back down.
        if message.role == Role::User {
            self.scroll.at_bottom = true;
        }
        self.scroll_if_pinned();
        true
    }

    pub fn show_typing(&mut self) {
        if self.typing {
            return;
        }
        self.typing = true;
        self.patches.push(Patch::ShowTyping);
        self.scroll_if_pinned();
    }

    pub fn hide_typing(&mut self) {
        if !self.typing {
            return;
        }
        self.typing = false;
        self.patches.push(Patch::HideTyping);
    }

    /// Record a user scroll; `offset_from_bottom` is pixels above the end.
    pub fn user_scrolled(&mut self, offset_from_bottom: f64) {
        self.scroll.at_bottom = offset_from_bottom <= STICKY_SCROLL_THRESHOLD;
    }

    fn scroll_if_pinned(&mut self) {
        if self.scroll.at_bottom {
            self.patches.push(Patch::ScrollToLatest);
        }
    }

    /// Take the patches produced since the last drain.
    pub fn drain_patches(&mut self) -> Vec<Patch> {
        std::mem::take(&mut self.patches)
    }

    pub fn bubble_count(&self) -> usize {
        self.bubbles.len()
    }

    pub fn bubbles(&self) -> &[Node] {
        &self.bubbles
    }

    pub fn typing_visible(&self) -> bool {
        self.typing
    }

    pub fn scroll_state(&self) -> ScrollState {
        self.scroll
    }

    /// The message container: greeting, bubbles, then the typing indicator last.
    pub fn messages_container(&self) -> Node {
        let mut container = Element::new("div")
            .class("ec-messages")
            .attr("role", "log")
            .attr("aria-live", "polite");
        if let Some(greeting) = &self.greeting {
            container = container.child(greeting_node(greeting));
        }
        container = container.children(self.bubbles.iter().cloned());
        if self.typing {
            container = container.child(typing_node());
        }
        container.into()
    }
}
