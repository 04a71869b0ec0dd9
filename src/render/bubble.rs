//! Pure projections from messages to nodes.

use super::node::{Element, Node};
use crate::types::{Message, Role};

pub const MESSAGE_CLASS: &str = "ec-message";
pub const TYPING_CLASS: &str = "ec-typing";
pub const GREETING_CLASS: &str = "ec-greeting";

/// Bubble subtree for one message.
pub fn message_node(message: &Message) -> Node {
    let role_class = match message.role {
        Role::User => "ec-message--user",
        Role::Assistant => "ec-message--assistant",
    };
    Element::new("div")
        .class(format!("{MESSAGE_CLASS} {role_class}"))
        .attr("data-message-id", message.id.0.to_string())
        .attr("data-role", message.role.to_string())
        .child(Element::new("div").class("ec-bubble").text(message.text.clone()))
        .child(
            Element::new("time")
                .class("ec-time")
                .attr("datetime", message.timestamp.to_rfc3339())
                .text(message.timestamp.format("%H:%M").to_string()),
        )
        .into()
}

/// Three-dot typing indicator.
pub fn typing_node() -> Node {
    let dot = || Node::from(Element::new("span").class("ec-dot"));
    Element::new("div")
        .class(TYPING_CLASS)
        .attr("aria-label", "Assistant is typing")
        .children([dot(), dot(), dot()])
        .into()
}

/// Intro line shown before the first message. Not part of the log.
pub fn greeting_node(text: &str) -> Node {
    Element::new("div").class(GREETING_CLASS).text(text).into()
}
