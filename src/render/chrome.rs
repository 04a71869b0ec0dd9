//! Static widget chrome: toggle, header, input row.

use super::node::{Element, Node};
use crate::config::Locale;
use crate::types::SessionId;

/// Ids of one instance's interactive controls, derived from its session so
/// several widgets on a page never repeat an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlIds {
    pub toggle: String,
    pub close: String,
    pub input: String,
    pub send: String,
}

impl ControlIds {
    pub fn for_session(session_id: &SessionId) -> Self {
        let id = |control: &str| format!("ec-{}-{control}", session_id.as_str());
        Self {
            toggle: id("toggle"),
            close: id("close"),
            input: id("input"),
            send: id("send"),
        }
    }

    /// Visual order, which is also DOM order.
    pub fn in_visual_order(&self) -> Vec<String> {
        vec![
            self.toggle.clone(),
            self.close.clone(),
            self.input.clone(),
            self.send.clone(),
        ]
    }
}

pub fn toggle_node(ids: &ControlIds, locale: Locale, open: bool) -> Node {
    Element::new("button")
        .attr("id", ids.toggle.as_str())
        .attr("type", "button")
        .class("ec-toggle")
        .attr("tabindex", "0")
        .attr("aria-label", locale.open_label())
        .attr("aria-expanded", open.to_string())
        .text("💬")
        .into()
}

pub fn header_node(ids: &ControlIds, agent_name: &str, locale: Locale) -> Node {
    let initial = agent_name
        .chars()
        .find(|c| c.is_alphanumeric())
        .map(|c| c.to_uppercase().collect::<String>())
        .unwrap_or_else(|| "?".to_string());
    Element::new("header")
        .class("ec-header")
        .child(
            Element::new("span")
                .class("ec-avatar")
                .attr("aria-hidden", "true")
                .text(initial),
        )
        .child(Element::new("span").class("ec-title").text(agent_name))
        .child(
            Element::new("button")
                .attr("id", ids.close.as_str())
                .attr("type", "button")
                .class("ec-close")
                .attr("tabindex", "0")
                .attr("aria-label", locale.close_label())
                .text("×"),
        )
        .into()
}

pub fn input_node(ids: &ControlIds, locale: Locale, draft: &str, disabled: bool) -> Node {
    let mut send = Element::new("button")
        .attr("id", ids.send.as_str())
        .attr("type", "submit")
        .class("ec-send")
        .attr("tabindex", "0");
    if disabled {
        send = send.attr("disabled", "disabled");
    }
    Element::new("form")
        .class("ec-input-row")
        .child(
            Element::new("input")
                .attr("id", ids.input.as_str())
                .attr("type", "text")
                .class("ec-input")
                .attr("tabindex", "0")
                .attr("placeholder", locale.input_placeholder())
                .attr("autocomplete", "off")
                .attr("value", draft),
        )
        .child(send.text(locale.send_label()))
        .into()
}

/// Ids of keyboard-focusable elements in document order. Only elements in
/// the natural tab sequence (`tabindex="0"`) are listed.
pub fn focus_order(root: &Node) -> Vec<String> {
    root.elements()
        .into_iter()
        .filter(|el| el.get_attr("tabindex") == Some("0"))
        .filter_map(|el| el.get_attr("id").map(str::to_string))
        .collect()
}
