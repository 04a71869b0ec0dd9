//! Delivery wrappers around the one canonical widget.
//!
//! A host page gets the widget either from a static script asset or from a
//! script rendered by a backend function. Both end up with the same element
//! and the same runtime; they differ only in where configuration comes from.

use serde::Serialize;

use super::WidgetAttributes;
use crate::config::{Locale, WidgetConfig};
use crate::error::WidgetError;
use crate::render::{Element, Node};

/// Global the bootstrap script writes configuration into.
pub const BOOTSTRAP_GLOBAL: &str = "__EMBEDCHAT__";

/// Public, browser-safe subset of [`WidgetConfig`]. Never carries the API key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapConfig {
    pub agent_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
    pub chat_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_url: Option<String>,
    pub locale: Locale,
    pub context_window: usize,
    pub request_timeout_ms: u64,
    pub autosave_interval_ms: u64,
}

impl BootstrapConfig {
    pub fn new(config: &WidgetConfig, attrs: &WidgetAttributes) -> Result<Self, WidgetError> {
        let agent_id = attrs
            .agent_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(WidgetError::MissingAgentId)?;
        Ok(Self {
            agent_id: agent_id.to_string(),
            agent_name: attrs.agent_name.clone(),
            chat_url: config.chat_url.clone(),
            save_url: config.save_url.clone(),
            locale: config.locale,
            context_window: config.context_window,
            request_timeout_ms: config.request_timeout.as_millis() as u64,
            autosave_interval_ms: config.autosave_interval.as_millis() as u64,
        })
    }
}

fn loader_script(script_url: &str) -> Node {
    Element::new("script")
        .attr("src", script_url)
        .attr("async", "async")
        .into()
}

/// Snippet for the static-asset delivery: an async loader plus the custom tag.
pub fn static_embed(script_url: &str, attrs: &WidgetAttributes) -> Result<String, WidgetError> {
    if attrs.agent_id.as_deref().map(str::trim).unwrap_or("").is_empty() {
        return Err(WidgetError::MissingAgentId);
    }
    Ok(format!(
        "{}\n{}",
        loader_script(script_url).to_html(),
        attrs.element_node().to_html()
    ))
}

/// Markup for the server-rendered delivery: inline configuration, the loader
/// and the custom tag.
pub fn server_bootstrap(
    config: &WidgetConfig,
    script_url: &str,
    attrs: &WidgetAttributes,
) -> Result<String, WidgetError> {
    let bootstrap = BootstrapConfig::new(config, attrs)?;
    let json = serde_json::to_string(&bootstrap)
        .map_err(|e| WidgetError::Configuration(e.to_string()))?
        .replace('<', "\\u003c");
    let inline = format!(
        "window.{g} = window.{g} || {{}}; window.{g}.config = {json};",
        g = BOOTSTRAP_GLOBAL
    );
    let inline_script: Node = Element::new("script").child(Node::RawText(inline)).into();
    Ok(format!(
        "{}\n{}\n{}",
        inline_script.to_html(),
        loader_script(script_url).to_html(),
        attrs.element_node().to_html()
    ))
}
