//! embedchat: embeddable chat widget runtime.
//!
//! A widget is a custom element a host page drops in with an `agent-id`.
//! Each instance owns one conversation session, talks to a chat backend,
//! keeps its history durable across reloads and renders itself inside a
//! style scope that cannot leak into the page.
//!
//! # Quick Start
//!
//! ```no_run
//! use embedchat::prelude::*;
//!
//! # async fn example() -> embedchat::error::Result<()> {
//! let config = WidgetConfig::load(None)?;
//! let attrs = WidgetAttributes::new("agent_123").with_agent_name("Ava");
//! let widget = mount(HostPage::global(), &attrs, WidgetDeps::from_config(config))?;
//!
//! let handle = WidgetRuntime::spawn(widget);
//! handle.toggle();
//! handle.submit("Hello");
//! let state = handle.wait_for(|s| s.messages.len() == 2).await;
//! println!("{:?}", state.map(|s| s.messages));
//! # Ok(())
//! # }
//! ```

pub mod audio;
pub mod config;
pub mod error;
pub mod persistence;
pub mod prelude;
pub mod render;
pub mod session;
pub mod store;
pub mod style;
pub mod transport;
pub mod types;
pub mod util;
pub mod widget;

#[cfg(feature = "cli")]
pub mod cli;
