//! CLI entry point for embedchat.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// embedchat widget CLI
#[derive(Parser, Debug)]
#[command(name = "embedchat", version, about = "Drive and embed the embedchat widget")]
pub struct Cli {
    /// TOML config file layered under `EMBEDCHAT_*` environment variables
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Chat with an agent from the terminal through a headless widget
    Chat(ChatArgs),
    /// Print the static-asset embed snippet
    Snippet(SnippetArgs),
    /// Print the server-rendered bootstrap markup
    Bootstrap(BootstrapArgs),
}

/// Arguments for the `chat` subcommand.
#[derive(Parser, Debug)]
pub struct ChatArgs {
    /// Agent to talk to
    #[arg(long)]
    pub agent_id: String,

    /// Display name shown in the widget header
    #[arg(long)]
    pub agent_name: Option<String>,

    /// Override the chat endpoint
    #[arg(long)]
    pub chat_url: Option<String>,

    /// Override the auto-save endpoint
    #[arg(long)]
    pub save_url: Option<String>,

    /// Discard the remembered conversation and start a new one
    #[arg(long)]
    pub new_session: bool,
}

/// Arguments for the `snippet` subcommand.
#[derive(Parser, Debug)]
pub struct SnippetArgs {
    #[arg(long)]
    pub agent_id: String,

    #[arg(long)]
    pub agent_name: Option<String>,

    /// URL the widget script is served from
    #[arg(long)]
    pub script_url: String,
}

/// Arguments for the `bootstrap` subcommand.
#[derive(Parser, Debug)]
pub struct BootstrapArgs {
    #[arg(long)]
    pub agent_id: String,

    #[arg(long)]
    pub agent_name: Option<String>,

    /// URL the widget script is served from
    #[arg(long, default_value = "/embedchat.js")]
    pub script_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_chat_with_overrides() {
        let cli = Cli::parse_from([
            "embedchat",
            "chat",
            "--agent-id",
            "agent_123",
            "--chat-url",
            "http://localhost:9/chat",
        ]);
        let Commands::Chat(args) = cli.command else {
            panic!("expected chat");
        };
        assert_eq!(args.agent_id, "agent_123");
        assert_eq!(args.chat_url.as_deref(), Some("http://localhost:9/chat"));
        assert!(!args.new_session);
    }

    #[test]
    fn bootstrap_has_default_script_url() {
        let cli = Cli::parse_from(["embedchat", "bootstrap", "--agent-id", "a"]);
        let Commands::Bootstrap(args) = cli.command else {
            panic!("expected bootstrap");
        };
        assert_eq!(args.script_url, "/embedchat.js");
    }
}
