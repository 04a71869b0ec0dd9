//! embedchat CLI binary entry point.

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use embedchat::cli::{BootstrapArgs, ChatArgs, Cli, Commands, SnippetArgs};
use embedchat::config::WidgetConfig;
use embedchat::style::HostPage;
use embedchat::types::{AgentId, Message, Role};
use embedchat::widget::delivery::{server_bootstrap, static_embed};
use embedchat::widget::{mount, WidgetAttributes, WidgetDeps, WidgetRuntime};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match WidgetConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Chat(args) => handle_chat(config, args).await,
        Commands::Snippet(args) => handle_snippet(args),
        Commands::Bootstrap(args) => handle_bootstrap(config, args),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn attributes(agent_id: String, agent_name: Option<String>) -> WidgetAttributes {
    let attrs = WidgetAttributes::new(agent_id);
    match agent_name {
        Some(name) => attrs.with_agent_name(name),
        None => attrs,
    }
}

fn print_message(agent_name: &str, message: &Message) {
    match message.role {
        Role::User => println!("you> {}", message.text),
        Role::Assistant => println!("{agent_name}> {}", message.text),
    }
}

async fn handle_chat(
    mut config: WidgetConfig,
    args: ChatArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(url) = args.chat_url {
        config.chat_url = url;
    }
    if let Some(url) = args.save_url {
        config.save_url = Some(url);
    }

    let deps = WidgetDeps::from_config(config);
    if args.new_session {
        deps.persistence.start_over(&AgentId::parse(&args.agent_id)?);
    }
    let attrs = attributes(args.agent_id, args.agent_name);
    let widget = mount(HostPage::global(), &attrs, deps)?;
    let agent_name = widget.agent_name().to_string();
    let greeting = widget.controller().locale().greeting();

    let handle = WidgetRuntime::spawn(widget);
    handle.toggle();

    let history = handle.snapshot().messages;
    if history.is_empty() {
        println!("{agent_name}> {greeting}");
    }
    for message in &history {
        print_message(&agent_name, message);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        let before = handle.snapshot().messages.len();
        if !handle.submit(text) {
            break;
        }
        let Some(state) = handle
            .wait_for(|s| !s.pending && s.messages.len() >= before + 2)
            .await
        else {
            break;
        };
        for message in state.messages.iter().skip(before + 1) {
            print_message(&agent_name, message);
        }
    }

    handle.unload();
    if let Some(widget) = handle.join().await {
        tracing::info!(session_id = %widget.session().session_id(), "Chat ended");
    }
    Ok(())
}

fn handle_snippet(args: SnippetArgs) -> Result<(), Box<dyn std::error::Error>> {
    let attrs = attributes(args.agent_id, args.agent_name);
    println!("{}", static_embed(&args.script_url, &attrs)?);
    Ok(())
}

fn handle_bootstrap(
    config: WidgetConfig,
    args: BootstrapArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let attrs = attributes(args.agent_id, args.agent_name);
    println!("{}", server_bootstrap(&config, &args.script_url, &attrs)?);
    Ok(())
}
