//! moot CLI — the main entry point.
//!
//! Commands:
//! - `init`    — Write a starter config and prepare the database
//! - `new`     — Open a conversation with an agenda
//! - `ls`      — List a chat's conversations
//! - `show`    — Show one conversation with its message log
//! - `say`     — Record a message in the active conversation
//! - `respond` — Stream the persona's reply to the active conversation
//! - `enter` / `exit` / `end` / `cancel` — Conversation lifecycle
//! - `summary` — Summarize the active conversation
//! - `publish` — Publish a complete conversation's transcript
//! - `propose` — Draft a proposal from a published transcript
//! - `doctor`  — Diagnose configuration and storage health

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "moot",
    about = "moot — deliberative conversations over a completion backend",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Chat the command operates in
    #[arg(short, long, global = true, default_value_t = 0)]
    chat: i64,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter moot.toml and prepare the database
    Init,

    /// Open a new conversation
    New {
        /// Agenda for the conversation
        #[arg(required = true)]
        agenda: Vec<String>,
    },

    /// List the chat's conversations, newest first
    Ls,

    /// Show one conversation and its message log
    Show {
        conversation_id: i64,
    },

    /// Record a message in the chat's active conversation
    Say {
        /// Author id
        #[arg(short, long)]
        author: i64,

        /// Author username, used for sender labels
        #[arg(short, long)]
        username: Option<String>,

        /// Message id this one replies to
        #[arg(short, long)]
        reply_to: Option<i64>,

        /// Message text
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Stream the persona's reply to the active conversation
    Respond,

    /// Reactivate an inactive conversation
    Enter {
        conversation_id: i64,
    },

    /// Set the active conversation aside for later
    Exit,

    /// Complete the active conversation
    End,

    /// Cancel the active conversation
    Cancel,

    /// Summarize the active conversation
    Summary,

    /// Publish a complete conversation's transcript
    Publish {
        conversation_id: i64,
    },

    /// Draft a proposal from a published transcript and an intent
    Propose {
        /// Content id of the published transcript
        content_id: String,

        /// What the proposal should argue for
        #[arg(required = true)]
        intent: Vec<String>,
    },

    /// Diagnose configuration and storage health
    Doctor,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Init => commands::init::run().await?,
        Commands::New { agenda } => commands::new::run(cli.chat, agenda).await?,
        Commands::Ls => commands::ls::run(cli.chat).await?,
        Commands::Show { conversation_id } => commands::show::run(conversation_id).await?,
        Commands::Say {
            author,
            username,
            reply_to,
            text,
        } => commands::say::run(cli.chat, author, username, reply_to, text).await?,
        Commands::Respond => commands::respond::run(cli.chat).await?,
        Commands::Enter { conversation_id } => {
            commands::enter::run(cli.chat, conversation_id).await?
        }
        Commands::Exit => commands::exit::run(cli.chat).await?,
        Commands::End => commands::end::run(cli.chat).await?,
        Commands::Cancel => commands::cancel::run(cli.chat).await?,
        Commands::Summary => commands::summary::run(cli.chat).await?,
        Commands::Publish { conversation_id } => commands::publish::run(conversation_id).await?,
        Commands::Propose { content_id, intent } => {
            commands::propose::run(content_id, intent).await?
        }
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
