//! `moot respond` — Stream the persona's reply to the active conversation.

use std::io::Write;

use moot_agent::PromptKind;
use moot_core::message::ChatId;

use super::context;

pub async fn run(chat: i64) -> anyhow::Result<()> {
    let config = context::load_config()?;
    let store = context::open_store(&config).await?;

    let Some(conversation) = store.active(ChatId(chat)).await? else {
        println!("  No active conversation to respond to.");
        return Ok(());
    };

    let count = store.message_count(conversation.id).await?;
    let history = store.recent_messages(conversation.id, count).await?;

    let responder = context::build_responder(&config);
    let mut stream = responder.respond(&history, PromptKind::Proposal, conversation.id)?;

    print!("  {} > ", config.personas.proposal.name);
    std::io::stdout().flush()?;
    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(chunk) => {
                print!("{}", chunk.text);
                std::io::stdout().flush()?;
            }
            Err(e) => {
                println!();
                return Err(e.into());
            }
        }
    }
    println!();

    Ok(())
}
