//! `moot cancel` — Abandon the active conversation.

use moot_core::conversation::ConversationState;
use moot_core::message::ChatId;

use super::context;

pub async fn run(chat: i64) -> anyhow::Result<()> {
    let config = context::load_config()?;
    let store = context::open_store(&config).await?;

    match store
        .update_state(ChatId(chat), ConversationState::Cancelled)
        .await?
    {
        Some(conversation) => {
            println!("✅ Cancelled conversation {}", conversation.id);
            println!("  Agenda: {}", conversation.agenda);
        }
        None => println!("  No active conversation to cancel."),
    }

    Ok(())
}
