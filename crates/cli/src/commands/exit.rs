//! `moot exit` — Set the active conversation aside without closing it.

use moot_core::conversation::ConversationState;
use moot_core::message::ChatId;

use super::context;

pub async fn run(chat: i64) -> anyhow::Result<()> {
    let config = context::load_config()?;
    let store = context::open_store(&config).await?;

    match store
        .update_state(ChatId(chat), ConversationState::Inactive)
        .await?
    {
        Some(conversation) => {
            println!("✅ Set aside conversation {}", conversation.id);
            println!("  Resume later with `moot enter {}`", conversation.id);
        }
        None => println!("  No active conversation to set aside."),
    }

    Ok(())
}
