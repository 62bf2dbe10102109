//! `moot end` — Close the active conversation as complete.

use moot_core::conversation::ConversationState;
use moot_core::message::ChatId;

use super::context;

pub async fn run(chat: i64) -> anyhow::Result<()> {
    let config = context::load_config()?;
    let store = context::open_store(&config).await?;

    match store
        .update_state(ChatId(chat), ConversationState::Complete)
        .await?
    {
        Some(conversation) => {
            println!("✅ Completed conversation {}", conversation.id);
            println!("  Agenda: {}", conversation.agenda);
            println!("  Publish the transcript with `moot publish {}`", conversation.id);
        }
        None => println!("  No active conversation to complete."),
    }

    Ok(())
}
