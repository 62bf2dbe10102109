//! `moot ls` — List conversations.

use moot_core::message::ChatId;

use super::context;

pub async fn run(chat: i64) -> anyhow::Result<()> {
    let config = context::load_config()?;
    let store = context::open_store(&config).await?;

    let conversations = store.list(ChatId(chat)).await?;
    if conversations.is_empty() {
        println!("  No conversations yet. Open one with `moot new <agenda>`.");
        return Ok(());
    }

    for conversation in conversations {
        println!("  {}: {}", conversation.id, conversation.agenda);
        println!("     state: {}", conversation.state);
        if let Some(content_id) = &conversation.content_id {
            println!("     published @ {content_id}");
        }
    }

    Ok(())
}
