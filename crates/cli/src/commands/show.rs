//! `moot show` — Show one conversation and its message log.

use moot_core::message::ConversationId;

use super::context;

pub async fn run(conversation_id: i64) -> anyhow::Result<()> {
    let config = context::load_config()?;
    let store = context::open_store(&config).await?;

    let conversation = store.get(ConversationId(conversation_id)).await?;
    println!("  Conversation {}", conversation.id);
    println!("  Agenda:  {}", conversation.agenda);
    println!("  State:   {}", conversation.state);
    println!(
        "  Opened:  {}",
        conversation.created_at.format("%Y-%m-%d %H:%M:%S")
    );
    if let Some(content_id) = &conversation.content_id {
        println!("  Published @ {content_id}");
    }

    let count = store.message_count(conversation.id).await?;
    let mut messages = store.recent_messages(conversation.id, count).await?;
    messages.reverse();

    if messages.is_empty() {
        println!();
        println!("  No messages recorded.");
        return Ok(());
    }

    println!();
    for message in messages {
        println!(
            "  [{}] {}: {}",
            message.timestamp.format("%H:%M:%S"),
            message.sender_label(),
            message.text
        );
    }

    Ok(())
}
