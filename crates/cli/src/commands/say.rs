//! `moot say` — Record a message in the active conversation.

use chrono::Utc;
use moot_core::message::{Author, ChatId, ChatMessage, MessageId};

use super::context;

pub async fn run(
    chat: i64,
    author_id: i64,
    username: Option<String>,
    reply_to: Option<i64>,
    text: Vec<String>,
) -> anyhow::Result<()> {
    let text = text.join(" ");
    let config = context::load_config()?;
    let store = context::open_store(&config).await?;

    let Some(conversation) = store.active(ChatId(chat)).await? else {
        println!("  No active conversation. Open one with `moot new <agenda>`.");
        return Ok(());
    };

    // Ids come from the message source; here the CLI is the source, so the
    // next id follows the most recently recorded one.
    let next_id = store
        .recent_messages(conversation.id, 1)
        .await?
        .first()
        .map(|m| m.id.0 + 1)
        .unwrap_or(1);

    let mut author = Author::new(author_id);
    if let Some(username) = username {
        author = author.with_username(username);
    }

    let mut message = ChatMessage::new(MessageId(next_id), author, text, Utc::now());
    if let Some(parent_id) = reply_to {
        // Only the parent id is persisted; the link resolves at read time.
        let parent = ChatMessage::new(MessageId(parent_id), Author::new(0), "", Utc::now());
        message = message.with_reply_to(parent);
    }

    store.record_message(conversation.id, &message).await?;
    println!(
        "  Recorded message {} in conversation {}",
        next_id, conversation.id
    );

    Ok(())
}
