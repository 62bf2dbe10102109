//! `moot enter` — Resume an inactive conversation.

use moot_core::conversation::ConversationState;
use moot_core::error::{Error, StateError};
use moot_core::message::{ChatId, ConversationId};

use super::context;

pub async fn run(chat: i64, conversation_id: i64) -> anyhow::Result<()> {
    let config = context::load_config()?;
    let store = context::open_store(&config).await?;

    let id = ConversationId(conversation_id);
    if let Some(conversation) = store.enter(id).await? {
        println!("✅ Resumed conversation {}", conversation.id);
        println!("  Agenda: {}", conversation.agenda);
        return Ok(());
    }

    // The swap was refused. Work out which rule blocked it.
    match store.get(id).await {
        Err(Error::State(StateError::ConversationNotFound(_))) => {
            println!("  Conversation {conversation_id} does not exist.");
        }
        Err(e) => return Err(e.into()),
        Ok(conversation) => match conversation.state {
            ConversationState::Active => {
                println!("  Conversation {conversation_id} is already active.");
            }
            ConversationState::Complete | ConversationState::Cancelled => {
                println!(
                    "  Conversation {conversation_id} is {} and cannot be resumed.",
                    conversation.state
                );
            }
            ConversationState::Inactive => {
                if let Some(active) = store.active(ChatId(chat)).await? {
                    println!("  Conversation {} is still active.", active.id);
                    println!("  Run `moot exit` before entering another one.");
                } else {
                    println!("  Conversation {conversation_id} could not be resumed.");
                }
            }
        },
    }

    Ok(())
}
