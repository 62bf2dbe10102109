//! `moot propose` — Draft a proposal from a published transcript.
//!
//! Fetches the transcript back from the content store, replays it as
//! history with the agenda up front and the caller's intent as the final
//! word, then publishes the drafted proposal alongside the transcript.

use std::io::Write;

use anyhow::Context;
use chrono::Utc;
use moot_agent::PromptKind;
use moot_content::{ContentStore, HttpStore};
use moot_core::message::{Author, ChatMessage, ConversationId, MessageId};
use moot_core::transcript::{Transcript, TranscriptAuthor};

use super::context;

pub async fn run(content_id: String, intent: Vec<String>) -> anyhow::Result<()> {
    let config = context::load_config()?;
    let content = HttpStore::new(&config.content);

    let bytes = content
        .get(&content_id)
        .await
        .with_context(|| format!("Failed to fetch transcript {content_id}"))?;
    let transcript: Transcript = serde_json::from_slice(&bytes)
        .with_context(|| format!("Content {content_id} is not a transcript"))?;

    let mut history = replay(&transcript, &intent.join(" "));
    history.reverse();

    let responder = context::build_responder(&config);
    let mut stream = responder.respond(&history, PromptKind::Proposal, ConversationId(0))?;

    print!("  {} > ", config.personas.proposal.name);
    std::io::stdout().flush()?;
    let mut text = String::new();
    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(chunk) => {
                print!("{}", chunk.text);
                std::io::stdout().flush()?;
                text.push_str(&chunk.text);
            }
            Err(e) => {
                println!();
                return Err(e.into());
            }
        }
    }
    println!();

    let proposal_id = content.add(text.into_bytes()).await?;
    println!("✅ Proposal published");
    println!("  Content id: {proposal_id}");

    Ok(())
}

/// Rebuild the transcript as chronological history, bracketed by an agenda
/// line and the caller's intent.
fn replay(transcript: &Transcript, intent: &str) -> Vec<ChatMessage> {
    let now = Utc::now();
    let mut history = Vec::with_capacity(transcript.messages.len() + 2);
    history.push(ChatMessage::new(
        MessageId(1),
        Author::new(0).with_username("agenda"),
        &transcript.agenda,
        now,
    ));
    for recorded in &transcript.messages {
        let id = MessageId(history.len() as i64 + 1);
        let mut message = ChatMessage::new(id, author_of(&recorded.author), &recorded.text, now);
        if let Some(parent) = &recorded.reply_to {
            // Only the parent's author survives publishing; a stub carries it.
            message = message.with_reply_to(ChatMessage::new(
                MessageId(0),
                author_of(parent),
                "",
                now,
            ));
        }
        history.push(message);
    }
    history.push(ChatMessage::new(
        MessageId(history.len() as i64 + 1),
        Author::new(0).with_username("intent"),
        intent,
        now,
    ));
    history
}

fn author_of(author: &TranscriptAuthor) -> Author {
    Author {
        id: 0,
        username: author.username.clone(),
        first_name: author.first_name.clone(),
        last_name: author.last_name.clone(),
    }
}
