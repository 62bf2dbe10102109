//! `moot new` — Open a conversation.

use moot_core::message::ChatId;

use super::context;

pub async fn run(chat: i64, agenda: Vec<String>) -> anyhow::Result<()> {
    let agenda = agenda.join(" ");
    let config = context::load_config()?;
    let store = context::open_store(&config).await?;

    match store.create(ChatId(chat), &agenda).await? {
        Some(conversation) => {
            println!("  Opened conversation {}", conversation.id);
            println!("  Agenda: {}", conversation.agenda);
            println!("  Close it with `moot end`, or set it aside with `moot exit`.");
        }
        None => {
            println!("  This chat already has an active conversation.");
            println!("  End or exit it before opening a new one.");
        }
    }

    Ok(())
}
