//! `moot summary` — Summarize the active conversation so far.

use std::io::Write;

use moot_agent::SummaryJob;
use moot_core::message::ChatId;

use super::context;

pub async fn run(chat: i64) -> anyhow::Result<()> {
    let config = context::load_config()?;
    let store = context::open_store(&config).await?;

    let Some(conversation) = store.active(ChatId(chat)).await? else {
        println!("  No active conversation to summarize.");
        return Ok(());
    };

    let responder = context::build_responder(&config);
    let job = SummaryJob::new(&store, &responder);

    print!("  {} > ", config.personas.summary.name);
    std::io::stdout().flush()?;
    let outcome = job
        .summarize(conversation.id, |chunk| {
            print!("{chunk}");
            let _ = std::io::stdout().flush();
        })
        .await?;
    println!();

    if let Some(error) = outcome.error {
        println!("⚠️  Summary interrupted; the partial text above was kept.");
        return Err(error.into());
    }

    println!("✅ Summary {} recorded", outcome.summary.id);
    Ok(())
}
