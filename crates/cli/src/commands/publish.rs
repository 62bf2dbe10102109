//! `moot publish` — Push a completed conversation's transcript to the content store.

use moot_agent::Publisher;
use moot_content::HttpStore;
use moot_core::message::ConversationId;

use super::context;

pub async fn run(conversation_id: i64) -> anyhow::Result<()> {
    let config = context::load_config()?;
    let store = context::open_store(&config).await?;
    let content = HttpStore::new(&config.content);

    let publisher = Publisher::new(&store, &content);
    let content_id = publisher.publish(ConversationId(conversation_id)).await?;

    let gateway = config.content.gateway_url.trim_end_matches('/');
    println!("✅ Published conversation {conversation_id}");
    println!("  Content id: {content_id}");
    println!("  Fetch it at {gateway}/ipfs/{content_id}");

    Ok(())
}
