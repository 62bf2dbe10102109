//! SQLite store for conversations, messages, authors, and summaries.
//!
//! Four tables:
//! - `conversations` — lifecycle rows, guarded by a partial unique index so
//!   at most one row per chat is `active` at any instant
//! - `messages` — the immutable chat log, keyed (conversation_id, id)
//! - `authors` — sender identities, upserted on every recorded message
//! - `summaries` — point-in-time summary rows with a message-count snapshot
//!
//! State-machine writes are single guarded statements; a lost race surfaces
//! as zero rows affected (or a unique violation) and maps to the no-result
//! signal rather than an error.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use moot_core::conversation::{Conversation, ConversationState, Summary, SummaryId, SummaryState};
use moot_core::error::{Result, StateError, StorageError};
use moot_core::message::{Author, ChatId, ChatMessage, ConversationId, MessageId};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

/// The production SQLite store.
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (or create) the database at `path`.
    ///
    /// All tables and indexes are created automatically. Pass
    /// `"sqlite::memory:"` for an in-process ephemeral database (useful for
    /// tests).
    pub async fn new(path: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| StorageError::Database(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .pragma("foreign_keys", "ON");

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Database(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite store initialized at {path}");
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS authors (
                id         INTEGER PRIMARY KEY,
                username   TEXT,
                first_name TEXT,
                last_name  TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::MigrationFailed(format!("authors table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS conversations (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                chat_id    INTEGER NOT NULL,
                agenda     TEXT NOT NULL,
                state      TEXT NOT NULL,
                content_id TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::MigrationFailed(format!("conversations table: {e}")))?;

        // The single-active-per-chat invariant, enforced at the schema level
        sqlx::query(
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_conversations_one_active
                ON conversations(chat_id) WHERE state = 'active'
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::MigrationFailed(format!("active index: {e}")))?;

        // reply_to_id carries no foreign key: replies may reference messages
        // recorded outside the conversation window, and those resolve to no
        // parent at read time
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                id              INTEGER NOT NULL,
                conversation_id INTEGER NOT NULL REFERENCES conversations(id),
                author_id       INTEGER NOT NULL REFERENCES authors(id),
                reply_to_id     INTEGER,
                text            TEXT NOT NULL,
                sent_at         TEXT NOT NULL,
                PRIMARY KEY (conversation_id, id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::MigrationFailed(format!("messages table: {e}")))?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_messages_recency
                ON messages(conversation_id, sent_at DESC)
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::MigrationFailed(format!("recency index: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS summaries (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                conversation_id INTEGER NOT NULL REFERENCES conversations(id),
                message_count   INTEGER NOT NULL,
                state           TEXT NOT NULL,
                text            TEXT,
                created_at      TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::MigrationFailed(format!("summaries table: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    // ── Conversation state machine ──

    /// Start a new `active` conversation for `chat_id`.
    ///
    /// Returns `None` without side effects when the chat already holds an
    /// active conversation, including when a concurrent create wins the race.
    pub async fn create(&self, chat_id: ChatId, agenda: &str) -> Result<Option<Conversation>> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            r#"
            INSERT INTO conversations (chat_id, agenda, state, created_at, updated_at)
            SELECT ?1, ?2, 'active', ?3, ?3
            WHERE NOT EXISTS (
                SELECT 1 FROM conversations WHERE chat_id = ?1 AND state = 'active'
            )
            "#,
        )
        .bind(chat_id.0)
        .bind(agenda)
        .bind(&now)
        .execute(&self.pool)
        .await;

        let result = match result {
            Ok(result) => result,
            Err(e) if is_unique_violation(&e) => {
                debug!(chat = %chat_id, "Concurrent create lost the active-slot race");
                return Ok(None);
            }
            Err(e) => {
                return Err(StorageError::Database(format!("INSERT conversation: {e}")).into());
            }
        };

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        let conversation = self.get(ConversationId(result.last_insert_rowid())).await?;
        info!(chat = %chat_id, conversation = %conversation.id, "Started conversation");
        Ok(Some(conversation))
    }

    /// Reactivate an `inactive` conversation, under the same
    /// single-active-per-chat guard as [`create`](Self::create).
    ///
    /// Returns `None` when the conversation does not exist, is not
    /// `inactive`, or its chat already holds an active conversation.
    pub async fn enter(&self, conversation_id: ConversationId) -> Result<Option<Conversation>> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            r#"
            UPDATE conversations
            SET state = 'active', updated_at = ?2
            WHERE id = ?1
              AND state = 'inactive'
              AND NOT EXISTS (
                  SELECT 1 FROM conversations c
                  WHERE c.chat_id = conversations.chat_id AND c.state = 'active'
              )
            "#,
        )
        .bind(conversation_id.0)
        .bind(&now)
        .execute(&self.pool)
        .await;

        let result = match result {
            Ok(result) => result,
            Err(e) if is_unique_violation(&e) => {
                debug!(conversation = %conversation_id, "Concurrent enter lost the active-slot race");
                return Ok(None);
            }
            Err(e) => {
                return Err(StorageError::Database(format!("UPDATE conversation: {e}")).into());
            }
        };

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        let conversation = self.get(conversation_id).await?;
        info!(conversation = %conversation_id, "Re-entered conversation");
        Ok(Some(conversation))
    }

    /// Move the chat's current active conversation to `target`.
    ///
    /// `active` is rejected as a target; use [`enter`](Self::enter). Returns
    /// `None` when the chat has no active conversation.
    pub async fn update_state(
        &self,
        chat_id: ChatId,
        target: ConversationState,
    ) -> Result<Option<Conversation>> {
        if target == ConversationState::Active {
            return Err(StateError::InvalidTarget(target.to_string()).into());
        }

        let Some(active) = self.active(chat_id).await? else {
            return Ok(None);
        };

        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "UPDATE conversations SET state = ?2, updated_at = ?3 WHERE id = ?1 AND state = 'active'",
        )
        .bind(active.id.0)
        .bind(target.as_str())
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Database(format!("UPDATE conversation state: {e}")))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        let conversation = self.get(active.id).await?;
        info!(
            chat = %chat_id,
            conversation = %conversation.id,
            state = %target,
            "Conversation state updated"
        );
        Ok(Some(conversation))
    }

    /// Record the published content id for a `complete` conversation.
    ///
    /// Publish-once: a second call with the same id is a no-op returning the
    /// unchanged row; a differing id never overwrites the first.
    pub async fn set_content_id(
        &self,
        conversation_id: ConversationId,
        content_id: &str,
    ) -> Result<Conversation> {
        let conversation = self.get(conversation_id).await?;
        if conversation.state != ConversationState::Complete {
            return Err(StateError::Conflict {
                conversation_id: conversation_id.0,
                reason: format!("cannot publish a {} conversation", conversation.state),
            }
            .into());
        }
        if let Some(existing) = &conversation.content_id {
            if existing == content_id {
                return Ok(conversation);
            }
            return Err(StateError::Conflict {
                conversation_id: conversation_id.0,
                reason: "a published content id is already set".into(),
            }
            .into());
        }

        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            r#"
            UPDATE conversations
            SET content_id = ?2, updated_at = ?3
            WHERE id = ?1 AND state = 'complete' AND content_id IS NULL
            "#,
        )
        .bind(conversation_id.0)
        .bind(content_id)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Database(format!("UPDATE content id: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(StateError::Conflict {
                conversation_id: conversation_id.0,
                reason: "a published content id is already set".into(),
            }
            .into());
        }

        let conversation = self.get(conversation_id).await?;
        info!(conversation = %conversation_id, content = content_id, "Recorded published content id");
        Ok(conversation)
    }

    // ── Conversation queries ──

    /// The chat's current active conversation, if any.
    pub async fn active(&self, chat_id: ChatId) -> Result<Option<Conversation>> {
        let row = sqlx::query(
            "SELECT * FROM conversations WHERE chat_id = ?1 AND state = 'active'",
        )
        .bind(chat_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Database(format!("SELECT active conversation: {e}")))?;

        match row {
            Some(ref row) => Ok(Some(Self::row_to_conversation(row)?)),
            None => Ok(None),
        }
    }

    /// All conversations for a chat, newest first.
    pub async fn list(&self, chat_id: ChatId) -> Result<Vec<Conversation>> {
        let rows = sqlx::query("SELECT * FROM conversations WHERE chat_id = ?1 ORDER BY id DESC")
            .bind(chat_id.0)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Database(format!("SELECT conversations: {e}")))?;

        rows.iter().map(Self::row_to_conversation).collect()
    }

    /// One conversation by id.
    pub async fn get(&self, conversation_id: ConversationId) -> Result<Conversation> {
        let row = sqlx::query("SELECT * FROM conversations WHERE id = ?1")
            .bind(conversation_id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Database(format!("SELECT conversation: {e}")))?;

        match row {
            Some(ref row) => Self::row_to_conversation(row),
            None => Err(StateError::ConversationNotFound(conversation_id.0).into()),
        }
    }

    // ── Message log ──

    /// Append an immutable message to a conversation, upserting its author.
    ///
    /// A duplicate (id, conversation) pair is rejected.
    pub async fn record_message(
        &self,
        conversation_id: ConversationId,
        message: &ChatMessage,
    ) -> Result<()> {
        self.upsert_author(&message.author).await?;

        let reply_to_id = message.reply_to.as_deref().map(|parent| parent.id.0);
        let result = sqlx::query(
            r#"
            INSERT INTO messages (id, conversation_id, author_id, reply_to_id, text, sent_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(message.id.0)
        .bind(conversation_id.0)
        .bind(message.author.id)
        .bind(reply_to_id)
        .bind(&message.text)
        .bind(message.timestamp.to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                debug!(conversation = %conversation_id, message = %message.id, "Recorded message");
                Ok(())
            }
            Err(e) if is_unique_violation(&e) => Err(StorageError::Duplicate(format!(
                "message {} already recorded for conversation {conversation_id}",
                message.id
            ))
            .into()),
            Err(e) if is_foreign_key_violation(&e) => {
                Err(StateError::ConversationNotFound(conversation_id.0).into())
            }
            Err(e) => Err(StorageError::Database(format!("INSERT message: {e}")).into()),
        }
    }

    /// The most recent `limit` messages of a conversation,
    /// recency-descending, with authors and one-level reply parents
    /// resolved.
    pub async fn recent_messages(
        &self,
        conversation_id: ConversationId,
        limit: i64,
    ) -> Result<Vec<ChatMessage>> {
        let rows = sqlx::query(
            r#"
            SELECT m.id, m.text, m.sent_at,
                   a.id AS author_id, a.username AS author_username,
                   a.first_name AS author_first_name, a.last_name AS author_last_name,
                   p.id AS parent_id, p.text AS parent_text, p.sent_at AS parent_sent_at,
                   pa.id AS parent_author_id, pa.username AS parent_author_username,
                   pa.first_name AS parent_author_first_name,
                   pa.last_name AS parent_author_last_name
            FROM messages m
            JOIN authors a ON a.id = m.author_id
            LEFT JOIN messages p
                ON p.conversation_id = m.conversation_id AND p.id = m.reply_to_id
            LEFT JOIN authors pa ON pa.id = p.author_id
            WHERE m.conversation_id = ?1
            ORDER BY m.sent_at DESC, m.id DESC
            LIMIT ?2
            "#,
        )
        .bind(conversation_id.0)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Database(format!("SELECT messages: {e}")))?;

        rows.iter().map(Self::row_to_message).collect()
    }

    /// Current message total for one conversation.
    pub async fn message_count(&self, conversation_id: ConversationId) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS cnt FROM messages WHERE conversation_id = ?1")
            .bind(conversation_id.0)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StorageError::Database(format!("COUNT messages: {e}")))?;

        let count: i64 = row
            .try_get("cnt")
            .map_err(|e| StorageError::Database(format!("cnt column: {e}")))?;
        Ok(count)
    }

    async fn upsert_author(&self, author: &Author) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO authors (id, username, first_name, last_name)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                username = excluded.username,
                first_name = excluded.first_name,
                last_name = excluded.last_name
            "#,
        )
        .bind(author.id)
        .bind(&author.username)
        .bind(&author.first_name)
        .bind(&author.last_name)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Database(format!("UPSERT author: {e}")))?;
        Ok(())
    }

    // ── Summaries ──

    /// Create a `pending` summary snapshotting the conversation's current
    /// message total.
    pub async fn create_summary(&self, conversation_id: ConversationId) -> Result<Summary> {
        self.get(conversation_id).await?;
        let message_count = self.message_count(conversation_id).await?;

        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            r#"
            INSERT INTO summaries (conversation_id, message_count, state, created_at, updated_at)
            VALUES (?1, ?2, 'pending', ?3, ?3)
            "#,
        )
        .bind(conversation_id.0)
        .bind(message_count)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Database(format!("INSERT summary: {e}")))?;

        let summary = self.get_summary(SummaryId(result.last_insert_rowid())).await?;
        info!(
            conversation = %conversation_id,
            summary = %summary.id,
            message_count,
            "Created pending summary"
        );
        Ok(summary)
    }

    /// Record a summary's text and terminal state in one write.
    ///
    /// Exactly one terminal mark is allowed; `pending` is not a valid
    /// target. Partial text from a failed run is preserved.
    pub async fn mark_summary(
        &self,
        summary_id: SummaryId,
        text: Option<&str>,
        state: SummaryState,
    ) -> Result<Summary> {
        if !state.is_terminal() {
            return Err(StateError::InvalidTarget(state.to_string()).into());
        }

        let summary = self.get_summary(summary_id).await?;
        if summary.state.is_terminal() {
            return Err(StateError::Conflict {
                conversation_id: summary.conversation_id.0,
                reason: format!("summary {summary_id} is already {}", summary.state),
            }
            .into());
        }

        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "UPDATE summaries SET text = ?2, state = ?3, updated_at = ?4 WHERE id = ?1 AND state = 'pending'",
        )
        .bind(summary_id.0)
        .bind(text)
        .bind(state.as_str())
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Database(format!("UPDATE summary: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(StateError::Conflict {
                conversation_id: summary.conversation_id.0,
                reason: format!("summary {summary_id} was marked concurrently"),
            }
            .into());
        }

        let summary = self.get_summary(summary_id).await?;
        info!(summary = %summary_id, state = %state, "Summary marked");
        Ok(summary)
    }

    /// One summary by id.
    pub async fn get_summary(&self, summary_id: SummaryId) -> Result<Summary> {
        let row = sqlx::query("SELECT * FROM summaries WHERE id = ?1")
            .bind(summary_id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Database(format!("SELECT summary: {e}")))?;

        match row {
            Some(ref row) => Self::row_to_summary(row),
            None => Err(StateError::SummaryNotFound(summary_id.0).into()),
        }
    }

    // ── Row mapping ──

    fn row_to_conversation(row: &sqlx::sqlite::SqliteRow) -> Result<Conversation> {
        let id: i64 = row
            .try_get("id")
            .map_err(|e| StorageError::Database(format!("id column: {e}")))?;
        let chat_id: i64 = row
            .try_get("chat_id")
            .map_err(|e| StorageError::Database(format!("chat_id column: {e}")))?;
        let agenda: String = row
            .try_get("agenda")
            .map_err(|e| StorageError::Database(format!("agenda column: {e}")))?;
        let state: String = row
            .try_get("state")
            .map_err(|e| StorageError::Database(format!("state column: {e}")))?;
        let state = state
            .parse::<ConversationState>()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        let content_id: Option<String> = row
            .try_get("content_id")
            .map_err(|e| StorageError::Database(format!("content_id column: {e}")))?;
        let created_at: String = row
            .try_get("created_at")
            .map_err(|e| StorageError::Database(format!("created_at column: {e}")))?;
        let updated_at: String = row
            .try_get("updated_at")
            .map_err(|e| StorageError::Database(format!("updated_at column: {e}")))?;

        Ok(Conversation {
            id: ConversationId(id),
            chat_id: ChatId(chat_id),
            agenda,
            state,
            content_id,
            created_at: parse_timestamp(&created_at),
            updated_at: parse_timestamp(&updated_at),
        })
    }

    fn row_to_summary(row: &sqlx::sqlite::SqliteRow) -> Result<Summary> {
        let id: i64 = row
            .try_get("id")
            .map_err(|e| StorageError::Database(format!("id column: {e}")))?;
        let conversation_id: i64 = row
            .try_get("conversation_id")
            .map_err(|e| StorageError::Database(format!("conversation_id column: {e}")))?;
        let message_count: i64 = row
            .try_get("message_count")
            .map_err(|e| StorageError::Database(format!("message_count column: {e}")))?;
        let state: String = row
            .try_get("state")
            .map_err(|e| StorageError::Database(format!("state column: {e}")))?;
        let state = state
            .parse::<SummaryState>()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        let text: Option<String> = row
            .try_get("text")
            .map_err(|e| StorageError::Database(format!("text column: {e}")))?;
        let created_at: String = row
            .try_get("created_at")
            .map_err(|e| StorageError::Database(format!("created_at column: {e}")))?;
        let updated_at: String = row
            .try_get("updated_at")
            .map_err(|e| StorageError::Database(format!("updated_at column: {e}")))?;

        Ok(Summary {
            id: SummaryId(id),
            conversation_id: ConversationId(conversation_id),
            message_count,
            state,
            text,
            created_at: parse_timestamp(&created_at),
            updated_at: parse_timestamp(&updated_at),
        })
    }

    fn row_to_message(row: &sqlx::sqlite::SqliteRow) -> Result<ChatMessage> {
        let id: i64 = row
            .try_get("id")
            .map_err(|e| StorageError::Database(format!("id column: {e}")))?;
        let text: String = row
            .try_get("text")
            .map_err(|e| StorageError::Database(format!("text column: {e}")))?;
        let sent_at: String = row
            .try_get("sent_at")
            .map_err(|e| StorageError::Database(format!("sent_at column: {e}")))?;
        let author = Self::row_to_author(row, "author")?;

        let mut message =
            ChatMessage::new(MessageId(id), author, text, parse_timestamp(&sent_at));

        let parent_id: Option<i64> = row
            .try_get("parent_id")
            .map_err(|e| StorageError::Database(format!("parent_id column: {e}")))?;
        if let Some(parent_id) = parent_id {
            let parent_text: String = row
                .try_get("parent_text")
                .map_err(|e| StorageError::Database(format!("parent_text column: {e}")))?;
            let parent_sent_at: String = row
                .try_get("parent_sent_at")
                .map_err(|e| StorageError::Database(format!("parent_sent_at column: {e}")))?;
            let parent_author = Self::row_to_author(row, "parent_author")?;
            message = message.with_reply_to(ChatMessage::new(
                MessageId(parent_id),
                parent_author,
                parent_text,
                parse_timestamp(&parent_sent_at),
            ));
        }

        Ok(message)
    }

    fn row_to_author(row: &sqlx::sqlite::SqliteRow, prefix: &str) -> Result<Author> {
        let id: i64 = row
            .try_get(format!("{prefix}_id").as_str())
            .map_err(|e| StorageError::Database(format!("{prefix}_id column: {e}")))?;
        let username: Option<String> = row
            .try_get(format!("{prefix}_username").as_str())
            .map_err(|e| StorageError::Database(format!("{prefix}_username column: {e}")))?;
        let first_name: Option<String> = row
            .try_get(format!("{prefix}_first_name").as_str())
            .map_err(|e| StorageError::Database(format!("{prefix}_first_name column: {e}")))?;
        let last_name: Option<String> = row
            .try_get(format!("{prefix}_last_name").as_str())
            .map_err(|e| StorageError::Database(format!("{prefix}_last_name column: {e}")))?;

        Ok(Author {
            id,
            username,
            first_name,
            last_name,
        })
    }
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db) => db.is_unique_violation(),
        _ => false,
    }
}

fn is_foreign_key_violation(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db) => db.is_foreign_key_violation(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moot_core::error::Error;

    async fn test_store() -> Store {
        Store::new("sqlite::memory:").await.unwrap()
    }

    fn message(id: i64, author: Author, text: &str, at: DateTime<Utc>) -> ChatMessage {
        ChatMessage::new(MessageId(id), author, text, at)
    }

    fn alice() -> Author {
        Author::new(1).with_username("alice")
    }

    fn bob() -> Author {
        Author::new(2).with_username("bob")
    }

    fn t(seconds: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + seconds, 0).unwrap()
    }

    #[tokio::test]
    async fn create_and_get() {
        let store = test_store().await;
        let conversation = store
            .create(ChatId(10), "quarterly budget")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(conversation.state, ConversationState::Active);
        assert_eq!(conversation.agenda, "quarterly budget");
        assert_eq!(conversation.chat_id, ChatId(10));
        assert!(conversation.content_id.is_none());

        let fetched = store.get(conversation.id).await.unwrap();
        assert_eq!(fetched.agenda, "quarterly budget");
    }

    #[tokio::test]
    async fn second_create_returns_none_while_active() {
        let store = test_store().await;
        store.create(ChatId(10), "first").await.unwrap().unwrap();

        let second = store.create(ChatId(10), "second").await.unwrap();
        assert!(second.is_none());
        assert_eq!(store.list(ChatId(10)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn chats_are_independent() {
        let store = test_store().await;
        store.create(ChatId(10), "a").await.unwrap().unwrap();
        let other = store.create(ChatId(11), "b").await.unwrap();
        assert!(other.is_some());
    }

    #[tokio::test]
    async fn create_after_exit_succeeds() {
        let store = test_store().await;
        store.create(ChatId(10), "first").await.unwrap().unwrap();
        store
            .update_state(ChatId(10), ConversationState::Inactive)
            .await
            .unwrap()
            .unwrap();

        let second = store.create(ChatId(10), "second").await.unwrap();
        assert!(second.is_some());
        assert_eq!(store.list(ChatId(10)).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn enter_reactivates_inactive() {
        let store = test_store().await;
        let conversation = store.create(ChatId(10), "topic").await.unwrap().unwrap();
        store
            .update_state(ChatId(10), ConversationState::Inactive)
            .await
            .unwrap()
            .unwrap();

        let entered = store.enter(conversation.id).await.unwrap().unwrap();
        assert_eq!(entered.state, ConversationState::Active);
        assert_eq!(
            store.active(ChatId(10)).await.unwrap().unwrap().id,
            conversation.id
        );
    }

    #[tokio::test]
    async fn enter_guarded_by_single_active() {
        let store = test_store().await;
        let first = store.create(ChatId(10), "first").await.unwrap().unwrap();
        store
            .update_state(ChatId(10), ConversationState::Inactive)
            .await
            .unwrap()
            .unwrap();
        store.create(ChatId(10), "second").await.unwrap().unwrap();

        assert!(store.enter(first.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn enter_missing_is_none() {
        let store = test_store().await;
        assert!(store.enter(ConversationId(999)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn enter_terminal_is_none() {
        let store = test_store().await;
        let conversation = store.create(ChatId(10), "topic").await.unwrap().unwrap();
        store
            .update_state(ChatId(10), ConversationState::Complete)
            .await
            .unwrap()
            .unwrap();

        assert!(store.enter(conversation.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_state_rejects_active_target() {
        let store = test_store().await;
        store.create(ChatId(10), "topic").await.unwrap().unwrap();

        let err = store
            .update_state(ChatId(10), ConversationState::Active)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::State(StateError::InvalidTarget(_))
        ));
    }

    #[tokio::test]
    async fn update_state_without_active_is_none() {
        let store = test_store().await;
        let result = store
            .update_state(ChatId(10), ConversationState::Complete)
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn update_state_completes() {
        let store = test_store().await;
        store.create(ChatId(10), "topic").await.unwrap().unwrap();

        let completed = store
            .update_state(ChatId(10), ConversationState::Complete)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(completed.state, ConversationState::Complete);
        assert!(store.active(ChatId(10)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let store = test_store().await;
        let err = store.get(ConversationId(42)).await.unwrap_err();
        assert!(matches!(
            err,
            Error::State(StateError::ConversationNotFound(42))
        ));
    }

    #[tokio::test]
    async fn list_newest_first() {
        let store = test_store().await;
        for agenda in ["first", "second", "third"] {
            store.create(ChatId(10), agenda).await.unwrap().unwrap();
            store
                .update_state(ChatId(10), ConversationState::Cancelled)
                .await
                .unwrap()
                .unwrap();
        }

        let listed = store.list(ChatId(10)).await.unwrap();
        let agendas: Vec<&str> = listed.iter().map(|c| c.agenda.as_str()).collect();
        assert_eq!(agendas, vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn record_and_fetch_messages() {
        let store = test_store().await;
        let conversation = store.create(ChatId(10), "topic").await.unwrap().unwrap();

        store
            .record_message(conversation.id, &message(1, alice(), "hello", t(0)))
            .await
            .unwrap();
        store
            .record_message(conversation.id, &message(2, bob(), "hi there", t(10)))
            .await
            .unwrap();
        store
            .record_message(conversation.id, &message(3, alice(), "shall we start?", t(20)))
            .await
            .unwrap();

        let messages = store.recent_messages(conversation.id, 10).await.unwrap();
        assert_eq!(messages.len(), 3);
        // Recency-descending
        assert_eq!(messages[0].text, "shall we start?");
        assert_eq!(messages[2].text, "hello");
        assert_eq!(messages[0].author.display_name(), "alice");
        assert_eq!(messages[1].author.display_name(), "bob");
    }

    #[tokio::test]
    async fn duplicate_message_rejected() {
        let store = test_store().await;
        let conversation = store.create(ChatId(10), "topic").await.unwrap().unwrap();
        let msg = message(1, alice(), "hello", t(0));

        store.record_message(conversation.id, &msg).await.unwrap();
        let err = store.record_message(conversation.id, &msg).await.unwrap_err();
        assert!(matches!(err, Error::Storage(StorageError::Duplicate(_))));
    }

    #[tokio::test]
    async fn same_message_id_across_conversations_is_fine() {
        let store = test_store().await;
        let first = store.create(ChatId(10), "a").await.unwrap().unwrap();
        let second = store.create(ChatId(11), "b").await.unwrap().unwrap();

        store
            .record_message(first.id, &message(1, alice(), "in first", t(0)))
            .await
            .unwrap();
        store
            .record_message(second.id, &message(1, bob(), "in second", t(0)))
            .await
            .unwrap();

        assert_eq!(store.message_count(first.id).await.unwrap(), 1);
        assert_eq!(store.message_count(second.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn record_against_missing_conversation_is_not_found() {
        let store = test_store().await;
        let err = store
            .record_message(ConversationId(404), &message(1, alice(), "lost", t(0)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::State(StateError::ConversationNotFound(404))
        ));
    }

    #[tokio::test]
    async fn reply_resolved_one_level_only() {
        let store = test_store().await;
        let conversation = store.create(ChatId(10), "topic").await.unwrap().unwrap();

        let m1 = message(1, alice(), "original", t(0));
        let m2 = message(2, bob(), "first reply", t(10)).with_reply_to(m1.clone());
        let m3 = message(3, alice(), "second reply", t(20)).with_reply_to(m2.clone());

        store.record_message(conversation.id, &m1).await.unwrap();
        store.record_message(conversation.id, &m2).await.unwrap();
        store.record_message(conversation.id, &m3).await.unwrap();

        let messages = store.recent_messages(conversation.id, 10).await.unwrap();
        let newest = &messages[0];
        assert_eq!(newest.sender_label(), "alice (in reply to bob)");

        let parent = newest.reply_to.as_deref().unwrap();
        assert_eq!(parent.text, "first reply");
        // The chain is cut after one level
        assert!(parent.reply_to.is_none());
    }

    #[tokio::test]
    async fn dangling_reply_resolves_to_no_parent() {
        let store = test_store().await;
        let conversation = store.create(ChatId(10), "topic").await.unwrap().unwrap();

        // Reply to a message that was never recorded in this conversation
        let ghost = message(99, bob(), "before the conversation", t(0));
        let reply = message(1, alice(), "late reply", t(10)).with_reply_to(ghost);
        store.record_message(conversation.id, &reply).await.unwrap();

        let messages = store.recent_messages(conversation.id, 10).await.unwrap();
        assert!(messages[0].reply_to.is_none());
        assert_eq!(messages[0].sender_label(), "alice");
    }

    #[tokio::test]
    async fn recent_messages_respects_limit() {
        let store = test_store().await;
        let conversation = store.create(ChatId(10), "topic").await.unwrap().unwrap();
        for i in 0..5 {
            store
                .record_message(
                    conversation.id,
                    &message(i, alice(), &format!("message {i}"), t(i)),
                )
                .await
                .unwrap();
        }

        let messages = store.recent_messages(conversation.id, 2).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].text, "message 4");
        assert_eq!(messages[1].text, "message 3");
    }

    #[tokio::test]
    async fn author_upsert_refreshes_names() {
        let store = test_store().await;
        let conversation = store.create(ChatId(10), "topic").await.unwrap().unwrap();

        store
            .record_message(
                conversation.id,
                &message(1, Author::new(5).with_username("old_handle"), "one", t(0)),
            )
            .await
            .unwrap();
        store
            .record_message(
                conversation.id,
                &message(2, Author::new(5).with_username("new_handle"), "two", t(10)),
            )
            .await
            .unwrap();

        let messages = store.recent_messages(conversation.id, 10).await.unwrap();
        // Labels are resolved at read time against the single author row
        assert!(messages
            .iter()
            .all(|m| m.author.display_name() == "new_handle"));
    }

    #[tokio::test]
    async fn create_summary_snapshots_count() {
        let store = test_store().await;
        let conversation = store.create(ChatId(10), "topic").await.unwrap().unwrap();
        for i in 0..3 {
            store
                .record_message(conversation.id, &message(i, alice(), "text", t(i)))
                .await
                .unwrap();
        }

        let summary = store.create_summary(conversation.id).await.unwrap();
        assert_eq!(summary.state, SummaryState::Pending);
        assert_eq!(summary.message_count, 3);
        assert!(summary.text.is_none());
    }

    #[tokio::test]
    async fn summary_count_scoped_to_its_conversation() {
        let store = test_store().await;
        let first = store.create(ChatId(10), "a").await.unwrap().unwrap();
        let second = store.create(ChatId(11), "b").await.unwrap().unwrap();

        for i in 0..4 {
            store
                .record_message(first.id, &message(i, alice(), "noise", t(i)))
                .await
                .unwrap();
        }
        store
            .record_message(second.id, &message(1, bob(), "only one", t(0)))
            .await
            .unwrap();

        let summary = store.create_summary(second.id).await.unwrap();
        assert_eq!(summary.message_count, 1);
    }

    #[tokio::test]
    async fn mark_summary_complete() {
        let store = test_store().await;
        let conversation = store.create(ChatId(10), "topic").await.unwrap().unwrap();
        let summary = store.create_summary(conversation.id).await.unwrap();

        let marked = store
            .mark_summary(summary.id, Some("the gist"), SummaryState::Complete)
            .await
            .unwrap();
        assert_eq!(marked.state, SummaryState::Complete);
        assert_eq!(marked.text.as_deref(), Some("the gist"));
    }

    #[tokio::test]
    async fn mark_summary_failed_keeps_partial_text() {
        let store = test_store().await;
        let conversation = store.create(ChatId(10), "topic").await.unwrap().unwrap();
        let summary = store.create_summary(conversation.id).await.unwrap();

        let marked = store
            .mark_summary(summary.id, Some("partial text"), SummaryState::Failed)
            .await
            .unwrap();
        assert_eq!(marked.state, SummaryState::Failed);
        assert_eq!(marked.text.as_deref(), Some("partial text"));
    }

    #[tokio::test]
    async fn mark_summary_twice_conflicts() {
        let store = test_store().await;
        let conversation = store.create(ChatId(10), "topic").await.unwrap().unwrap();
        let summary = store.create_summary(conversation.id).await.unwrap();

        store
            .mark_summary(summary.id, Some("done"), SummaryState::Complete)
            .await
            .unwrap();
        let err = store
            .mark_summary(summary.id, Some("again"), SummaryState::Failed)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::State(StateError::Conflict { .. })));

        // The first mark is untouched
        let fetched = store.get_summary(summary.id).await.unwrap();
        assert_eq!(fetched.text.as_deref(), Some("done"));
        assert_eq!(fetched.state, SummaryState::Complete);
    }

    #[tokio::test]
    async fn mark_summary_rejects_pending_target() {
        let store = test_store().await;
        let conversation = store.create(ChatId(10), "topic").await.unwrap().unwrap();
        let summary = store.create_summary(conversation.id).await.unwrap();

        let err = store
            .mark_summary(summary.id, None, SummaryState::Pending)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::State(StateError::InvalidTarget(_))
        ));
    }

    #[tokio::test]
    async fn summary_not_found() {
        let store = test_store().await;
        let err = store.get_summary(SummaryId(7)).await.unwrap_err();
        assert!(matches!(err, Error::State(StateError::SummaryNotFound(7))));
    }

    #[tokio::test]
    async fn set_content_id_requires_complete() {
        let store = test_store().await;
        let conversation = store.create(ChatId(10), "topic").await.unwrap().unwrap();

        let err = store
            .set_content_id(conversation.id, "Qm123")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::State(StateError::Conflict { .. })));

        store
            .update_state(ChatId(10), ConversationState::Complete)
            .await
            .unwrap()
            .unwrap();
        let published = store.set_content_id(conversation.id, "Qm123").await.unwrap();
        assert_eq!(published.content_id.as_deref(), Some("Qm123"));
    }

    #[tokio::test]
    async fn set_content_id_is_publish_once() {
        let store = test_store().await;
        let conversation = store.create(ChatId(10), "topic").await.unwrap().unwrap();
        store
            .update_state(ChatId(10), ConversationState::Complete)
            .await
            .unwrap()
            .unwrap();
        store.set_content_id(conversation.id, "Qm123").await.unwrap();

        // Same id: idempotent no-op
        let unchanged = store.set_content_id(conversation.id, "Qm123").await.unwrap();
        assert_eq!(unchanged.content_id.as_deref(), Some("Qm123"));

        // Different id: never overwrites
        let err = store
            .set_content_id(conversation.id, "Qm456")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::State(StateError::Conflict { .. })));
        let fetched = store.get(conversation.id).await.unwrap();
        assert_eq!(fetched.content_id.as_deref(), Some("Qm123"));
    }

    #[tokio::test]
    async fn concurrent_create_admits_exactly_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("moot.db");
        let store = Store::new(path.to_str().unwrap()).await.unwrap();

        let (a, b) = tokio::join!(
            store.create(ChatId(10), "racer a"),
            store.create(ChatId(10), "racer b"),
        );
        let winners = [a.unwrap(), b.unwrap()]
            .iter()
            .filter(|r| r.is_some())
            .count();
        assert_eq!(winners, 1);
        assert_eq!(store.list(ChatId(10)).await.unwrap().len(), 1);
    }
}
