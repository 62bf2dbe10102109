//! Budgeted prompt assembly.
//!
//! A prompt is three parts in order: the persona's system prompt, a
//! chat log rebuilt from recent history, and the response cue. The system
//! prompt and cue are charged against the token budget first; history then
//! fills whatever remains, newest message first, so when the budget runs out
//! it is the oldest context that falls away.

use moot_config::{AppConfig, PromptFormatConfig};
use moot_core::error::BudgetError;
use moot_core::message::ChatMessage;
use moot_core::token::count_tokens;
use tracing::debug;

use crate::persona::{Persona, PromptKind, canonical_stop};

/// An assembled prompt ready for the backend.
#[derive(Debug, Clone)]
pub struct BuiltPrompt {
    pub text: String,

    /// Tokens the text occupies under the local counter.
    pub used_tokens: usize,

    /// True when at least one message was dropped to fit the budget.
    pub truncated: bool,
}

/// Renders prompts for both prompt kinds from one configuration.
pub struct PromptBuilder {
    format: PromptFormatConfig,
    summary: Persona,
    proposal: Persona,
}

impl PromptBuilder {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            format: config.prompt.clone(),
            summary: Persona::new(&config.personas.summary),
            proposal: Persona::new(&config.personas.proposal),
        }
    }

    pub fn persona(&self, kind: PromptKind) -> &Persona {
        match kind {
            PromptKind::Summary => &self.summary,
            PromptKind::Proposal => &self.proposal,
        }
    }

    /// Format one message as a chat-log line:
    /// `prepend + sender + append + text + stop + separator`.
    pub fn chat_line(&self, message: &ChatMessage) -> String {
        format!(
            "{}{}{}{}{}{}",
            self.format.user_prepend,
            message.sender_label(),
            self.format.user_append,
            message.text,
            canonical_stop(&self.format),
            self.format.line_separator
        )
    }

    /// Assemble a prompt from history supplied newest-first.
    ///
    /// Walks the history charging each line against `token_limit` and stops
    /// at the first line that would not fit; everything older is dropped and
    /// reported through [`BuiltPrompt::truncated`]. Included lines are
    /// reversed back into chronological order between the system prompt and
    /// the response cue.
    ///
    /// Fails only when the system prompt and cue alone exceed the limit.
    /// Zero history fitting is not an error: the prompt is still usable.
    pub fn build(
        &self,
        messages_newest_first: &[ChatMessage],
        kind: PromptKind,
        token_limit: usize,
    ) -> Result<BuiltPrompt, BudgetError> {
        let persona = self.persona(kind);
        let system_prompt = persona.system_prompt(&self.format);
        let cue = persona.response_cue(&self.format);

        let mut used_tokens = count_tokens(&system_prompt) + count_tokens(&cue);
        if used_tokens > token_limit {
            return Err(BudgetError::PromptBudgetExceeded {
                required: used_tokens,
                limit: token_limit,
            });
        }

        let mut lines = Vec::with_capacity(messages_newest_first.len());
        let mut truncated = false;
        for message in messages_newest_first {
            let line = self.chat_line(message);
            let additional = count_tokens(&line);
            if used_tokens + additional > token_limit {
                debug!(
                    used_tokens,
                    additional,
                    token_limit,
                    dropped = messages_newest_first.len() - lines.len(),
                    "Prompt budget reached, dropping older history"
                );
                truncated = true;
                break;
            }
            used_tokens += additional;
            lines.push(line);
        }

        lines.reverse();
        let text = format!("{}{}{}", system_prompt, lines.concat(), cue);
        Ok(BuiltPrompt {
            text,
            used_tokens,
            truncated,
        })
    }
}
