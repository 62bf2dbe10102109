//! Persona templates and system-prompt rendering.
//!
//! A persona is a role/objective template pair with a speaking name. The
//! templates accept `{name}` and `{date}` placeholders; rendered text is
//! flattened to a single line so it never breaks the chat-log framing.

use chrono::Local;
use moot_config::{PersonaConfig, PromptFormatConfig};

/// Date-time format injected into `{date}`, e.g.
/// `"Monday, January 1, 2024 @ 12:00:00"`.
const DATE_FORMAT: &str = "%A, %B %d, %Y @ %H:%M:%S";

/// Which persona speaks in an assembled prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// Condense a finished discussion.
    Summary,
    /// Participate in an ongoing discussion.
    Proposal,
}

/// A named persona rendered into prompts.
#[derive(Debug, Clone)]
pub struct Persona {
    pub name: String,
    role: String,
    objective: String,
}

impl Persona {
    pub fn new(config: &PersonaConfig) -> Self {
        Self {
            name: config.name.clone(),
            role: config.role.clone(),
            objective: config.objective.clone(),
        }
    }

    /// Render the system-prompt block with the current local date-time.
    pub fn system_prompt(&self, format: &PromptFormatConfig) -> String {
        let date = Local::now().format(DATE_FORMAT).to_string();
        self.system_prompt_at(format, &date)
    }

    /// Render the system-prompt block with an explicit date string.
    ///
    /// Layout: `prepend + "system" + append + body + stop + separator`,
    /// then the transcript opener (when configured) followed by another
    /// separator. The body is role and objective, substituted and flattened,
    /// joined by a single space.
    pub fn system_prompt_at(&self, format: &PromptFormatConfig, date: &str) -> String {
        let body = format!(
            "{} {}",
            self.substitute(&self.role, date),
            self.substitute(&self.objective, date)
        );
        let mut prompt = format!(
            "{}system{}{}{}{}",
            format.user_prepend,
            format.user_append,
            body,
            canonical_stop(format),
            format.line_separator
        );
        if !format.log_start.is_empty() {
            prompt.push_str(&format.log_start);
            prompt.push_str(&format.line_separator);
        }
        prompt
    }

    /// The trailing block that primes this persona to speak next.
    ///
    /// No stop sequence follows: the backend completes from here.
    pub fn response_cue(&self, format: &PromptFormatConfig) -> String {
        format!("{}{}{}", format.user_prepend, self.name, format.user_append)
    }

    fn substitute(&self, template: &str, date: &str) -> String {
        template
            .replace("{name}", &self.name)
            .replace("{date}", date)
            .replace('\n', " ")
    }
}

/// The first configured stop sequence, used to terminate every chat-log
/// line. The full list still goes to the backend on each request.
pub(crate) fn canonical_stop(format: &PromptFormatConfig) -> &str {
    format
        .stop_sequences
        .first()
        .map(String::as_str)
        .unwrap_or_default()
}
