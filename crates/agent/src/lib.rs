//! The deliberation engine — prompt assembly through published transcript.
//!
//! A conversation round trips through this crate in four stages:
//!
//! 1. **Assemble**: recent history is rendered into a budgeted chat-log
//!    prompt with a persona's system prompt and response cue.
//! 2. **Stream**: the prompt drives multi-round completions against the
//!    backend until a stop signal or the round cap.
//! 3. **Summarize**: a pending summary snapshots the message window, runs
//!    the stream, and is always marked terminal, even on failure.
//! 4. **Publish**: a complete conversation's transcript goes to the
//!    content-addressed store, exactly once.

pub mod persona;
pub mod prompt;
pub mod publish;
pub mod stream;
pub mod summary;

pub use persona::{Persona, PromptKind};
pub use prompt::{BuiltPrompt, PromptBuilder};
pub use publish::Publisher;
pub use stream::{Responder, ResponseStream, StreamChunk};
pub use summary::{SummaryJob, SummaryOutcome};

#[cfg(test)]
pub(crate) mod test_helpers;
