//! Deterministic token counting.
//!
//! The completion backend never reports a count we trust, so both prompt
//! budgeting and completion-cap checks recount locally with this function.
//! Tokenization is word/punctuation based: a run of alphanumeric characters
//! (plus inner apostrophes/hyphens) is one token, every other non-whitespace
//! character is its own token. Deterministic for a given input, independent
//! of the backend's model vocabulary.

/// Count the tokens in a string.
pub fn count_tokens(text: &str) -> usize {
    let mut count = 0;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c.is_whitespace() {
            continue;
        }
        if c.is_alphanumeric() {
            // Consume the rest of the word. Apostrophes and hyphens stay
            // inside a word only when followed by another word character.
            while let Some(&next) = chars.peek() {
                if next.is_alphanumeric() {
                    chars.next();
                } else if next == '\'' || next == '-' {
                    let mut ahead = chars.clone();
                    ahead.next();
                    match ahead.peek() {
                        Some(&after) if after.is_alphanumeric() => {
                            chars.next();
                        }
                        _ => break,
                    }
                } else {
                    break;
                }
            }
            count += 1;
        } else {
            // Punctuation and symbols count one each.
            count += 1;
        }
    }

    count
}

/// Count the tokens a multi-line text occupies, line by line.
///
/// Equivalent to [`count_tokens`] on the whole text since line breaks are
/// whitespace, but kept separate so callers budgeting per-line can share it.
pub fn count_lines_tokens<'a>(lines: impl IntoIterator<Item = &'a str>) -> usize {
    lines.into_iter().map(count_tokens).sum()
}
