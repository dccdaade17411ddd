use serde::Serialize;

/// Emitted when research text exceeded the character budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TruncationNotice {
    pub original: usize,
    pub kept: usize,
}

/// Drops control characters, keeping newlines and tabs.
pub fn strip_non_printable(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect()
}

/// Keeps the first `budget` characters (Unicode scalar values, not bytes).
pub fn truncate_chars(mut text: String, budget: usize) -> (String, Option<TruncationNotice>) {
    let cut = match text.char_indices().nth(budget) {
        Some((byte_idx, _)) => byte_idx,
        None => return (text, None),
    };
    let original = budget + text[cut..].chars().count();
    text.truncate(cut);
    (
        text,
        Some(TruncationNotice {
            original,
            kept: budget,
        }),
    )
}
