pub(crate) fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// First `words` whitespace-separated words, re-joined with single spaces.
pub(crate) fn truncate_words(text: &str, words: usize) -> String {
    text.split_whitespace()
        .take(words)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Trimmed value of a required text parameter.
pub(crate) fn required<'a>(name: &str, value: &'a str) -> Result<&'a str, crate::error::TaskError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(crate::error::TaskError::InvalidParameters(format!(
            "{name} must not be blank"
        )));
    }
    Ok(trimmed)
}
