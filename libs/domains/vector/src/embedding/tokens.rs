//! Whitespace token accounting shared by providers without their own tokenizer.

/// Number of whitespace-separated tokens.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Keep the first `max_tokens` whitespace-separated tokens.
///
/// Returns the original slice (up to the end of the last kept token) and
/// whether anything was dropped. `max_tokens == 0` means no limit.
pub fn truncate_words(text: &str, max_tokens: usize) -> (&str, bool) {
    if max_tokens == 0 {
        return (text, false);
    }

    let mut seen = 0;
    let mut in_token = false;
    let mut cut_at = None;
    for (idx, ch) in text.char_indices() {
        if ch.is_whitespace() {
            if in_token {
                in_token = false;
                if seen == max_tokens {
                    cut_at = Some(idx);
                }
            }
        } else if !in_token {
            if let Some(cut) = cut_at {
                return (&text[..cut], true);
            }
            in_token = true;
            seen += 1;
        }
    }

    (text, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_words() {
        assert_eq!(count_words(""), 0);
        assert_eq!(count_words("  hello \n world\t"), 2);
    }

    #[test]
    fn test_truncate_keeps_prefix() {
        assert_eq!(truncate_words("a b c d", 2), ("a b", true));
        assert_eq!(truncate_words("  a  b  c", 2), ("  a  b", true));
    }

    #[test]
    fn test_truncate_short_input_is_untouched() {
        assert_eq!(truncate_words("a b", 2), ("a b", false));
        assert_eq!(truncate_words("a b ", 2), ("a b ", false));
        assert_eq!(truncate_words("a b c", 0), ("a b c", false));
    }

    #[test]
    fn test_truncate_is_deterministic() {
        let text = "one two three four five six";
        assert_eq!(truncate_words(text, 4), truncate_words(text, 4));
    }
}
