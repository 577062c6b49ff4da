//! Character-offset helpers.
//!
//! The analysis service reports scene boundaries as character indexes, so
//! all arithmetic here is in characters, never bytes. Slices always land on
//! UTF-8 boundaries.

/// Byte offset of the `char_idx`-th character, or `text.len()` when the
/// index is past the end.
fn byte_offset(text: &str, char_idx: usize) -> usize {
    text.char_indices()
        .nth(char_idx)
        .map_or(text.len(), |(i, _)| i)
}

/// Number of characters in `text`.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// The first `max` characters of `text`.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    &text[..byte_offset(text, max)]
}

/// Slice `text` by character offsets. `start >= end` yields the empty
/// string; offsets past the end are pinned to it.
pub fn char_slice(text: &str, start: usize, end: usize) -> &str {
    if start >= end {
        return "";
    }
    &text[byte_offset(text, start)..byte_offset(text, end)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_matches_offsets_exactly() {
        let text = "0123456789";
        assert_eq!(char_slice(text, 2, 5), "234");
        assert_eq!(char_slice(text, 0, 10), text);
        assert_eq!(char_slice(text, 9, 10), "9");
    }

    #[test]
    fn collapsed_or_inverted_range_is_empty() {
        assert_eq!(char_slice("abc", 2, 2), "");
        assert_eq!(char_slice("abc", 3, 1), "");
    }

    #[test]
    fn offsets_count_characters_not_bytes() {
        let text = "aé日b";
        assert_eq!(char_len(text), 4);
        assert_eq!(char_slice(text, 1, 3), "é日");
        assert_eq!(truncate_chars(text, 2), "aé");
    }

    #[test]
    fn truncate_past_end_is_identity() {
        assert_eq!(truncate_chars("abc", 100), "abc");
        assert_eq!(truncate_chars("", 5), "");
    }
}
