/// Convert a UTF-16 column offset (from LSP Position.character) to a char
/// index within the given line. Context detection works on char indices.
pub fn utf16_column_to_char_index(line: &str, utf16_col: u32) -> usize {
    let mut utf16_count = 0;
    for (char_idx, ch) in line.chars().enumerate() {
        if utf16_count >= utf16_col as usize {
            return char_idx;
        }
        utf16_count += ch.len_utf16();
    }
    line.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_columns_are_unchanged() {
        assert_eq!(utf16_column_to_char_index("Foo(a, b)", 4), 4);
        assert_eq!(utf16_column_to_char_index("Foo", 10), 3);
    }

    #[test]
    fn test_surrogate_pairs_count_as_one_char() {
        // U+1F600 is two UTF-16 code units
        let line = "\u{1F600}x.y";
        assert_eq!(utf16_column_to_char_index(line, 2), 1);
        assert_eq!(utf16_column_to_char_index(line, 4), 3);
    }
}
