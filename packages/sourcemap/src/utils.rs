/// Converts a byte offset into 0-indexed (line, column). Columns count
/// characters, not bytes, which is what Source Map v3 consumers expect.
pub fn offset_to_line_col(source: &str, offset: usize) -> (u32, u32) {
    let mut line = 0u32;
    let mut col = 0u32;
    let mut consumed = 0usize;
    for c in source.chars() {
        if consumed >= offset {
            break;
        }
        if c == '\n' {
            line += 1;
            col = 0;
        } else {
            col += 1;
        }
        consumed += c.len_utf8();
    }
    (line, col)
}

/// 1-indexed line of a byte offset, for `/* line N, file */` annotations.
pub fn offset_to_line_number(source: &str, offset: usize) -> u32 {
    offset_to_line_col(source, offset).0 + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_of_lines() {
        let source = "ab\ncd\nef";
        assert_eq!(offset_to_line_col(source, 0), (0, 0));
        assert_eq!(offset_to_line_col(source, 3), (1, 0));
        assert_eq!(offset_to_line_col(source, 6), (2, 0));
    }

    #[test]
    fn mid_line_columns() {
        let source = "ab\ncd";
        assert_eq!(offset_to_line_col(source, 4), (1, 1));
    }

    #[test]
    fn multibyte_columns_count_characters() {
        let source = "é\nx";
        // 'é' is two bytes; its newline sits at byte offset 2.
        assert_eq!(offset_to_line_col(source, 3), (1, 0));
    }

    #[test]
    fn out_of_bounds_clamps_to_end() {
        let source = "ab";
        assert_eq!(offset_to_line_col(source, 100), (0, 2));
    }

    #[test]
    fn line_numbers_are_one_indexed() {
        assert_eq!(offset_to_line_number("a\nb", 2), 2);
    }
}
