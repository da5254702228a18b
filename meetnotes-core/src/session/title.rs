//! Enter-key handling inside the title input.
//!
//! Cursor positions are character offsets, not byte offsets.

/// Result of pressing Enter in the title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnterOutcome {
    /// Modifier held: a line break was inserted; focus stays in the title
    LineBreak { title: String, cursor: usize },
    /// Focus moves to the body editor at offset 0; title unchanged
    FocusBody,
    /// No body editor to move to
    Ignored,
}

pub fn handle_enter(
    title: &str,
    cursor: usize,
    modifier: bool,
    has_body_editor: bool,
) -> EnterOutcome {
    if modifier {
        let (title, cursor) = insert_line_break(title, cursor);
        EnterOutcome::LineBreak { title, cursor }
    } else if has_body_editor {
        EnterOutcome::FocusBody
    } else {
        EnterOutcome::Ignored
    }
}

/// Inserts `\n` at `cursor` (clamped to the title length) and returns the
/// new title with the cursor one past the break.
pub fn insert_line_break(title: &str, cursor: usize) -> (String, usize) {
    let cursor = cursor.min(title.chars().count());
    let split = title
        .char_indices()
        .nth(cursor)
        .map(|(i, _)| i)
        .unwrap_or(title.len());

    let mut result = String::with_capacity(title.len() + 1);
    result.push_str(&title[..split]);
    result.push('\n');
    result.push_str(&title[split..]);
    (result, cursor + 1)
}

/// Rows the title input needs to show `title` without scrolling.
pub fn title_rows(title: &str) -> usize {
    title.split('\n').count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifier_enter_inserts_break_at_cursor() {
        assert_eq!(
            handle_enter("abcdef", 3, true, true),
            EnterOutcome::LineBreak {
                title: "abc\ndef".to_string(),
                cursor: 4
            }
        );
    }

    #[test]
    fn test_plain_enter_moves_to_body() {
        assert_eq!(handle_enter("abcdef", 3, false, true), EnterOutcome::FocusBody);
        assert_eq!(handle_enter("abcdef", 3, false, false), EnterOutcome::Ignored);
    }

    #[test]
    fn test_insert_line_break_edges() {
        assert_eq!(insert_line_break("", 0), ("\n".to_string(), 1));
        assert_eq!(insert_line_break("ab", 0), ("\nab".to_string(), 1));
        assert_eq!(insert_line_break("ab", 2), ("ab\n".to_string(), 3));
        // Out of range cursor clamps to the end
        assert_eq!(insert_line_break("ab", 10), ("ab\n".to_string(), 3));
    }

    #[test]
    fn test_insert_line_break_counts_chars() {
        assert_eq!(insert_line_break("héllo", 2), ("hé\nllo".to_string(), 3));
    }

    #[test]
    fn test_title_rows() {
        assert_eq!(title_rows(""), 1);
        assert_eq!(title_rows("one"), 1);
        assert_eq!(title_rows("one\ntwo\n"), 3);
    }
}
