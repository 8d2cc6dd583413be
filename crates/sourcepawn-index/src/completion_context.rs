//
// completion_context.rs
//
// Detects completion and call context at the cursor with a backward scan over
// the current line. This is a lexical heuristic, not a parser: nested calls,
// calls spanning lines, and parentheses or commas inside strings and comments
// are not recognized.
//

/// The call the cursor is inside, as seen on the current line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallContext {
    /// Identifier immediately before the unmatched `(`
    pub method_name: String,
    /// 0-based index of the argument under the cursor
    pub active_parameter: u32,
}

pub fn is_identifier_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// Characters of `line` before character index `column` (clamped)
fn chars_before(line: &str, column: usize) -> Vec<char> {
    line.chars().take(column).collect()
}

/// Whether the cursor follows `.` plus an optional identifier prefix.
///
/// Skips identifier characters backward from the cursor and checks whether
/// the character that stopped the scan is `.`. Running off the start of the
/// line counts as free-standing context.
pub fn detect_member_access(line: &str, column: usize) -> bool {
    chars_before(line, column)
        .into_iter()
        .rev()
        .find(|ch| !is_identifier_char(*ch))
        == Some('.')
}

/// Recover the enclosing call from the text before the cursor.
///
/// Returns `None` when the cursor directly follows `)`, when no `(` precedes
/// the cursor on this line, or when no identifier precedes that `(`.
pub fn detect_call_context(line: &str, column: usize) -> Option<CallContext> {
    let before = chars_before(line, column);
    if before.last() == Some(&')') {
        return None;
    }

    let mut active_parameter = 0u32;
    let mut found_paren = false;
    let mut name_rev = String::new();

    for &ch in before.iter().rev() {
        if found_paren {
            if !is_identifier_char(ch) {
                break;
            }
            name_rev.push(ch);
        } else if ch == ',' {
            active_parameter += 1;
        } else if ch == '(' {
            found_paren = true;
        }
    }

    if !found_paren || name_rev.is_empty() {
        return None;
    }

    Some(CallContext {
        method_name: name_rev.chars().rev().collect(),
        active_parameter,
    })
}

/// Identifier under or immediately before character index `column`
pub fn word_at(line: &str, column: usize) -> Option<String> {
    let chars: Vec<char> = line.chars().collect();
    let column = column.min(chars.len());

    let mut start = column;
    while start > 0 && is_identifier_char(chars[start - 1]) {
        start -= 1;
    }
    let mut end = column;
    while end < chars.len() && is_identifier_char(chars[end]) {
        end += 1;
    }

    (start < end).then(|| chars[start..end].iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_access_after_dot() {
        assert!(detect_member_access("obj.", 4));
        assert!(detect_member_access("player.Heal", 11));
        assert!(detect_member_access("  view_as<Player>(client).Get", 29));
    }

    #[test]
    fn test_free_standing_context() {
        assert!(!detect_member_access("fo", 2));
        assert!(!detect_member_access("", 0));
        assert!(!detect_member_access("x = Get", 7));
        assert!(!detect_member_access("obj. ", 5));
    }

    #[test]
    fn test_member_access_ignores_text_after_cursor() {
        assert!(!detect_member_access("abc.def", 2));
        assert!(detect_member_access("abc.def", 5));
    }

    #[test]
    fn test_call_context_counts_commas() {
        let ctx = detect_call_context("DoThing(a, b, ", 14).unwrap();
        assert_eq!(ctx.method_name, "DoThing");
        assert_eq!(ctx.active_parameter, 2);

        let ctx = detect_call_context("    PrintToChat(", 16).unwrap();
        assert_eq!(ctx.method_name, "PrintToChat");
        assert_eq!(ctx.active_parameter, 0);
    }

    #[test]
    fn test_closed_call_has_no_context() {
        assert!(detect_call_context("DoThing(a)", 10).is_none());
    }

    #[test]
    fn test_no_paren_has_no_context() {
        assert!(detect_call_context("int x = 5, y", 12).is_none());
        assert!(detect_call_context("", 0).is_none());
    }

    #[test]
    fn test_space_before_paren_yields_no_name() {
        assert!(detect_call_context("if (a, ", 7).is_none());
    }

    #[test]
    fn test_member_call_stops_at_dot() {
        let ctx = detect_call_context("player.SetHealth(100, ", 22).unwrap();
        assert_eq!(ctx.method_name, "SetHealth");
        assert_eq!(ctx.active_parameter, 1);
    }

    #[test]
    fn test_nested_call_is_heuristic() {
        // Inner call closed mid-line: the scan still reports the nearest `(`.
        let ctx = detect_call_context("Outer(Inner(1, 2), ", 19).unwrap();
        assert_eq!(ctx.method_name, "Inner");
        assert_eq!(ctx.active_parameter, 2);
    }

    #[test]
    fn test_column_is_clamped() {
        let ctx = detect_call_context("Foo(", 100).unwrap();
        assert_eq!(ctx.method_name, "Foo");
    }

    #[test]
    fn test_word_at() {
        assert_eq!(word_at("PrintToServer(x)", 3).as_deref(), Some("PrintToServer"));
        assert_eq!(word_at("PrintToServer(x)", 13).as_deref(), Some("PrintToServer"));
        assert_eq!(word_at("a + b", 2), None);
        assert_eq!(word_at("g_Count;", 0).as_deref(), Some("g_Count"));
        assert_eq!(word_at("", 0), None);
    }
}
