//
// cross_file/directive.rs
//
// Include directive parsing for cross-file awareness
//

use regex::Regex;
use std::sync::OnceLock;

/// An include directive as written in the source, before resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawInclude {
    /// Text between the delimiters, e.g. `sdktools` or `include/colors.inc`
    pub reference: String,
    /// `<...>` form: a standard-library header
    pub is_builtin: bool,
    /// `#tryinclude`: a missing file is not reported
    pub is_try: bool,
    /// 0-based line of the directive
    pub line: u32,
}

impl RawInclude {
    /// The include every plugin gets without writing it
    pub fn implicit_sourcemod() -> Self {
        Self {
            reference: "sourcemod".to_string(),
            is_builtin: true,
            is_try: false,
            line: 0,
        }
    }
}

fn include_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Groups: 1=directive name, 2=chevron path, 3=quoted path
    PATTERN.get_or_init(|| {
        Regex::new(r#"^\s*#\s*(include|tryinclude)\s*(?:<([^>]+)>|"([^"]+)")"#).unwrap()
    })
}

/// Parse `#include` and `#tryinclude` directives from file content.
///
/// Directives inside `/* ... */` block comments are skipped.
pub fn parse_includes(content: &str) -> Vec<RawInclude> {
    let pattern = include_pattern();
    let mut includes = Vec::new();
    let mut in_block_comment = false;

    for (line_num, line) in content.lines().enumerate() {
        let visible = strip_block_comments(line, &mut in_block_comment);
        let Some(caps) = pattern.captures(&visible) else {
            continue;
        };

        let is_try = &caps[1] == "tryinclude";
        let (reference, is_builtin) = match (caps.get(2), caps.get(3)) {
            (Some(m), _) => (m.as_str(), true),
            (None, Some(m)) => (m.as_str(), false),
            (None, None) => continue,
        };
        let reference = reference.trim();
        if reference.is_empty() {
            continue;
        }

        log::trace!(
            "  Parsed include at line {}: '{}' (builtin: {}, try: {})",
            line_num,
            reference,
            is_builtin,
            is_try
        );
        includes.push(RawInclude {
            reference: reference.to_string(),
            is_builtin,
            is_try,
            line: line_num as u32,
        });
    }

    includes
}

/// Return the part of `line` outside block comments, updating the
/// cross-line comment state.
pub(crate) fn strip_block_comments(line: &str, in_block_comment: &mut bool) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    loop {
        if *in_block_comment {
            match rest.find("*/") {
                Some(end) => {
                    rest = &rest[end + 2..];
                    *in_block_comment = false;
                }
                None => return out,
            }
        } else {
            match rest.find("/*") {
                Some(start) => {
                    out.push_str(&rest[..start]);
                    rest = &rest[start + 2..];
                    *in_block_comment = true;
                }
                None => {
                    out.push_str(rest);
                    return out;
                }
            }
        }
    }
}
