//
// declarations.rs
//
// Line-oriented declaration scanner for SourcePawn.
//
// Recovers top-level functions, defines, variables, methodmaps, enums and
// typedefs from source text together with their doc comments. Brace depth is
// tracked with string and comment contents blanked out. Anything the patterns
// below do not recognize is skipped rather than reported.
//

use regex::Regex;
use std::sync::OnceLock;
use tower_lsp::lsp_types::Url;

use crate::cross_file::directive::{parse_includes, strip_block_comments};
use crate::cross_file::{ParameterInfo, RawInclude, Signature, SymbolKind, SymbolRecord};

/// Output of symbol extraction for one file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub symbols: Vec<SymbolRecord>,
    pub includes: Vec<RawInclude>,
}

/// Supplies the symbols and raw includes declared by a file
pub trait SymbolExtractor: Send + Sync {
    fn extract(&self, location: &Url, text: &str) -> Extraction;
}

/// Default extractor backed by [`scan_declarations`] and
/// [`parse_includes`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceScanner;

impl SymbolExtractor for SourceScanner {
    fn extract(&self, location: &Url, text: &str) -> Extraction {
        let extraction = Extraction {
            symbols: scan_declarations(text),
            includes: parse_includes(text),
        };
        log::trace!(
            "Extracted {} symbols and {} includes from {}",
            extraction.symbols.len(),
            extraction.includes.len(),
            location
        );
        extraction
    }
}

const KEYWORDS: &[&str] = &[
    "if", "else", "for", "while", "do", "switch", "case", "default", "return", "sizeof",
    "view_as", "new", "delete", "break", "continue", "decl", "static", "const", "public",
    "stock", "native", "forward", "methodmap", "enum", "struct", "typedef", "typeset",
    "property", "using", "funcenum", "functag",
];

/// Header lines scanned for a closing `)` before giving up
const MAX_HEADER_LINES: usize = 32;

fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

struct Patterns {
    define: Regex,
    methodmap: Regex,
    enumeration: Regex,
    typedef: Regex,
    function: Regex,
    variable: Regex,
    method: Regex,
    property: Regex,
    struct_method: Regex,
    struct_field: Regex,
    enum_entry: Regex,
    parameter: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        define: Regex::new(r"^\s*#\s*define\s+([A-Za-z_]\w*)").unwrap(),
        methodmap: Regex::new(r"^\s*methodmap\s+([A-Za-z_]\w*)").unwrap(),
        // Groups: 1="struct " marker, 2=name (absent for anonymous enums)
        enumeration: Regex::new(r"^\s*enum\b\s*(struct\s+)?(?:([A-Za-z_]\w*)\s*(?::|\{|\(|$))?")
            .unwrap(),
        typedef: Regex::new(r"^\s*(?:typedef|typeset|funcenum|functag)\s+([A-Za-z_]\w*)").unwrap(),
        // Groups: 1=storage classes, 2=new-style return type, 3=old-style tag, 4=name
        function: Regex::new(
            r"^\s*((?:(?:public|stock|static|native|forward)\s+)*)(?:([A-Za-z_]\w*(?:\s*\[\s*\])?)\s+|([A-Za-z_]\w*):)?([A-Za-z_]\w*)\s*\(",
        )
        .unwrap(),
        // Groups: 1=new-style type, 2=name
        variable: Regex::new(
            r"^\s*(?:(?:static|const|public|stock)\s+)*(?:(?:new|decl)\s+(?:[A-Za-z_]\w*:)?|([A-Za-z_]\w*)(?:\s*\[\s*\])?\s+)([A-Za-z_]\w*)\s*(?:\[[^\]]*\]\s*)*(?:=|;|,)",
        )
        .unwrap(),
        // Groups: 1=return type, 2=name
        method: Regex::new(
            r"^\s*public\s+(?:(?:native|static)\s+)*(?:([A-Za-z_]\w*(?:\s*\[\s*\])?)\s+)?([A-Za-z_]\w*)\s*\(",
        )
        .unwrap(),
        property: Regex::new(r"^\s*property\s+([A-Za-z_]\w*(?:\s*\[\s*\])?)\s+([A-Za-z_]\w*)")
            .unwrap(),
        struct_method: Regex::new(
            r"^\s*([A-Za-z_]\w*(?:\s*\[\s*\])?)\s+([A-Za-z_]\w*)\s*\(",
        )
        .unwrap(),
        struct_field: Regex::new(
            r"^\s*([A-Za-z_]\w*)\s+([A-Za-z_]\w*)\s*(?:\[[^\]]*\]\s*)*;",
        )
        .unwrap(),
        enum_entry: Regex::new(r"^\s*([A-Za-z_]\w*)").unwrap(),
        // Groups: 1=type prefix, 2=name, 3=array dimensions
        parameter: Regex::new(r"^(.*?)([A-Za-z_]\w*)\s*((?:\[[^\]]*\]\s*)*)$").unwrap(),
    })
}

#[derive(Debug, Clone)]
enum BlockKind {
    Methodmap(String),
    Enum(Option<String>),
    EnumStruct(String),
}

#[derive(Debug)]
struct Block {
    kind: BlockKind,
    /// Brace depth of the block body
    depth: i32,
}

#[derive(Debug)]
struct PendingHeader {
    text: String,
    line: u32,
    lines_seen: usize,
    name: String,
    kind: SymbolKind,
    return_type: Option<String>,
    parent: Option<String>,
    documentation: Option<String>,
}

#[derive(Default)]
struct Scanner {
    symbols: Vec<SymbolRecord>,
    doc_lines: Vec<String>,
    in_doc_comment: bool,
    in_block_comment: bool,
    depth: i32,
    block: Option<Block>,
    /// Block declared on this or a previous line whose `{` has not been seen
    pending_block: Option<BlockKind>,
    pending_header: Option<PendingHeader>,
}

/// Scan SourcePawn source text for declarations
pub fn scan_declarations(text: &str) -> Vec<SymbolRecord> {
    let mut scanner = Scanner::default();
    for (line_num, line) in text.lines().enumerate() {
        scanner.scan_line(line, line_num as u32);
    }
    scanner.symbols
}

impl Scanner {
    fn scan_line(&mut self, line: &str, line_num: u32) {
        if self.collect_doc_comment(line) {
            return;
        }

        let code = sanitize_code(line, &mut self.in_block_comment);

        if self.pending_header.is_some() {
            self.continue_header(&code);
            self.track_braces(&code);
            return;
        }

        if code.trim().is_empty() {
            if line.trim().is_empty() {
                self.doc_lines.clear();
            }
            return;
        }

        let documentation = self.take_documentation();
        if self.block.is_some() {
            self.scan_block_line(&code, line_num, documentation);
        } else if self.depth == 0 {
            self.scan_top_level_line(line, &code, line_num, documentation);
        }

        self.track_braces(&code);
    }

    /// Accumulate `//` and `/* */` comment lines that may document the next
    /// declaration. Returns true when the line was consumed.
    fn collect_doc_comment(&mut self, line: &str) -> bool {
        let trimmed = line.trim();
        if self.in_doc_comment {
            let (body, closed) = match trimmed.find("*/") {
                Some(end) => (&trimmed[..end], true),
                None => (trimmed, false),
            };
            push_doc_line(&mut self.doc_lines, body.trim_start_matches('*'));
            self.in_doc_comment = !closed;
            return true;
        }
        if self.in_block_comment || self.pending_header.is_some() {
            return false;
        }
        if let Some(rest) = trimmed.strip_prefix("//") {
            push_doc_line(&mut self.doc_lines, rest.trim_start_matches('/'));
            return true;
        }
        if let Some(rest) = trimmed.strip_prefix("/*") {
            self.doc_lines.clear();
            let rest = rest.trim_start_matches('*');
            match rest.find("*/") {
                Some(end) => {
                    push_doc_line(&mut self.doc_lines, &rest[..end]);
                    // Trailing code after the comment is not a declaration we track
                    return rest[end + 2..].trim().is_empty();
                }
                None => {
                    push_doc_line(&mut self.doc_lines, rest);
                    self.in_doc_comment = true;
                    return true;
                }
            }
        }
        false
    }

    fn take_documentation(&mut self) -> Option<String> {
        let doc = self.doc_lines.join("\n").trim().to_string();
        self.doc_lines.clear();
        (!doc.is_empty()).then_some(doc)
    }

    fn scan_top_level_line(
        &mut self,
        raw_line: &str,
        code: &str,
        line_num: u32,
        documentation: Option<String>,
    ) {
        let p = patterns();

        // #define values may hold strings, so match the raw line
        if let Some(caps) = p.define.captures(raw_line) {
            self.push(SymbolRecord::new(&caps[1], SymbolKind::Constant), line_num, documentation);
            return;
        }
        if code.trim_start().starts_with('#') {
            return;
        }

        if let Some(caps) = p.methodmap.captures(code) {
            let name = caps[1].to_string();
            self.push(SymbolRecord::new(&name, SymbolKind::Methodmap), line_num, documentation);
            self.open_block(code, line_num, BlockKind::Methodmap(name));
            return;
        }

        if let Some(caps) = p.enumeration.captures(code) {
            let name = caps.get(2).map(|m| m.as_str().to_string());
            let kind = match (&name, caps.get(1).is_some()) {
                (Some(name), true) => BlockKind::EnumStruct(name.clone()),
                _ => BlockKind::Enum(name.clone()),
            };
            if let Some(name) = &name {
                self.push(SymbolRecord::new(name, SymbolKind::Enum), line_num, documentation);
            }
            self.open_block(code, line_num, kind);
            return;
        }

        if let Some(caps) = p.typedef.captures(code) {
            self.push(SymbolRecord::new(&caps[1], SymbolKind::Typedef), line_num, documentation);
            return;
        }

        if let Some(caps) = p.function.captures(code) {
            let name = &caps[4];
            let return_type = caps
                .get(2)
                .map(|m| m.as_str().to_string())
                .or_else(|| caps.get(3).map(|m| format!("{}:", m.as_str())));
            // A bare `Name(` at top level is a stray call, not a declaration
            let declared = !caps[1].trim().is_empty() || return_type.is_some();
            let valid = declared
                && !is_keyword(name)
                && return_type.as_deref().map_or(true, |t| !is_keyword(t.trim_end_matches(':')));
            if valid {
                let header_start = caps.get(0).map_or(0, |m| m.end() - 1);
                self.start_header(PendingHeader {
                    text: code[header_start..].to_string(),
                    line: line_num,
                    lines_seen: 1,
                    name: name.to_string(),
                    kind: SymbolKind::Function,
                    return_type,
                    parent: None,
                    documentation,
                });
                return;
            }
        }

        if let Some(caps) = p.variable.captures(code) {
            let name = &caps[2];
            let type_ok = caps.get(1).map_or(true, |t| !is_keyword(t.as_str()));
            if type_ok && !is_keyword(name) {
                self.push(SymbolRecord::new(name, SymbolKind::Variable), line_num, documentation);
            }
        }
    }

    fn scan_block_line(&mut self, code: &str, line_num: u32, documentation: Option<String>) {
        let Some(block) = &self.block else {
            return;
        };
        if self.depth != block.depth {
            return;
        }
        let p = patterns();

        match block.kind.clone() {
            BlockKind::Methodmap(map) => {
                if let Some(caps) = p.property.captures(code) {
                    let record = SymbolRecord::new(&caps[2], SymbolKind::Property).with_parent(&map);
                    self.push(record, line_num, documentation);
                } else if let Some(caps) = p.method.captures(code) {
                    let header_start = caps.get(0).map_or(0, |m| m.end() - 1);
                    // A constructor shares the methodmap's name and is called
                    // free-standing, so it signs the methodmap record itself
                    let (kind, parent) = if caps[2] == map {
                        (SymbolKind::Methodmap, None)
                    } else {
                        (SymbolKind::Method, Some(map))
                    };
                    self.start_header(PendingHeader {
                        text: code[header_start..].to_string(),
                        line: line_num,
                        lines_seen: 1,
                        name: caps[2].to_string(),
                        kind,
                        return_type: caps.get(1).map(|m| m.as_str().to_string()),
                        parent,
                        documentation,
                    });
                }
            }
            BlockKind::EnumStruct(name) => {
                if let Some(caps) = p.struct_field.captures(code) {
                    if !is_keyword(&caps[1]) {
                        let record =
                            SymbolRecord::new(&caps[2], SymbolKind::Property).with_parent(&name);
                        self.push(record, line_num, documentation);
                    }
                } else if let Some(caps) = p.struct_method.captures(code) {
                    if !is_keyword(&caps[1]) && !is_keyword(&caps[2]) {
                        let header_start = caps.get(0).map_or(0, |m| m.end() - 1);
                        self.start_header(PendingHeader {
                            text: code[header_start..].to_string(),
                            line: line_num,
                            lines_seen: 1,
                            name: caps[2].to_string(),
                            kind: SymbolKind::Method,
                            return_type: Some(caps[1].to_string()),
                            parent: Some(name),
                            documentation,
                        });
                    }
                }
            }
            BlockKind::Enum(name) => {
                let body = code.split('}').next().unwrap_or_default();
                let mut documentation = documentation;
                for entry in body.split(',') {
                    if let Some(caps) = p.enum_entry.captures(entry) {
                        let mut record = SymbolRecord::new(&caps[1], SymbolKind::EnumMember);
                        if let Some(name) = &name {
                            record = record.with_parent(name);
                        }
                        self.push(record, line_num, documentation.take());
                    }
                }
            }
        }
    }

    /// Record a block whose body starts at the next `{`. Entries that share
    /// the opening line with the brace (`enum { A, B }`) are scanned here.
    fn open_block(&mut self, code: &str, line_num: u32, kind: BlockKind) {
        match code.find('{') {
            Some(brace) => {
                self.block = Some(Block {
                    kind,
                    depth: self.depth + 1,
                });
                let rest = &code[brace + 1..];
                if !rest.trim().is_empty() {
                    // Brace tracking for this line runs after the scan, so
                    // scan the remainder at the body depth now.
                    self.depth += 1;
                    self.scan_block_line(rest, line_num, None);
                    self.depth -= 1;
                }
            }
            None => self.pending_block = Some(kind),
        }
    }

    fn start_header(&mut self, header: PendingHeader) {
        self.pending_header = Some(header);
        self.try_finish_header();
    }

    fn continue_header(&mut self, code: &str) {
        let Some(header) = &mut self.pending_header else {
            return;
        };
        header.text.push(' ');
        header.text.push_str(code.trim());
        header.lines_seen += 1;
        if header.lines_seen > MAX_HEADER_LINES {
            log::trace!("Dropping unterminated header for '{}'", header.name);
            self.pending_header = None;
            return;
        }
        self.try_finish_header();
    }

    fn try_finish_header(&mut self) {
        let Some(parameters) = self
            .pending_header
            .as_ref()
            .and_then(|header| parameter_list(&header.text))
            .map(parse_parameters)
        else {
            return;
        };
        let Some(header) = self.pending_header.take() else {
            return;
        };
        let signature = Signature {
            parameters,
            return_type: header.return_type,
        };
        if header.kind == SymbolKind::Methodmap {
            self.attach_constructor(&header.name, signature, header.documentation);
            return;
        }
        let mut record = SymbolRecord::new(header.name, header.kind).with_signature(signature);
        if let Some(parent) = header.parent {
            record = record.with_parent(parent);
        }
        self.push(record, header.line, header.documentation);
    }

    fn attach_constructor(&mut self, map: &str, signature: Signature, documentation: Option<String>) {
        let Some(record) = self
            .symbols
            .iter_mut()
            .rev()
            .find(|s| s.kind == SymbolKind::Methodmap && s.name == map)
        else {
            return;
        };
        record.signature = Some(signature);
        if record.documentation.is_none() {
            record.documentation = documentation;
        }
    }

    fn push(&mut self, mut record: SymbolRecord, line: u32, documentation: Option<String>) {
        record.line = line;
        record.documentation = documentation;
        self.symbols.push(record);
    }

    fn track_braces(&mut self, code: &str) {
        for ch in code.chars() {
            match ch {
                '{' => {
                    self.depth += 1;
                    if let Some(kind) = self.pending_block.take() {
                        self.block = Some(Block {
                            kind,
                            depth: self.depth,
                        });
                    }
                }
                '}' => {
                    self.depth = (self.depth - 1).max(0);
                    if self.block.as_ref().is_some_and(|b| self.depth < b.depth) {
                        self.block = None;
                    }
                }
                ';' if self.depth == 0 => {
                    // `methodmap Foo;` style forward declarations never open a body
                    self.pending_block = None;
                }
                _ => {}
            }
        }
    }
}

fn push_doc_line(doc_lines: &mut Vec<String>, text: &str) {
    let text = text.trim();
    if !text.is_empty() {
        doc_lines.push(text.to_string());
    }
}

/// Blank out string/char literal contents and drop comments so brace
/// counting and pattern matching only see code.
fn sanitize_code(line: &str, in_block_comment: &mut bool) -> String {
    let without_blocks = strip_block_comments(line, in_block_comment);
    let mut out = String::with_capacity(without_blocks.len());
    let mut quote: Option<char> = None;
    let mut chars = without_blocks.chars().peekable();

    while let Some(ch) = chars.next() {
        match quote {
            Some(q) => {
                if ch == '\\' {
                    chars.next();
                    out.push(' ');
                } else if ch == q {
                    quote = None;
                    out.push(ch);
                    continue;
                }
                out.push(' ');
            }
            None => match ch {
                '"' | '\'' => {
                    quote = Some(ch);
                    out.push(ch);
                }
                '/' if chars.peek() == Some(&'/') => break,
                _ => out.push(ch),
            },
        }
    }
    out
}

/// Text between the first `(` of `header` and its matching `)`, or `None`
/// while the header is still open.
fn parameter_list(header: &str) -> Option<&str> {
    let open = header.find('(')?;
    let mut depth = 0i32;
    for (idx, ch) in header[open..].char_indices() {
        match ch {
            '(' | '{' | '[' => depth += 1,
            ')' | '}' | ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&header[open + 1..open + idx]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split a parameter list on top-level commas and parse each parameter
fn parse_parameters(list: &str) -> Vec<ParameterInfo> {
    let mut params = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (idx, ch) in list.char_indices() {
        match ch {
            '(' | '{' | '[' => depth += 1,
            ')' | '}' | ']' => depth -= 1,
            ',' if depth == 0 => {
                params.extend(parse_parameter(&list[start..idx]));
                start = idx + 1;
            }
            _ => {}
        }
    }
    params.extend(parse_parameter(&list[start..]));
    params
}

fn parse_parameter(text: &str) -> Option<ParameterInfo> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let (decl, default_value) = match split_default(text) {
        Some((decl, default)) => (decl.trim(), Some(default.trim().to_string())),
        None => (text, None),
    };

    if let Some(prefix) = decl.strip_suffix("...") {
        let prefix = prefix.trim();
        return Some(ParameterInfo {
            name: "...".to_string(),
            type_name: (!prefix.is_empty()).then(|| prefix.to_string()),
            default_value,
        });
    }

    let caps = patterns().parameter.captures(decl)?;
    let prefix = caps[1].trim();
    let dims: String = caps[3].chars().filter(|c| !c.is_whitespace()).collect();
    let type_name = match (prefix.is_empty(), dims.is_empty()) {
        (true, true) => None,
        (true, false) => Some(dims),
        (false, _) => Some(format!("{}{}", prefix, dims)),
    };

    Some(ParameterInfo {
        name: caps[2].to_string(),
        type_name,
        default_value,
    })
}

/// Split `decl = default` at the first top-level `=`
fn split_default(text: &str) -> Option<(&str, &str)> {
    let mut depth = 0i32;
    for (idx, ch) in text.char_indices() {
        match ch {
            '(' | '{' | '[' => depth += 1,
            ')' | '}' | ']' => depth -= 1,
            '=' if depth == 0 => return Some((&text[..idx], &text[idx + 1..])),
            _ => {}
        }
    }
    None
}
