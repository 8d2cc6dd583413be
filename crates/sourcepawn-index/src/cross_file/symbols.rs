//
// cross_file/symbols.rs
//
// Symbol records and per-file symbol tables
//

use indexmap::IndexMap;
use tower_lsp::lsp_types::Url;

use super::include::IncludeEdge;

/// Kind of a declared symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Function,
    Method,
    Property,
    Constant,
    Variable,
    Enum,
    EnumMember,
    Methodmap,
    Typedef,
}

impl SymbolKind {
    /// Whether the symbol is only reachable through member access (`obj.Name`)
    pub fn is_member(self) -> bool {
        matches!(self, SymbolKind::Method | SymbolKind::Property)
    }
}

/// A single declared parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterInfo {
    /// Parameter name (e.g., "client", "...")
    pub name: String,
    /// Declared type text, if any (e.g., "const char[]", "int &")
    pub type_name: Option<String>,
    /// Default value as written, if any
    pub default_value: Option<String>,
}

impl ParameterInfo {
    /// Render the parameter the way it appears in a declaration
    pub fn label(&self) -> String {
        let mut label = match &self.type_name {
            // `int &out` and old-style tags like `Float:speed` attach directly
            Some(ty) if ty.ends_with('&') || ty.ends_with(':') => format!("{}{}", ty, self.name),
            Some(ty) => format!("{} {}", ty, self.name),
            None => self.name.clone(),
        };
        if let Some(default) = &self.default_value {
            label.push_str(" = ");
            label.push_str(default);
        }
        label
    }
}

/// Structured signature of a callable symbol
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    pub parameters: Vec<ParameterInfo>,
    pub return_type: Option<String>,
}

/// One declared name with the metadata needed to render completions,
/// hovers and signatures. Never mutated once inserted into a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolRecord {
    pub name: String,
    pub kind: SymbolKind,
    pub documentation: Option<String>,
    /// Present for callables (functions, methods)
    pub signature: Option<Signature>,
    /// Owning methodmap or enum for members
    pub parent: Option<String>,
    /// 0-based declaration line
    pub line: u32,
}

impl SymbolRecord {
    pub fn new(name: impl Into<String>, kind: SymbolKind) -> Self {
        Self {
            name: name.into(),
            kind,
            documentation: None,
            signature: None,
            parent: None,
            line: 0,
        }
    }

    pub fn with_signature(mut self, signature: Signature) -> Self {
        self.signature = Some(signature);
        self
    }

    pub fn with_documentation(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = Some(documentation.into());
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn at_line(mut self, line: u32) -> Self {
        self.line = line;
        self
    }

    /// Signature line as shown in hovers and signature help.
    ///
    /// Callables render as `ret Parent.Name(params)`; everything else renders
    /// its kind keyword and qualified name.
    pub fn signature_label(&self) -> String {
        let qualified = match &self.parent {
            Some(parent) if self.kind.is_member() => format!("{}.{}", parent, self.name),
            _ => self.name.clone(),
        };
        match (&self.signature, self.kind) {
            (Some(sig), _) => {
                let params: Vec<String> = sig.parameters.iter().map(|p| p.label()).collect();
                match &sig.return_type {
                    Some(ret) => format!("{} {}({})", ret, qualified, params.join(", ")),
                    None => format!("{}({})", qualified, params.join(", ")),
                }
            }
            (None, SymbolKind::Property) => format!("property {}", qualified),
            (None, SymbolKind::Constant) => format!("#define {}", qualified),
            (None, SymbolKind::Methodmap) => format!("methodmap {}", qualified),
            (None, SymbolKind::Enum) => format!("enum {}", qualified),
            (None, SymbolKind::Typedef) => format!("typedef {}", qualified),
            (None, _) => qualified,
        }
    }

    /// Markdown rendering used for hovers
    pub fn render_markdown(&self) -> String {
        let mut out = format!("```sourcepawn\n{}\n```", self.signature_label());
        if let Some(doc) = self.documentation.as_deref().filter(|d| !d.trim().is_empty()) {
            out.push_str("\n---\n");
            out.push_str(doc.trim());
        }
        out
    }
}

/// Symbols and include edges declared by one file.
///
/// Built once from extractor output and replaced wholesale when the file is
/// reparsed. On a name collision within the file the last declaration wins.
#[derive(Debug, Clone)]
pub struct FileSymbolTable {
    location: Url,
    symbols: IndexMap<String, SymbolRecord>,
    includes: Vec<IncludeEdge>,
}

impl FileSymbolTable {
    pub fn new(
        location: Url,
        symbols: impl IntoIterator<Item = SymbolRecord>,
        includes: Vec<IncludeEdge>,
    ) -> Self {
        let mut by_name = IndexMap::new();
        for symbol in symbols {
            if let Some(previous) = by_name.insert(symbol.name.clone(), symbol) {
                log::trace!(
                    "Symbol '{}' redeclared in {}, keeping the later declaration",
                    previous.name,
                    location
                );
            }
        }
        Self {
            location,
            symbols: by_name,
            includes,
        }
    }

    pub fn location(&self) -> &Url {
        &self.location
    }

    /// Symbols in declaration order
    pub fn symbols(&self) -> impl Iterator<Item = &SymbolRecord> {
        self.symbols.values()
    }

    pub fn symbol(&self, name: &str) -> Option<&SymbolRecord> {
        self.symbols.get(name)
    }

    pub fn includes(&self) -> &[IncludeEdge] {
        &self.includes
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(&format!("file:///project/{}", s)).unwrap()
    }

    fn param(ty: Option<&str>, name: &str, default: Option<&str>) -> ParameterInfo {
        ParameterInfo {
            name: name.to_string(),
            type_name: ty.map(str::to_string),
            default_value: default.map(str::to_string),
        }
    }

    #[test]
    fn test_last_declaration_wins_within_file() {
        let first = SymbolRecord::new("Foo", SymbolKind::Function).at_line(1);
        let second = SymbolRecord::new("Foo", SymbolKind::Constant).at_line(9);
        let table = FileSymbolTable::new(url("a.sp"), vec![first, second], Vec::new());

        assert_eq!(table.len(), 1);
        let foo = table.symbol("Foo").unwrap();
        assert_eq!(foo.kind, SymbolKind::Constant);
        assert_eq!(foo.line, 9);
    }

    #[test]
    fn test_symbols_keep_declaration_order() {
        let table = FileSymbolTable::new(
            url("a.sp"),
            vec![
                SymbolRecord::new("Zeta", SymbolKind::Function),
                SymbolRecord::new("Alpha", SymbolKind::Function),
                SymbolRecord::new("Mid", SymbolKind::Constant),
            ],
            Vec::new(),
        );
        let names: Vec<&str> = table.symbols().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Zeta", "Alpha", "Mid"]);
    }

    #[test]
    fn test_parameter_labels() {
        assert_eq!(param(Some("int"), "client", None).label(), "int client");
        assert_eq!(
            param(Some("const char[]"), "name", None).label(),
            "const char[] name"
        );
        assert_eq!(param(Some("Float:"), "speed", None).label(), "Float:speed");
        assert_eq!(param(Some("int &"), "out", None).label(), "int &out");
        assert_eq!(
            param(Some("bool"), "force", Some("false")).label(),
            "bool force = false"
        );
        assert_eq!(param(None, "...", None).label(), "...");
    }

    #[test]
    fn test_signature_label_for_method() {
        let record = SymbolRecord::new("SetHealth", SymbolKind::Method)
            .with_parent("Player")
            .with_signature(Signature {
                parameters: vec![param(Some("int"), "amount", None)],
                return_type: Some("void".to_string()),
            });
        assert_eq!(record.signature_label(), "void Player.SetHealth(int amount)");
    }

    #[test]
    fn test_render_markdown_includes_documentation() {
        let record = SymbolRecord::new("MAXPLAYERS", SymbolKind::Constant)
            .with_documentation("Maximum number of players.");
        let rendered = record.render_markdown();
        assert!(rendered.starts_with("```sourcepawn\n#define MAXPLAYERS\n```"));
        assert!(rendered.ends_with("Maximum number of players."));
    }

    #[test]
    fn test_render_markdown_skips_blank_documentation() {
        let record = SymbolRecord::new("g_Count", SymbolKind::Variable).with_documentation("   ");
        assert_eq!(record.render_markdown(), "```sourcepawn\ng_Count\n```");
    }

    #[test]
    fn test_member_kinds() {
        assert!(SymbolKind::Method.is_member());
        assert!(SymbolKind::Property.is_member());
        assert!(!SymbolKind::Function.is_member());
        assert!(!SymbolKind::EnumMember.is_member());
    }
}
