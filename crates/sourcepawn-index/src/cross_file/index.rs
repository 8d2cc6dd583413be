//
// cross_file/index.rs
//
// Completion index: per-file symbol tables joined through include edges
//

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexSet;
use tower_lsp::lsp_types::Url;

use super::config::IndexConfig;
use super::error::IndexError;
use super::include::{path_to_uri, resolve_include, IncludeEdge};
use super::registry::DocumentRegistry;
use super::symbols::{FileSymbolTable, SymbolRecord};
use super::RawInclude;
use crate::completion_context::{detect_call_context, detect_member_access};

/// Result of a signature-help query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureHelpState<'a> {
    /// Name of the call the cursor is in, if any
    pub method_name: Option<String>,
    /// 0-based index of the argument under the cursor
    pub active_parameter: u32,
    /// The first visible declaration named `method_name`
    pub signature: Option<&'a SymbolRecord>,
}

/// Registry of file symbol tables keyed by canonical location.
///
/// Tables are stored behind `Arc` and replaced as a whole, so a reader holding
/// a table never observes a partially rebuilt one.
#[derive(Debug, Default)]
pub struct CompletionIndex {
    tables: HashMap<Url, Arc<FileSymbolTable>>,
    documents: DocumentRegistry,
    config: IndexConfig,
}

impl CompletionIndex {
    pub fn new(config: IndexConfig) -> Self {
        Self {
            tables: HashMap::new(),
            documents: DocumentRegistry::new(),
            config,
        }
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: IndexConfig) {
        self.config = config;
    }

    pub fn documents(&self) -> &DocumentRegistry {
        &self.documents
    }

    pub fn documents_mut(&mut self) -> &mut DocumentRegistry {
        &mut self.documents
    }

    pub fn table(&self, location: &Url) -> Option<&Arc<FileSymbolTable>> {
        self.tables.get(location)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn locations(&self) -> impl Iterator<Item = &Url> {
        self.tables.keys()
    }

    /// Resolve one raw include reference against the current registry and
    /// include directories.
    pub fn resolve_include(&self, reference: &str, is_builtin: bool) -> IncludeEdge {
        resolve_include(
            reference,
            is_builtin,
            &self.documents,
            &self.config.include_directories,
        )
    }

    /// Build and swap in the table for `location` from extractor output.
    ///
    /// Returns the resolved edges paired with the raw includes they came
    /// from, in declaration order.
    pub fn update_file(
        &mut self,
        location: Url,
        symbols: Vec<SymbolRecord>,
        includes: &[RawInclude],
    ) -> Vec<(RawInclude, IncludeEdge)> {
        let resolved: Vec<(RawInclude, IncludeEdge)> = includes
            .iter()
            .map(|raw| (raw.clone(), self.resolve_include(&raw.reference, raw.is_builtin)))
            .collect();
        let edges = resolved.iter().map(|(_, edge)| edge.clone()).collect();

        log::trace!(
            "Updating table for {}: {} symbols, {} includes",
            location,
            symbols.len(),
            resolved.len()
        );
        self.insert_table(FileSymbolTable::new(location, symbols, edges));
        resolved
    }

    /// Insert a prebuilt table, replacing any previous table for its location
    pub fn insert_table(&mut self, table: FileSymbolTable) -> Option<Arc<FileSymbolTable>> {
        self.tables.insert(table.location().clone(), Arc::new(table))
    }

    pub fn remove_file(&mut self, location: &Url) -> Option<Arc<FileSymbolTable>> {
        self.tables.remove(location)
    }

    /// Files whose declarations are visible from `location`, in traversal
    /// order: the include closure of `location`, then `location` itself, then
    /// the include closure of the configured main path and the main path.
    pub fn visible_files(&self, location: &Url) -> Result<IndexSet<Url>, IndexError> {
        let mut visited = IndexSet::new();
        self.walk_includes(location, &mut visited);
        visited.insert(location.clone());

        if let Some(main_path) = self.config.resolve_main_path()? {
            match path_to_uri(&main_path) {
                Some(main_location) => {
                    self.walk_includes(&main_location, &mut visited);
                    visited.insert(main_location);
                }
                None => log::warn!(
                    "Main path '{}' cannot be expressed as a file URI",
                    main_path.display()
                ),
            }
        }

        log::trace!("{} files visible from {}", visited.len(), location);
        Ok(visited)
    }

    /// Depth-first walk over include edges starting at `start`'s table.
    ///
    /// A target is marked visited the moment it is first reached, before its
    /// own edges are expanded, so include cycles terminate. Visit order matches
    /// a recursive pre-order walk.
    fn walk_includes(&self, start: &Url, visited: &mut IndexSet<Url>) {
        let Some(table) = self.tables.get(start) else {
            return;
        };
        let mut stack: Vec<&Url> = table.includes().iter().rev().map(|e| &e.target).collect();

        while let Some(target) = stack.pop() {
            if !visited.insert(target.clone()) {
                continue;
            }
            if let Some(child) = self.tables.get(target) {
                stack.extend(child.includes().iter().rev().map(|e| &e.target));
            }
        }
    }

    /// Every symbol declared by a visible file, file by file in traversal
    /// order. Names are not deduplicated across files.
    pub fn all_completions(&self, location: &Url) -> Result<Vec<&SymbolRecord>, IndexError> {
        let visible = self.visible_files(location)?;
        Ok(visible
            .iter()
            .filter_map(|loc| self.tables.get(loc))
            .flat_map(|table| table.symbols())
            .collect())
    }

    /// Completions for a cursor at character `column` of `line_text`.
    ///
    /// After `.` only methods and properties are offered; everywhere else
    /// they are filtered out.
    pub fn completions_at(
        &self,
        location: &Url,
        line_text: &str,
        column: usize,
    ) -> Result<Vec<&SymbolRecord>, IndexError> {
        let member_access = detect_member_access(line_text, column);
        let mut symbols = self.all_completions(location)?;
        symbols.retain(|s| s.kind.is_member() == member_access);
        Ok(symbols)
    }

    /// First visible declaration named exactly `name`
    pub fn find_symbol(
        &self,
        location: &Url,
        name: &str,
    ) -> Result<Option<&SymbolRecord>, IndexError> {
        Ok(self
            .all_completions(location)?
            .into_iter()
            .find(|s| s.name == name))
    }

    /// Rendered documentation for the first visible declaration of `word`
    pub fn hover(&self, location: &Url, word: &str) -> Result<Option<String>, IndexError> {
        Ok(self
            .find_symbol(location, word)?
            .map(|symbol| symbol.render_markdown()))
    }

    /// Call context and signature for a cursor at character `column`
    pub fn signature_help(
        &self,
        location: &Url,
        line_text: &str,
        column: usize,
    ) -> Result<SignatureHelpState<'_>, IndexError> {
        let Some(call) = detect_call_context(line_text, column) else {
            return Ok(SignatureHelpState::default());
        };
        let signature = self.find_symbol(location, &call.method_name)?;
        Ok(SignatureHelpState {
            method_name: Some(call.method_name),
            active_parameter: call.active_parameter,
            signature,
        })
    }
}
