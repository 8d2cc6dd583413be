//
// state.rs
//
// Open documents, workspace folders and the completion index shared by all
// LSP handlers
//

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use ropey::Rope;
use tower_lsp::lsp_types::TextDocumentContentChangeEvent;
use tower_lsp::lsp_types::Url;
use walkdir::WalkDir;

use crate::cross_file::{path_to_uri, CompletionIndex, IncludeEdge, IndexConfig, RawInclude};
use crate::declarations::{Extraction, SourceScanner, SymbolExtractor};
use crate::utf16::utf16_column_to_char_index;

/// An open document
pub struct Document {
    pub contents: Rope,
    pub version: Option<i32>,
    pub revision: u64,
}

impl Document {
    pub fn new(text: &str, version: Option<i32>) -> Self {
        Self {
            contents: Rope::from_str(text),
            version,
            revision: 0,
        }
    }

    pub fn apply_change(&mut self, change: TextDocumentContentChangeEvent) {
        if let Some(range) = change.range {
            let start_idx = self.char_index(range.start.line, range.start.character);
            let end_idx = self.char_index(range.end.line, range.end.character);

            self.contents.remove(start_idx..end_idx.max(start_idx));
            self.contents.insert(start_idx, &change.text);
        } else {
            // Full document sync
            self.contents = Rope::from_str(&change.text);
        }

        self.revision += 1;
    }

    /// Char index of an LSP position, clamped to the document
    fn char_index(&self, line: u32, utf16_col: u32) -> usize {
        let line = line as usize;
        if line >= self.contents.len_lines() {
            return self.contents.len_chars();
        }
        let line_text = self.contents.line(line).to_string();
        let column = utf16_column_to_char_index(line_text.trim_end_matches(['\n', '\r']), utf16_col);
        self.contents.line_to_char(line) + column
    }

    pub fn text(&self) -> String {
        self.contents.to_string()
    }

    /// Text of a 0-based line without its line terminator
    pub fn line(&self, line: u32) -> Option<String> {
        let line = line as usize;
        if line >= self.contents.len_lines() {
            return None;
        }
        let text = self.contents.line(line).to_string();
        Some(text.trim_end_matches(['\n', '\r']).to_string())
    }
}

/// Extractor output for an indexed file and the include edges it resolved to
#[derive(Debug, Clone)]
struct IndexedFile {
    extraction: Extraction,
    resolved: Vec<(RawInclude, IncludeEdge)>,
}

/// Global LSP state
pub struct WorldState {
    pub documents: HashMap<Url, Document>,
    pub workspace_folders: Vec<Url>,
    pub index: CompletionIndex,
    extractor: Arc<dyn SymbolExtractor>,
    files: HashMap<Url, IndexedFile>,
}

impl Default for WorldState {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldState {
    pub fn new() -> Self {
        Self::with_extractor(Arc::new(SourceScanner))
    }

    pub fn with_extractor(extractor: Arc<dyn SymbolExtractor>) -> Self {
        Self {
            documents: HashMap::new(),
            workspace_folders: Vec::new(),
            index: CompletionIndex::new(IndexConfig::default()),
            extractor,
            files: HashMap::new(),
        }
    }

    pub fn extractor(&self) -> Arc<dyn SymbolExtractor> {
        Arc::clone(&self.extractor)
    }

    pub fn config(&self) -> &IndexConfig {
        self.index.config()
    }

    /// Record a workspace folder; file folders also become workspace roots
    /// for relative settings.
    pub fn add_workspace_folder(&mut self, folder: Url) {
        if let Ok(path) = folder.to_file_path() {
            let mut config = self.index.config().clone();
            config.workspace_roots.push(path);
            self.index.set_config(config);
        }
        self.workspace_folders.push(folder);
    }

    /// Apply client settings. Re-resolves every indexed file when include
    /// resolution is affected. Returns `false` if the settings were ignored.
    pub fn apply_settings(&mut self, settings: &serde_json::Value) -> bool {
        let mut config = self.index.config().clone();
        if !config.apply_settings(settings) {
            return false;
        }
        let include_changed = self.index.config().include_settings_changed(&config);
        self.index.set_config(config);
        if include_changed {
            log::info!("Include settings changed, re-resolving {} files", self.files.len());
            self.reresolve_all();
        } else {
            self.load_dependencies();
        }
        true
    }

    pub fn open_document(&mut self, uri: Url, text: &str, version: Option<i32>) {
        self.documents.insert(uri.clone(), Document::new(text, version));
        self.index_text(uri, text);
    }

    pub fn apply_change(
        &mut self,
        uri: &Url,
        changes: Vec<TextDocumentContentChangeEvent>,
        version: Option<i32>,
    ) {
        let Some(doc) = self.documents.get_mut(uri) else {
            log::warn!("Change for unopened document {}", uri);
            return;
        };
        for change in changes {
            doc.apply_change(change);
        }
        doc.version = version;
        let text = doc.text();
        self.index_text(uri.clone(), &text);
    }

    /// Forget the open document. The file stays indexed from disk when it
    /// still exists there.
    pub fn close_document(&mut self, uri: &Url) {
        self.documents.remove(uri);

        let on_disk = uri.to_file_path().ok().and_then(|path| fs::read_to_string(path).ok());
        match on_disk {
            Some(text) => self.index_text(uri.clone(), &text),
            None => {
                log::trace!("Dropping {} from the index: not on disk", uri);
                self.index.remove_file(uri);
                self.index.documents_mut().unregister(uri);
                self.files.remove(uri);
                self.reresolve_all();
            }
        }
    }

    /// Extract `text` and swap in the table for `uri`.
    ///
    /// A location seen for the first time can satisfy includes other files
    /// already resolved to placeholders, so those are re-resolved too.
    pub fn index_text(&mut self, uri: Url, text: &str) {
        let extraction = self.extractor.extract(&uri, text);
        let is_new = !self.files.contains_key(&uri);
        self.index.documents_mut().register(uri.clone());
        self.index_extraction(uri, extraction);
        if is_new && self.files.len() > 1 {
            self.reresolve_all();
        } else {
            self.load_dependencies();
        }
    }

    fn index_extraction(&mut self, uri: Url, extraction: Extraction) {
        let includes = effective_includes(self.index.config(), &extraction);
        let resolved = self
            .index
            .update_file(uri.clone(), extraction.symbols.clone(), &includes);
        self.files.insert(uri, IndexedFile { extraction, resolved });
    }

    /// Apply the result of [`scan_workspace`]. Every base name is registered
    /// before any include is resolved. Files open in the editor keep their
    /// in-memory text.
    pub fn apply_workspace_scan(&mut self, scanned: Vec<(Url, Extraction)>) {
        for (uri, _) in &scanned {
            self.index.documents_mut().register(uri.clone());
        }
        let mut indexed = 0;
        for (uri, extraction) in scanned {
            if self.documents.contains_key(&uri) {
                continue;
            }
            self.files.insert(
                uri,
                IndexedFile {
                    extraction,
                    resolved: Vec::new(),
                },
            );
            indexed += 1;
        }
        self.reresolve_all();
        log::info!("Indexed {} workspace files", indexed);
    }

    /// Rebuild every table from its stored extraction under the current
    /// registry and configuration
    pub fn reresolve_all(&mut self) {
        let locations: Vec<Url> = self.files.keys().cloned().collect();
        for location in locations {
            let Some(file) = self.files.get(&location) else {
                continue;
            };
            let includes = effective_includes(self.index.config(), &file.extraction);
            let symbols = file.extraction.symbols.clone();
            let resolved = self.index.update_file(location.clone(), symbols, &includes);
            if let Some(file) = self.files.get_mut(&location) {
                file.resolved = resolved;
            }
        }
        self.load_dependencies();
    }

    /// Index files reached only through include directories or the main
    /// path. They are read from disk once and are not registered, so they
    /// never shadow workspace files of the same base name.
    fn load_dependencies(&mut self) {
        let mut attempted: HashSet<Url> = HashSet::new();
        loop {
            let mut pending: Vec<Url> = self
                .files
                .values()
                .flat_map(|file| file.resolved.iter().map(|(_, edge)| edge))
                .filter(|edge| !edge.is_unresolved())
                .map(|edge| edge.target.clone())
                .collect();
            if let Ok(Some(main_path)) = self.index.config().resolve_main_path() {
                pending.extend(path_to_uri(&main_path));
            }
            pending.retain(|uri| !self.files.contains_key(uri) && attempted.insert(uri.clone()));
            if pending.is_empty() {
                return;
            }

            for uri in pending {
                let text = uri.to_file_path().ok().and_then(|path| fs::read_to_string(path).ok());
                let Some(text) = text else {
                    log::warn!("Failed to read include dependency {}", uri);
                    continue;
                };
                log::trace!("Indexing include dependency {}", uri);
                let extraction = self.extractor.extract(&uri, &text);
                self.index_extraction(uri, extraction);
            }
        }
    }

    /// Text of a line in an open document
    pub fn line_text(&self, uri: &Url, line: u32) -> Option<String> {
        self.documents.get(uri)?.line(line)
    }

    /// Quoted, non-`#tryinclude` includes of `uri` that fell back to the
    /// builtin placeholder
    pub fn unresolved_includes(&self, uri: &Url) -> Vec<&RawInclude> {
        self.files
            .get(uri)
            .map(|file| {
                file.resolved
                    .iter()
                    .filter(|(raw, edge)| !raw.is_builtin && !raw.is_try && edge.is_unresolved())
                    .map(|(raw, _)| raw)
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn effective_includes(config: &IndexConfig, extraction: &Extraction) -> Vec<RawInclude> {
    let mut includes = Vec::with_capacity(extraction.includes.len() + 1);
    if config.implicit_sourcemod_include {
        includes.push(RawInclude::implicit_sourcemod());
    }
    includes.extend(extraction.includes.iter().cloned());
    includes
}

fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("sp") || ext.eq_ignore_ascii_case("inc"))
}

/// Scan workspace folders for SourcePawn files without holding any locks.
///
/// Returns one extraction per `.sp`/`.inc` file. Includes are not resolved
/// here; see [`WorldState::apply_workspace_scan`].
pub fn scan_workspace(folders: &[Url], extractor: &dyn SymbolExtractor) -> Vec<(Url, Extraction)> {
    let mut scanned = Vec::new();

    for folder in folders {
        log::info!("Scanning folder: {}", folder);
        let Ok(root) = folder.to_file_path() else {
            log::warn!("Skipping non-file workspace folder {}", folder);
            continue;
        };

        for entry in WalkDir::new(&root).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() || !is_source_file(entry.path()) {
                continue;
            }
            let Some(uri) = path_to_uri(entry.path()) else {
                continue;
            };
            match fs::read_to_string(entry.path()) {
                Ok(text) => {
                    log::trace!("Scanning file: {}", uri);
                    let extraction = extractor.extract(&uri, &text);
                    scanned.push((uri, extraction));
                }
                Err(e) => log::warn!("Failed to read {}: {}", entry.path().display(), e),
            }
        }
    }

    log::info!("Scanned {} workspace files", scanned.len());
    scanned
}
