//
// cross_file/registry.rs
//
// Base-name registry for resolving unqualified include references
//

use std::collections::HashMap;

use tower_lsp::lsp_types::Url;

use super::include::base_name;

/// Maps a file's base name (e.g. `"colors.inc"`) to its canonical location.
///
/// Populated as workspace files are discovered or opened. When two files
/// share a base name, the most recent registration wins.
#[derive(Debug, Default, Clone)]
pub struct DocumentRegistry {
    by_name: HashMap<String, Url>,
}

impl DocumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a location under its base name. Returns the location that
    /// previously held the name, if it was a different file.
    pub fn register(&mut self, location: Url) -> Option<Url> {
        let Some(name) = location_base_name(&location) else {
            log::trace!("Not registering {}: no base name", location);
            return None;
        };
        let previous = self.by_name.insert(name, location.clone());
        match previous {
            Some(prev) if prev != location => {
                log::trace!("Base name collision: {} replaces {}", location, prev);
                Some(prev)
            }
            _ => None,
        }
    }

    /// Remove a location; a newer file registered under the same name is kept.
    pub fn unregister(&mut self, location: &Url) {
        if let Some(name) = location_base_name(location) {
            if self.by_name.get(&name) == Some(location) {
                self.by_name.remove(&name);
            }
        }
    }

    pub fn resolve(&self, name: &str) -> Option<&Url> {
        self.by_name.get(name)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

fn location_base_name(location: &Url) -> Option<String> {
    let path = location.to_file_path().ok()?;
    let name = path.file_name()?.to_str()?;
    Some(base_name(name).to_string())
}
