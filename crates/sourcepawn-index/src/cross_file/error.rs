//
// cross_file/error.rs
//
// Errors surfaced by completion index queries
//

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// A main path is configured but exists neither as given nor under the
    /// first workspace root.
    #[error("Main path '{}' not found{}", .path.display(), workspace_hint(.workspace_root))]
    MainPathNotFound {
        path: PathBuf,
        workspace_root: Option<PathBuf>,
    },
}

fn workspace_hint(root: &Option<PathBuf>) -> String {
    match root {
        Some(root) => format!(" (also tried relative to '{}')", root.display()),
        None => String::new(),
    }
}
