//
// cross_file/config.rs
//
// Configuration for cross-file awareness
//

use std::env;
use std::path::PathBuf;

use serde::Deserialize;

use super::error::IndexError;
use super::include::normalize_path;

/// Snapshot of everything include resolution and visibility depend on.
///
/// Held by the completion index and consulted only at the entry of a
/// traversal, so queries are pure given the snapshot and the tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexConfig {
    /// Optional include directories, searched in order
    pub include_directories: Vec<PathBuf>,
    /// Entry file of the plugin; its include closure is visible everywhere
    pub main_path: Option<PathBuf>,
    /// Workspace roots, first one used for relative paths
    pub workspace_roots: Vec<PathBuf>,
    /// Every file implicitly includes `<sourcemod>`
    pub implicit_sourcemod_include: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            include_directories: Vec::new(),
            main_path: None,
            workspace_roots: Vec::new(),
            implicit_sourcemod_include: true,
        }
    }
}

/// `sourcepawn` settings section as sent by the client
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SettingsSection {
    #[serde(alias = "optionalIncludeDirsPaths")]
    include_directories: Option<Vec<String>>,
    main_path: Option<String>,
    implicit_sourcemod_include: Option<bool>,
}

impl IndexConfig {
    /// Apply client settings on top of this configuration.
    ///
    /// Reads the `sourcepawn` section of `settings`; keys that are absent keep
    /// their current value. An empty `mainPath` clears the main path. Returns
    /// `false` when the section is missing or malformed.
    pub fn apply_settings(&mut self, settings: &serde_json::Value) -> bool {
        let Some(section) = settings.get("sourcepawn") else {
            return false;
        };
        let parsed: SettingsSection = match serde_json::from_value(section.clone()) {
            Ok(parsed) => parsed,
            Err(e) => {
                log::warn!("Ignoring malformed sourcepawn settings: {}", e);
                return false;
            }
        };

        if let Some(dirs) = parsed.include_directories {
            self.include_directories = dirs
                .iter()
                .filter(|d| !d.trim().is_empty())
                .map(|d| self.absolutize(d.trim()))
                .collect();
        }
        if let Some(main_path) = parsed.main_path {
            let main_path = main_path.trim();
            self.main_path = (!main_path.is_empty()).then(|| PathBuf::from(main_path));
        }
        if let Some(implicit) = parsed.implicit_sourcemod_include {
            self.implicit_sourcemod_include = implicit;
        }

        log::info!("sourcepawn configuration:");
        log::info!("  include_directories: {:?}", self.include_directories);
        log::info!("  main_path: {:?}", self.main_path);
        log::info!("  implicit_sourcemod_include: {}", self.implicit_sourcemod_include);
        true
    }

    /// Whether include edges resolved under `other` could differ from `self`
    pub fn include_settings_changed(&self, other: &Self) -> bool {
        self.include_directories != other.include_directories
            || self.implicit_sourcemod_include != other.implicit_sourcemod_include
    }

    fn absolutize(&self, dir: &str) -> PathBuf {
        let path = PathBuf::from(dir);
        if path.is_absolute() {
            return path;
        }
        match self.workspace_roots.first() {
            Some(root) => normalize_path(&root.join(&path)).unwrap_or(path),
            None => {
                log::warn!(
                    "Include directory '{}' is relative and no workspace root is known",
                    dir
                );
                path
            }
        }
    }

    /// Resolve the configured main path to an existing absolute file.
    ///
    /// Tries the value as given (relative values against the process working
    /// directory), then joined onto the first workspace root.
    /// Returns `Ok(None)` when no main path is configured and
    /// `Err(MainPathNotFound)` when one is configured but missing on disk.
    pub fn resolve_main_path(&self) -> Result<Option<PathBuf>, IndexError> {
        let Some(main_path) = &self.main_path else {
            return Ok(None);
        };

        if main_path.exists() {
            let absolute = if main_path.is_absolute() {
                main_path.clone()
            } else {
                env::current_dir()
                    .map(|cwd| cwd.join(main_path))
                    .unwrap_or_else(|_| main_path.clone())
            };
            return Ok(normalize_path(&absolute));
        }

        let workspace_root = self.workspace_roots.first();
        if let Some(root) = workspace_root {
            let joined = root.join(main_path);
            if joined.exists() {
                return Ok(normalize_path(&joined));
            }
        }

        Err(IndexError::MainPathNotFound {
            path: main_path.clone(),
            workspace_root: workspace_root.cloned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_default_values() {
        let config = IndexConfig::default();
        assert!(config.include_directories.is_empty());
        assert!(config.main_path.is_none());
        assert!(config.workspace_roots.is_empty());
        assert!(config.implicit_sourcemod_include);
    }

    #[test]
    fn test_apply_settings() {
        let mut config = IndexConfig {
            workspace_roots: vec![PathBuf::from("/project")],
            ..Default::default()
        };
        let applied = config.apply_settings(&json!({
            "sourcepawn": {
                "includeDirectories": ["/opt/sm/include", "vendor/include", "  "],
                "mainPath": "scripting/plugin.sp",
                "implicitSourcemodInclude": false
            }
        }));

        assert!(applied);
        assert_eq!(
            config.include_directories,
            vec![
                PathBuf::from("/opt/sm/include"),
                PathBuf::from("/project/vendor/include")
            ]
        );
        assert_eq!(config.main_path, Some(PathBuf::from("scripting/plugin.sp")));
        assert!(!config.implicit_sourcemod_include);
    }

    #[test]
    fn test_apply_settings_legacy_key_and_absent_fields() {
        let mut config = IndexConfig {
            main_path: Some(PathBuf::from("main.sp")),
            ..Default::default()
        };
        config.apply_settings(&json!({
            "sourcepawn": { "optionalIncludeDirsPaths": ["/inc"] }
        }));
        assert_eq!(config.include_directories, vec![PathBuf::from("/inc")]);
        assert_eq!(config.main_path, Some(PathBuf::from("main.sp")));
        assert!(config.implicit_sourcemod_include);
    }

    #[test]
    fn test_apply_settings_empty_main_path_clears() {
        let mut config = IndexConfig {
            main_path: Some(PathBuf::from("main.sp")),
            ..Default::default()
        };
        config.apply_settings(&json!({ "sourcepawn": { "mainPath": "" } }));
        assert!(config.main_path.is_none());
    }

    #[test]
    fn test_apply_settings_missing_or_malformed_section() {
        let mut config = IndexConfig::default();
        assert!(!config.apply_settings(&json!({ "other": {} })));
        assert!(!config.apply_settings(&json!({ "sourcepawn": { "mainPath": 3 } })));
        assert_eq!(config, IndexConfig::default());
    }

    #[test]
    fn test_include_settings_changed() {
        let base = IndexConfig::default();
        let mut other = IndexConfig::default();
        assert!(!base.include_settings_changed(&other));

        other.main_path = Some(PathBuf::from("main.sp"));
        assert!(!base.include_settings_changed(&other));

        other.include_directories.push(PathBuf::from("/inc"));
        assert!(base.include_settings_changed(&other));
    }

    #[test]
    fn test_resolve_main_path_unset() {
        assert_eq!(IndexConfig::default().resolve_main_path().unwrap(), None);
    }

    #[test]
    fn test_resolve_main_path_absolute_and_workspace_relative() {
        let root = TempDir::new().unwrap();
        let main = root.path().join("scripting").join("plugin.sp");
        std::fs::create_dir_all(main.parent().unwrap()).unwrap();
        std::fs::write(&main, "").unwrap();

        let absolute = IndexConfig {
            main_path: Some(main.clone()),
            ..Default::default()
        };
        assert_eq!(absolute.resolve_main_path().unwrap(), Some(main.clone()));

        let relative = IndexConfig {
            main_path: Some(PathBuf::from("scripting/plugin.sp")),
            workspace_roots: vec![root.path().to_path_buf()],
            ..Default::default()
        };
        assert_eq!(relative.resolve_main_path().unwrap(), Some(main));
    }

    #[test]
    fn test_resolve_main_path_relative_to_working_directory() {
        // Tests run from the package root, which holds Cargo.toml
        let root = TempDir::new().unwrap();
        let config = IndexConfig {
            main_path: Some(PathBuf::from("Cargo.toml")),
            workspace_roots: vec![root.path().to_path_buf()],
            ..Default::default()
        };
        let resolved = config.resolve_main_path().unwrap().unwrap();
        assert!(resolved.is_absolute());
        assert_eq!(resolved, env::current_dir().unwrap().join("Cargo.toml"));
    }

    #[test]
    fn test_resolve_main_path_missing_is_error() {
        let root = TempDir::new().unwrap();
        let config = IndexConfig {
            main_path: Some(PathBuf::from("missing.sp")),
            workspace_roots: vec![root.path().to_path_buf()],
            ..Default::default()
        };
        match config.resolve_main_path() {
            Err(IndexError::MainPathNotFound { path, workspace_root }) => {
                assert_eq!(path, PathBuf::from("missing.sp"));
                assert_eq!(workspace_root, Some(root.path().to_path_buf()));
            }
            other => panic!("expected MainPathNotFound, got {:?}", other),
        }
    }
}
