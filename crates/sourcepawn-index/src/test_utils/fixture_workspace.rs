//! Deterministic fixture workspace generator for benchmarks and tests.
//!
//! Generates synthetic SourcePawn workspaces with controlled characteristics:
//! header count, functions per header, `#include` chains, defines and extra
//! global declarations. Every workspace also has a `plugin.sp` entry file that
//! includes the head of the chain.
//!
//! All output is deterministic, so benchmarks are reproducible.

use std::fmt::Write;
use std::path::Path;
use tempfile::TempDir;

/// Name of the entry file written into every fixture workspace
pub const PLUGIN_FILE: &str = "plugin.sp";

/// Configuration for generating a fixture workspace.
#[derive(Debug, Clone)]
pub struct FixtureConfig {
    pub file_count: usize,
    pub functions_per_file: usize,
    pub include_chain_depth: usize,
    pub defines_per_file: usize,
    pub extra_lines_per_file: usize,
}

/// Standard-library headers pulled in deterministically by generated files.
const BUILTIN_HEADERS: &[&str] = &["sdktools", "sdkhooks", "clientprefs", "cstrike", "regex"];

impl FixtureConfig {
    /// Small workspace: 10 headers, 5 functions each, include chain depth 3.
    pub fn small() -> Self {
        Self {
            file_count: 10,
            functions_per_file: 5,
            include_chain_depth: 3,
            defines_per_file: 2,
            extra_lines_per_file: 5,
        }
    }

    /// Medium workspace: 50 headers, 10 functions each, include chain depth 10.
    pub fn medium() -> Self {
        Self {
            file_count: 50,
            functions_per_file: 10,
            include_chain_depth: 10,
            defines_per_file: 4,
            extra_lines_per_file: 10,
        }
    }

    /// Large workspace: 200 headers, 20 functions each, include chain depth 50.
    pub fn large() -> Self {
        Self {
            file_count: 200,
            functions_per_file: 20,
            include_chain_depth: 50,
            defines_per_file: 8,
            extra_lines_per_file: 20,
        }
    }
}

/// File name of the `index`-th generated header
pub fn header_file_name(index: usize) -> String {
    format!("file_{}.inc", index)
}

/// Generate the content of a single header deterministically.
///
/// - `index`: header index (0-based), used for naming and include chain linkage
/// - `config`: the workspace configuration
fn generate_header_content(index: usize, config: &FixtureConfig) -> String {
    let mut content = String::new();

    writeln!(content, "#include <{}>", BUILTIN_HEADERS[index % BUILTIN_HEADERS.len()]).unwrap();

    // Include chain: file_0 includes file_1, file_1 includes file_2, etc.
    if index < config.include_chain_depth && index + 1 < config.file_count {
        writeln!(content, "#include \"file_{}\"", index + 1).unwrap();
    }
    content.push('\n');

    for define_i in 0..config.defines_per_file {
        writeln!(content, "#define FILE_{}_LIMIT_{} {}", index, define_i, define_i * 8).unwrap();
    }
    content.push('\n');

    for func_i in 0..config.functions_per_file {
        writeln!(content, "/**").unwrap();
        writeln!(content, " * Generated helper {} of file {}.", func_i, index).unwrap();
        writeln!(content, " */").unwrap();
        writeln!(
            content,
            "stock int Func_{}_{}(int x, int y = {})",
            index,
            func_i,
            func_i + 1
        )
        .unwrap();
        writeln!(content, "{{").unwrap();
        writeln!(content, "    int result = x + y * {};", func_i + 1).unwrap();
        writeln!(content, "    if (result < 0) {{").unwrap();
        writeln!(content, "        return 0;").unwrap();
        writeln!(content, "    }}").unwrap();
        writeln!(content, "    return result;").unwrap();
        writeln!(content, "}}").unwrap();
        content.push('\n');
    }

    writeln!(content, "methodmap Handle_{} < Handle", index).unwrap();
    writeln!(content, "{{").unwrap();
    writeln!(content, "    public native void Close_{}();", index).unwrap();
    writeln!(content, "}}").unwrap();
    content.push('\n');

    for line_i in 0..config.extra_lines_per_file {
        writeln!(content, "int g_Var_{}_{} = {};", index, line_i, line_i + 1).unwrap();
    }

    content
}

fn generate_plugin_content(config: &FixtureConfig) -> String {
    let mut content = String::new();
    if config.file_count > 0 {
        writeln!(content, "#include \"file_0\"").unwrap();
    }
    content.push_str("\npublic void OnPluginStart()\n{\n}\n");
    content
}

/// Create a temporary fixture workspace from the given configuration.
///
/// Returns a `TempDir` whose path contains the generated `.inc` headers and
/// `plugin.sp`. The directory is cleaned up when the `TempDir` is dropped.
///
/// Calling this twice with the same `FixtureConfig` produces byte-identical files.
pub fn create_fixture_workspace(config: &FixtureConfig) -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp directory for fixture workspace");
    write_fixture_workspace(temp_dir.path(), config);
    temp_dir
}

/// Write fixture files into an existing directory.
pub fn write_fixture_workspace(dir: &Path, config: &FixtureConfig) {
    for i in 0..config.file_count {
        let content = generate_header_content(i, config);
        let filename = header_file_name(i);
        std::fs::write(dir.join(&filename), &content)
            .unwrap_or_else(|e| panic!("Failed to write fixture file {}: {}", filename, e));
    }
    std::fs::write(dir.join(PLUGIN_FILE), generate_plugin_content(config))
        .unwrap_or_else(|e| panic!("Failed to write fixture file {}: {}", PLUGIN_FILE, e));
}
