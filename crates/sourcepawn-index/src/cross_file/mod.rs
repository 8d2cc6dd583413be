//
// cross_file/mod.rs
//
// Cross-file completion index: include resolution, per-file symbol tables and
// include-graph visibility
//

pub mod config;
pub mod directive;
pub mod error;
pub mod include;
pub mod index;
pub mod registry;
pub mod symbols;

#[cfg(test)]
mod property_tests;

pub use config::IndexConfig;
pub use directive::{parse_includes, RawInclude};
pub use error::IndexError;
pub use include::{
    base_name, builtin_location, infer_extension, is_builtin_location, path_to_uri,
    resolve_include, strip_include_prefix, IncludeEdge, BUILTIN_NAMESPACE,
};
pub use index::{CompletionIndex, SignatureHelpState};
pub use registry::DocumentRegistry;
pub use symbols::{FileSymbolTable, ParameterInfo, Signature, SymbolKind, SymbolRecord};
