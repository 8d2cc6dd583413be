//
// cross_file/property_tests.rs
//
// Property-based tests for the completion index
//

#![cfg(test)]

use proptest::prelude::*;

use tower_lsp::lsp_types::Url;

use super::directive::parse_includes;
use super::include::{infer_extension, IncludeEdge};
use super::index::CompletionIndex;
use super::symbols::{FileSymbolTable, SymbolKind, SymbolRecord};
use super::IndexConfig;

// ============================================================================
// Generators
// ============================================================================

fn file_url(index: usize) -> Url {
    Url::parse(&format!("file:///project/file_{}.inc", index)).unwrap()
}

/// Random include graphs over `0..node_count`, cycles and self-loops included.
/// Each entry is the adjacency list of one file.
fn include_graph() -> impl Strategy<Value = Vec<Vec<usize>>> {
    (1..12usize).prop_flat_map(|node_count| {
        prop::collection::vec(prop::collection::vec(0..node_count, 0..4), node_count)
    })
}

fn index_from_graph(graph: &[Vec<usize>]) -> CompletionIndex {
    let mut index = CompletionIndex::new(IndexConfig::default());
    for (node, targets) in graph.iter().enumerate() {
        let location = file_url(node);
        let symbols = vec![SymbolRecord::new(format!("Sym_{}", node), SymbolKind::Function)];
        let edges = targets
            .iter()
            .map(|&t| IncludeEdge {
                target: file_url(t),
                is_builtin: false,
            })
            .collect();
        index.insert_table(FileSymbolTable::new(location, symbols, edges));
    }
    index
}

/// Nodes reachable from `start` through at least one edge
fn reachable(graph: &[Vec<usize>], start: usize) -> Vec<bool> {
    let mut seen = vec![false; graph.len()];
    let mut stack: Vec<usize> = graph[start].clone();
    while let Some(node) = stack.pop() {
        if !seen[node] {
            seen[node] = true;
            stack.extend(graph[node].iter().copied());
        }
    }
    seen
}

fn symbol_kind() -> impl Strategy<Value = SymbolKind> {
    prop_oneof![
        Just(SymbolKind::Function),
        Just(SymbolKind::Method),
        Just(SymbolKind::Property),
        Just(SymbolKind::Constant),
        Just(SymbolKind::Variable),
        Just(SymbolKind::Enum),
        Just(SymbolKind::EnumMember),
        Just(SymbolKind::Methodmap),
        Just(SymbolKind::Typedef),
    ]
}

fn identifier() -> impl Strategy<Value = String> {
    "[A-Za-z_][A-Za-z0-9_]{0,8}"
}

// ============================================================================
// Visibility
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Traversal terminates on any graph and visits every reachable file
    /// exactly once, plus the requesting file.
    #[test]
    fn prop_visibility_matches_reachability(graph in include_graph(), start_seed in any::<prop::sample::Index>()) {
        let start = start_seed.index(graph.len());
        let index = index_from_graph(&graph);
        let visible = index.visible_files(&file_url(start)).unwrap();

        let mut expected = reachable(&graph, start);
        expected[start] = true;
        let expected_count = expected.iter().filter(|&&v| v).count();

        prop_assert_eq!(visible.len(), expected_count);
        for (node, is_reachable) in expected.iter().enumerate() {
            prop_assert_eq!(visible.contains(&file_url(node)), *is_reachable);
        }
    }

    /// A file always sees its own declarations.
    #[test]
    fn prop_self_visibility(graph in include_graph(), start_seed in any::<prop::sample::Index>()) {
        let start = start_seed.index(graph.len());
        let index = index_from_graph(&graph);
        let own = format!("Sym_{}", start);
        let names: Vec<String> = index
            .all_completions(&file_url(start))
            .unwrap()
            .into_iter()
            .map(|s| s.name.clone())
            .collect();
        prop_assert!(names.contains(&own));
    }

    /// Each visible file contributes its symbols once, so the completion
    /// count equals the number of visible files here.
    #[test]
    fn prop_no_file_contributes_twice(graph in include_graph(), start_seed in any::<prop::sample::Index>()) {
        let start = start_seed.index(graph.len());
        let index = index_from_graph(&graph);
        let visible = index.visible_files(&file_url(start)).unwrap();
        let completions = index.all_completions(&file_url(start)).unwrap();
        prop_assert_eq!(completions.len(), visible.len());
    }
}

// ============================================================================
// Context filtering
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Member-access and free-standing completions partition the visible
    /// symbols by kind.
    #[test]
    fn prop_context_filter_partitions(symbols in prop::collection::vec((identifier(), symbol_kind()), 0..20)) {
        let location = file_url(0);
        let mut index = CompletionIndex::new(IndexConfig::default());
        let records: Vec<SymbolRecord> = symbols
            .iter()
            .map(|(name, kind)| SymbolRecord::new(name.clone(), *kind))
            .collect();
        index.insert_table(FileSymbolTable::new(location.clone(), records, Vec::new()));

        let all = index.all_completions(&location).unwrap();
        let members = index.completions_at(&location, "obj.", 4).unwrap();
        let free = index.completions_at(&location, "x", 1).unwrap();

        prop_assert!(members.iter().all(|s| s.kind.is_member()));
        prop_assert!(free.iter().all(|s| !s.kind.is_member()));
        prop_assert_eq!(members.len() + free.len(), all.len());
    }
}

// ============================================================================
// Include references
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Inferred references always end in `.sp` or `.inc`, and inference is
    /// idempotent.
    #[test]
    fn prop_infer_extension_idempotent(reference in "[a-z][a-z0-9_/]{0,12}(\\.(sp|inc|txt))?") {
        let inferred = infer_extension(&reference);
        prop_assert!(inferred.ends_with(".sp") || inferred.ends_with(".inc"));
        prop_assert_eq!(infer_extension(&inferred), inferred.clone());
    }

    /// Every well-formed directive yields exactly one include with the
    /// written reference and form.
    #[test]
    fn prop_directive_roundtrip(name in "[a-z][a-z0-9_]{0,10}", chevron in any::<bool>(), try_form in any::<bool>()) {
        let directive = if try_form { "tryinclude" } else { "include" };
        let line = if chevron {
            format!("#{} <{}>", directive, name)
        } else {
            format!("#{} \"{}\"", directive, name)
        };
        let includes = parse_includes(&line);
        prop_assert_eq!(includes.len(), 1);
        prop_assert_eq!(&includes[0].reference, &name);
        prop_assert_eq!(includes[0].is_builtin, chevron);
        prop_assert_eq!(includes[0].is_try, try_form);
    }
}
