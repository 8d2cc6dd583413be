//
// handlers.rs
//
// LSP request handlers: translate positions, query the completion index and
// build lsp_types responses
//

use tower_lsp::lsp_types::*;

use crate::completion_context::word_at;
use crate::cross_file::{IndexError, SymbolKind, SymbolRecord};
use crate::state::WorldState;
use crate::utf16::utf16_column_to_char_index;

/// Source tag attached to published diagnostics
pub const DIAGNOSTIC_SOURCE: &str = "sourcepawn-index";

/// Line text and char column for an LSP position in an open document
fn cursor(state: &WorldState, uri: &Url, position: Position) -> Option<(String, usize)> {
    let line = state.line_text(uri, position.line)?;
    let column = utf16_column_to_char_index(&line, position.character);
    Some((line, column))
}

fn completion_item_kind(kind: SymbolKind) -> CompletionItemKind {
    match kind {
        SymbolKind::Function => CompletionItemKind::FUNCTION,
        SymbolKind::Method => CompletionItemKind::METHOD,
        SymbolKind::Property => CompletionItemKind::PROPERTY,
        SymbolKind::Constant => CompletionItemKind::CONSTANT,
        SymbolKind::Variable => CompletionItemKind::VARIABLE,
        SymbolKind::Enum => CompletionItemKind::ENUM,
        SymbolKind::EnumMember => CompletionItemKind::ENUM_MEMBER,
        SymbolKind::Methodmap => CompletionItemKind::CLASS,
        SymbolKind::Typedef => CompletionItemKind::INTERFACE,
    }
}

fn markdown(value: String) -> MarkupContent {
    MarkupContent {
        kind: MarkupKind::Markdown,
        value,
    }
}

fn completion_item(symbol: &SymbolRecord) -> CompletionItem {
    CompletionItem {
        label: symbol.name.clone(),
        kind: Some(completion_item_kind(symbol.kind)),
        detail: Some(symbol.signature_label()),
        documentation: symbol
            .documentation
            .clone()
            .map(|doc| Documentation::MarkupContent(markdown(doc))),
        ..Default::default()
    }
}

// ============================================================================
// Completion
// ============================================================================

pub fn completion(
    state: &WorldState,
    uri: &Url,
    position: Position,
) -> Result<Option<CompletionResponse>, IndexError> {
    let Some((line, column)) = cursor(state, uri, position) else {
        return Ok(None);
    };
    let items: Vec<CompletionItem> = state
        .index
        .completions_at(uri, &line, column)?
        .into_iter()
        .map(completion_item)
        .collect();
    log::trace!("Completion at {}:{:?} -> {} items", uri, position, items.len());
    Ok(Some(CompletionResponse::Array(items)))
}

// ============================================================================
// Hover
// ============================================================================

pub fn hover(state: &WorldState, uri: &Url, position: Position) -> Result<Option<Hover>, IndexError> {
    let Some((line, column)) = cursor(state, uri, position) else {
        return Ok(None);
    };
    let Some(word) = word_at(&line, column) else {
        return Ok(None);
    };
    Ok(state.index.hover(uri, &word)?.map(|value| Hover {
        contents: HoverContents::Markup(markdown(value)),
        range: None,
    }))
}

// ============================================================================
// Signature Help
// ============================================================================

pub fn signature_help(
    state: &WorldState,
    uri: &Url,
    position: Position,
) -> Result<Option<SignatureHelp>, IndexError> {
    let Some((line, column)) = cursor(state, uri, position) else {
        return Ok(None);
    };
    let help = state.index.signature_help(uri, &line, column)?;
    let Some(symbol) = help.signature else {
        return Ok(None);
    };

    let parameters = symbol.signature.as_ref().map(|sig| {
        sig.parameters
            .iter()
            .map(|param| ParameterInformation {
                label: ParameterLabel::Simple(param.label()),
                documentation: None,
            })
            .collect()
    });

    Ok(Some(SignatureHelp {
        signatures: vec![SignatureInformation {
            label: symbol.signature_label(),
            documentation: symbol
                .documentation
                .clone()
                .map(|doc| Documentation::MarkupContent(markdown(doc))),
            parameters,
            active_parameter: Some(help.active_parameter),
        }],
        active_signature: Some(0),
        active_parameter: Some(help.active_parameter),
    }))
}

// ============================================================================
// Diagnostics
// ============================================================================

/// Warnings for project includes that could not be found
pub fn diagnostics(state: &WorldState, uri: &Url) -> Vec<Diagnostic> {
    state
        .unresolved_includes(uri)
        .into_iter()
        .map(|raw| {
            let end = state
                .line_text(uri, raw.line)
                .map_or(0, |text| text.encode_utf16().count() as u32);
            Diagnostic {
                range: Range {
                    start: Position::new(raw.line, 0),
                    end: Position::new(raw.line, end),
                },
                severity: Some(DiagnosticSeverity::WARNING),
                source: Some(DIAGNOSTIC_SOURCE.to_string()),
                message: format!("Include \"{}\" not found.", raw.reference),
                ..Default::default()
            }
        })
        .collect()
}
