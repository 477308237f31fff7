//
// scope/symbols.rs
//
// Function symbols and the source they are queried from
//

use async_trait::async_trait;
use tower_lsp::lsp_types::{DocumentSymbol, Position, Range, SymbolKind, Url};

/// A function known to the scope resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSymbol {
    pub name: String,
    /// Full extent of the definition, keyword through closing brace.
    pub range: Range,
}

impl FunctionSymbol {
    pub fn start_line(&self) -> u32 {
        self.range.start.line
    }

    pub fn end_line(&self) -> u32 {
        self.range.end.line
    }

    /// Whether this function's range fully contains `other`.
    pub fn contains(&self, other: &Range) -> bool {
        range_contains(&self.range, other)
    }
}

/// Provider of a document's symbol tree.
///
/// Implementations may be remote or slow; the resolver awaits the query and
/// caches the result per document. `Ok(None)` and `Err(_)` both mean that no
/// symbols are known.
#[async_trait]
pub trait SymbolSource: Send + Sync {
    async fn document_symbols(&self, uri: &Url) -> anyhow::Result<Option<Vec<DocumentSymbol>>>;
}

/// Lexicographic `(line, character)` comparison: `inner` starts no earlier
/// and ends no later than `outer`.
pub fn range_contains(outer: &Range, inner: &Range) -> bool {
    position_key(&inner.start) >= position_key(&outer.start)
        && position_key(&inner.end) <= position_key(&outer.end)
}

fn position_key(pos: &Position) -> (u32, u32) {
    (pos.line, pos.character)
}

/// Flatten a symbol tree in pre-order: each parent before its children,
/// siblings in their original order.
///
/// Uses an explicit stack so deeply nested trees cannot overflow the call
/// stack.
pub fn flatten_symbols(symbols: &[DocumentSymbol]) -> Vec<&DocumentSymbol> {
    let mut result = Vec::new();
    let mut stack: Vec<&DocumentSymbol> = symbols.iter().rev().collect();

    while let Some(symbol) = stack.pop() {
        result.push(symbol);
        if let Some(children) = &symbol.children {
            stack.extend(children.iter().rev());
        }
    }

    result
}

/// Flatten `symbols` and keep only functions.
pub fn collect_functions(symbols: &[DocumentSymbol]) -> Vec<FunctionSymbol> {
    flatten_symbols(symbols)
        .into_iter()
        .filter(|symbol| symbol.kind == SymbolKind::FUNCTION)
        .map(|symbol| FunctionSymbol {
            name: symbol.name.clone(),
            range: symbol.range,
        })
        .collect()
}
