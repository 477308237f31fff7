//
// scope/resolver.rs
//
// Decides which lines of a document are in scope for a stopped location
//

use std::collections::HashSet;
use std::sync::Arc;

use tower_lsp::lsp_types::{Range, Url};

use super::cache::FunctionCache;
use super::symbols::{collect_functions, FunctionSymbol, SymbolSource};
use crate::config::ScopePolicy;

/// Scope resolution over the function symbols of a document.
///
/// The symbol source is queried at most once per document until the shared
/// `FunctionCache` is cleared; everything else is recomputed per request.
pub struct ScopeResolver<S> {
    source: S,
    cache: Arc<FunctionCache>,
}

impl<S: SymbolSource> ScopeResolver<S> {
    pub fn new(source: S, cache: Arc<FunctionCache>) -> Self {
        Self { source, cache }
    }

    /// All functions in the document, flattened in pre-order.
    ///
    /// Served from the cache when present. Otherwise the symbol source is
    /// queried and the result cached; a document without symbols caches an
    /// empty list. A failing query is logged, treated as empty and not
    /// cached, so the next request asks again.
    pub async fn functions_in_document(&self, uri: &Url) -> Arc<Vec<FunctionSymbol>> {
        if let Some(cached) = self.cache.get(uri) {
            return cached;
        }

        let functions = match self.source.document_symbols(uri).await {
            Ok(Some(symbols)) => Arc::new(collect_functions(&symbols)),
            Ok(None) => {
                log::trace!("No symbols for {}", uri);
                Arc::new(Vec::new())
            }
            Err(e) => {
                log::warn!("Symbol query failed for {}: {}", uri, e);
                return Arc::new(Vec::new());
            }
        };

        log::trace!("Caching {} functions for {}", functions.len(), uri);
        self.cache.insert(uri.clone(), functions.clone());
        functions
    }

    /// Drop every cached function list. Call when a debug session ends.
    pub fn clear_function_cache(&self) {
        let count = self.cache.clear();
        log::info!("Cleared function cache ({} documents)", count);
    }

    /// Functions whose range contains the stopped location, outermost first.
    pub async fn functions_in_scope(&self, uri: &Url, stopped: &Range) -> Vec<FunctionSymbol> {
        let functions = self.functions_in_document(uri).await;
        select_functions_in_scope(&functions, stopped)
            .into_iter()
            .cloned()
            .collect()
    }

    /// First line to search: 0 for `ScopePolicy::Document`, otherwise the
    /// start of the innermost function containing the stopped location.
    pub async fn start_line(&self, uri: &Url, policy: ScopePolicy, stopped: &Range) -> u32 {
        match policy {
            ScopePolicy::Document => 0,
            ScopePolicy::CurrentFunction => {
                let functions = self.functions_in_document(uri).await;
                select_functions_in_scope(&functions, stopped)
                    .iter()
                    .map(|f| f.start_line())
                    .max()
                    .unwrap_or(0)
            }
        }
    }

    /// Lines belonging to functions that do not contain the stopped location.
    pub async fn excluded_lines(&self, uri: &Url, stopped: &Range, start_line: u32) -> HashSet<u32> {
        let functions = self.functions_in_document(uri).await;
        compute_excluded_lines(&functions, stopped, start_line)
    }
}

/// Functions whose line span covers the stopped lines and whose range
/// contains the stopped range.
pub fn select_functions_in_scope<'a>(
    functions: &'a [FunctionSymbol],
    stopped: &Range,
) -> Vec<&'a FunctionSymbol> {
    functions
        .iter()
        .filter(|f| {
            f.start_line() <= stopped.start.line
                && f.end_line() >= stopped.end.line
                && f.contains(stopped)
        })
        .collect()
}

/// Every line of each function that starts in `start_line..=stopped.end.line`
/// without containing the stopped range, minus the stopped lines themselves.
///
/// A function starting on the stopped end line is still a candidate.
pub fn compute_excluded_lines(
    functions: &[FunctionSymbol],
    stopped: &Range,
    start_line: u32,
) -> HashSet<u32> {
    let stopped_start = stopped.start.line;
    let stopped_end = stopped.end.line;
    let mut excluded = HashSet::new();

    for function in functions {
        let start = function.start_line();
        if start >= start_line && start <= stopped_end && !function.contains(stopped) {
            excluded.extend(start..=function.end_line());
        }
    }

    // The stopped statement is never hidden
    excluded.retain(|line| *line < stopped_start || *line > stopped_end);
    excluded
}
