//
// scope/cache.rs
//
// Per-session cache of function symbols, keyed by document URI
//

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tower_lsp::lsp_types::Url;

use super::symbols::FunctionSymbol;

/// Function symbols per document, valid for one debug session.
///
/// Entries are never refreshed while a session runs: edits made while the
/// debugger is paused are ignored until `clear` is called at session end.
/// A read-then-write race between two requests only recomputes the same
/// list, so reads and writes take the lock separately.
#[derive(Debug, Default)]
pub struct FunctionCache {
    inner: RwLock<HashMap<Url, Arc<Vec<FunctionSymbol>>>>,
}

impl FunctionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, uri: &Url) -> Option<Arc<Vec<FunctionSymbol>>> {
        self.inner.read().ok()?.get(uri).cloned()
    }

    pub fn insert(&self, uri: Url, functions: Arc<Vec<FunctionSymbol>>) {
        if let Ok(mut guard) = self.inner.write() {
            guard.insert(uri, functions);
        }
    }

    /// Drop every entry. Returns how many documents were cached.
    pub fn clear(&self) -> usize {
        if let Ok(mut guard) = self.inner.write() {
            let count = guard.len();
            guard.clear();
            count
        } else {
            0
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
