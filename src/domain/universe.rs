//! Instrument universes: a named market resolved to an ordered symbol list.

use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Universe {
    pub market: String,
    pub symbols: Vec<String>,
}

impl Universe {
    pub fn new(market: impl Into<String>, symbols: Vec<String>) -> Self {
        Self {
            market: market.into(),
            symbols,
        }
    }

    pub fn count(&self) -> usize {
        self.symbols.len()
    }

    /// Keep only the first `limit` symbols.
    pub fn truncated(mut self, limit: usize) -> Self {
        self.symbols.truncate(limit);
        self
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),
}

/// Parse a comma separated symbol list, uppercasing and rejecting duplicates.
pub fn parse_symbols(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let symbol = trimmed.to_uppercase();
        if !seen.insert(symbol.clone()) {
            return Err(UniverseError::DuplicateSymbol(symbol));
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}

/// Canonical ticker form: trimmed, uppercase, share-class dot as dash (`BRK.B` -> `BRK-B`).
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase().replace('.', "-")
}

/// Drop repeated symbols while keeping first-seen order.
pub fn dedup_symbols(symbols: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    symbols
        .into_iter()
        .filter(|s| seen.insert(s.clone()))
        .collect()
}
