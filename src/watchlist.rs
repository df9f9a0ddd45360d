// src/watchlist.rs
//! In-memory ordered watchlist. Always holds at least one entry and no
//! duplicate symbols.

use crate::types::{AssetType, WatchlistEntry};

pub const CRYPTO_SUFFIX: &str = "-USD";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WatchlistError {
    #[error("{0} is already in your watchlist")]
    DuplicateAsset(String),
    #[error("you must have at least one asset in your watchlist")]
    WatchlistEmpty,
    #[error("symbol is required")]
    EmptySymbol,
    #[error("{0} is not in your watchlist")]
    NotFound(String),
}

/// Uppercase the ticker and append the crypto currency suffix when missing.
pub fn normalize_symbol(raw: &str, kind: AssetType) -> String {
    let upper = raw.trim().to_ascii_uppercase();
    match kind {
        AssetType::Crypto if !upper.contains(CRYPTO_SUFFIX) => format!("{upper}{CRYPTO_SUFFIX}"),
        _ => upper,
    }
}

pub fn default_entries() -> Vec<WatchlistEntry> {
    vec![
        WatchlistEntry::new("AAPL", "Apple Inc.", AssetType::Stock),
        WatchlistEntry::new("TSLA", "Tesla Inc.", AssetType::Stock),
        WatchlistEntry::new("GOOGL", "Alphabet Inc.", AssetType::Stock),
        WatchlistEntry::new("MSFT", "Microsoft Corp.", AssetType::Stock),
        WatchlistEntry::new("NVDA", "NVIDIA Corp.", AssetType::Stock),
        WatchlistEntry::new("BTC-USD", "Bitcoin", AssetType::Crypto),
        WatchlistEntry::new("ETH-USD", "Ethereum", AssetType::Crypto),
        WatchlistEntry::new("SOL-USD", "Solana", AssetType::Crypto),
    ]
}

#[derive(Debug, Clone)]
pub struct WatchlistStore {
    entries: Vec<WatchlistEntry>,
}

impl WatchlistStore {
    /// Build from a seed list. Seeds are normalized and de-duplicated; an
    /// empty seed falls back to the default list.
    pub fn new(seed: Vec<WatchlistEntry>) -> Self {
        let mut store = Self {
            entries: Vec::with_capacity(seed.len()),
        };
        for e in seed {
            let name = (!e.name.trim().is_empty()).then_some(e.name.as_str());
            if let Err(err) = store.add(&e.symbol, name, e.kind) {
                tracing::warn!(target: "watchlist", error = %err, "skipping seed entry");
            }
        }
        if store.entries.is_empty() {
            store.entries = default_entries();
        }
        store
    }

    pub fn with_defaults() -> Self {
        Self {
            entries: default_entries(),
        }
    }

    pub fn entries(&self) -> &[WatchlistEntry] {
        &self.entries
    }

    pub fn snapshot(&self) -> Vec<WatchlistEntry> {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.get(symbol).is_some()
    }

    pub fn get(&self, symbol: &str) -> Option<&WatchlistEntry> {
        self.entries.iter().find(|e| e.symbol == symbol)
    }

    /// Append a new entry. Blank `name` defaults to the normalized symbol.
    pub fn add(
        &mut self,
        symbol: &str,
        name: Option<&str>,
        kind: AssetType,
    ) -> Result<WatchlistEntry, WatchlistError> {
        if symbol.trim().is_empty() {
            return Err(WatchlistError::EmptySymbol);
        }
        let symbol = normalize_symbol(symbol, kind);
        if self.contains(&symbol) {
            return Err(WatchlistError::DuplicateAsset(symbol));
        }
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| symbol.clone());

        let entry = WatchlistEntry::new(symbol, name, kind);
        self.entries.push(entry.clone());
        Ok(entry)
    }

    /// Remove by exact (normalized) symbol; refuses to empty the list.
    pub fn remove(&mut self, symbol: &str) -> Result<WatchlistEntry, WatchlistError> {
        if self.entries.len() <= 1 {
            return Err(WatchlistError::WatchlistEmpty);
        }
        let idx = self
            .entries
            .iter()
            .position(|e| e.symbol == symbol)
            .ok_or_else(|| WatchlistError::NotFound(symbol.to_string()))?;
        Ok(self.entries.remove(idx))
    }
}

impl Default for WatchlistStore {
    fn default() -> Self {
        Self::with_defaults()
    }
}
