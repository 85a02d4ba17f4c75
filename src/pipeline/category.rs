//! Category classification

use crate::types::{Category, SourceKind, SymbolSnapshot};

/// Majority vote over the resolved symbols. Ties go to stocks.
pub fn classify(symbols: &[SymbolSnapshot]) -> Category {
    let (crypto, stocks) = symbols
        .iter()
        .fold((0usize, 0usize), |(c, s), snapshot| match snapshot.source_kind {
            SourceKind::Crypto => (c + 1, s),
            SourceKind::Equity => (c, s + 1),
            SourceKind::Unresolved => (c, s),
        });

    match (crypto, stocks) {
        (0, 0) => Category::None,
        (c, s) if s >= c => Category::Stocks,
        _ => Category::Crypto,
    }
}
