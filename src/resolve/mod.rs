//! Mapping free-text company names and tickers to canonical symbols.
//!
//! Two strategies, tried in order: inputs that already look like a valid
//! ticker are accepted directly; everything else goes through the target's
//! own autocomplete control and a ranked candidate match.

mod interactive;

pub use interactive::{BrowserSymbolResolver, ResolverConfig};

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::core::NseError;

/// Longest symbol the target site issues.
const MAX_SYMBOL_LEN: usize = 20;

/// A user-supplied lookup, normalized once per request.
#[derive(Debug, Clone)]
pub struct SymbolQuery {
    /// The input exactly as supplied.
    pub raw: String,
    /// Trimmed and upper-cased form used for matching.
    pub normalized: String,
}

impl SymbolQuery {
    /// Builds a query from raw input.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let normalized = raw.trim().to_uppercase();
        Self { raw, normalized }
    }

    /// Whether the normalized input can be accepted as a ticker without
    /// touching the browser: alphanumeric plus `&`, `.`, `-`, bounded length.
    #[must_use]
    pub fn looks_like_symbol(&self) -> bool {
        !self.normalized.is_empty()
            && self.normalized.len() <= MAX_SYMBOL_LEN
            && self
                .normalized
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '&' | '.' | '-'))
    }
}

/// One autocomplete suggestion while resolving a query. Ranked, never persisted.
#[derive(Debug, Clone, Deserialize)]
pub struct SymbolCandidate {
    /// Full rendered text of the suggestion.
    #[serde(rename = "text")]
    pub display_text: String,
    /// Company-name part, when the suggestion markup separates it.
    #[serde(rename = "name", default)]
    pub company_name: String,
    /// Symbol part, when the suggestion markup separates it.
    #[serde(rename = "symbol", default)]
    pub symbol: String,
}

impl SymbolCandidate {
    /// Parses a `"Company Name | SYMBOL"` display string into its parts.
    #[must_use]
    pub fn from_display(display: impl Into<String>) -> Self {
        let display_text = display.into();
        let (name, symbol) = match display_text.rsplit_once('|') {
            Some((n, s)) => (n.trim().to_string(), s.trim().to_string()),
            None => (display_text.trim().to_string(), String::new()),
        };
        Self {
            display_text,
            company_name: name,
            symbol,
        }
    }

    /// The symbol this candidate resolves to, falling back to the display
    /// text when the markup carried no separate symbol part.
    #[must_use]
    pub fn resolved_symbol(&self) -> String {
        if self.symbol.is_empty() {
            self.display_text.trim().to_uppercase()
        } else {
            self.symbol.to_uppercase()
        }
    }
}

/// Picks the best candidate index for a query, or `None` for an empty slate.
///
/// Priority: exact symbol equality, symbol containment either direction,
/// company-name prefix, substring anywhere, then the first candidate. A
/// precise symbol match is far more reliable than a fuzzy name match, and
/// some answer beats none: the underlying UI always renders at least one
/// suggestion for any non-trivial input.
#[must_use]
pub fn rank_candidates(query: &str, candidates: &[SymbolCandidate]) -> Option<usize> {
    if candidates.is_empty() {
        return None;
    }
    let q = query.trim().to_lowercase();
    let lowered: Vec<(String, String, String)> = candidates
        .iter()
        .map(|c| {
            (
                c.symbol.to_lowercase(),
                c.company_name.to_lowercase(),
                c.display_text.to_lowercase(),
            )
        })
        .collect();

    // Each tier is exhausted across the whole slate before the next one is
    // considered: an exact symbol anywhere in the list beats a name prefix
    // rendered earlier.
    if let Some(i) = lowered
        .iter()
        .position(|(symbol, _, _)| !symbol.is_empty() && *symbol == q)
    {
        return Some(i);
    }
    if let Some(i) = lowered
        .iter()
        .position(|(symbol, _, _)| !symbol.is_empty() && (symbol.contains(&q) || q.contains(symbol)))
    {
        return Some(i);
    }
    if let Some(i) = lowered
        .iter()
        .position(|(_, name, text)| name.starts_with(&q) || text.starts_with(&q))
    {
        return Some(i);
    }
    if let Some(i) = lowered
        .iter()
        .position(|(_, name, text)| text.contains(&q) || name.contains(&q))
    {
        return Some(i);
    }
    Some(0)
}

/// Browser-interactive candidate source behind the resolver.
#[async_trait]
pub trait ResolveInteractive: Send + Sync {
    /// Drives the target's autocomplete for `query` and returns the rendered
    /// candidates, or an empty list when nothing rendered in time.
    async fn lookup(&self, query: &SymbolQuery) -> Result<Vec<SymbolCandidate>, NseError>;
}

/// Resolves free-text input to the canonical symbol the data endpoint expects.
pub struct SymbolResolver {
    interactive: Option<Arc<dyn ResolveInteractive>>,
}

impl SymbolResolver {
    /// A resolver with only the exact-match fast path.
    #[must_use]
    pub fn exact_only() -> Self {
        Self { interactive: None }
    }

    /// A resolver that falls back to the interactive strategy.
    #[must_use]
    pub fn with_interactive(interactive: Arc<dyn ResolveInteractive>) -> Self {
        Self {
            interactive: Some(interactive),
        }
    }

    /// Resolves `raw` to a canonical symbol.
    ///
    /// # Errors
    ///
    /// `SymbolNotResolved` when the input is empty, no interactive strategy
    /// is configured for a non-ticker input, or no candidates render in time.
    pub async fn resolve(&self, raw: &str) -> Result<String, NseError> {
        let query = SymbolQuery::new(raw);
        if query.normalized.is_empty() {
            return Err(NseError::SymbolNotResolved {
                query: query.raw,
            });
        }

        if query.looks_like_symbol() {
            tracing::debug!(symbol = %query.normalized, "input accepted as ticker");
            return Ok(query.normalized);
        }

        let Some(interactive) = &self.interactive else {
            return Err(NseError::SymbolNotResolved {
                query: query.normalized,
            });
        };

        let candidates = interactive.lookup(&query).await?;
        let Some(best) = rank_candidates(&query.normalized, &candidates) else {
            return Err(NseError::SymbolNotResolved {
                query: query.normalized,
            });
        };
        let symbol = candidates[best].resolved_symbol();
        tracing::info!(query = %query.normalized, %symbol, "resolved via autocomplete");
        Ok(symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates(displays: &[&str]) -> Vec<SymbolCandidate> {
        displays
            .iter()
            .map(|d| SymbolCandidate::from_display(*d))
            .collect()
    }

    #[test]
    fn exact_symbol_beats_shared_name_prefix() {
        let cs = candidates(&[
            "Reliance Industries Ltd | RELIANCE",
            "Reliance Power Ltd | RPOWER",
        ]);
        assert_eq!(rank_candidates("RELIANCE", &cs), Some(0));

        // Same candidates, reversed: exact symbol still wins over the
        // earlier prefix match.
        let cs = candidates(&[
            "Reliance Power Ltd | RPOWER",
            "Reliance Industries Ltd | RELIANCE",
        ]);
        assert_eq!(rank_candidates("RELIANCE", &cs), Some(1));
    }

    #[test]
    fn symbol_containment_matches_either_direction() {
        let cs = candidates(&["Tata Consultancy Services Ltd | TCS"]);
        assert_eq!(rank_candidates("TCS LTD", &cs), Some(0));
    }

    #[test]
    fn symbol_containment_beats_earlier_name_prefix() {
        let cs = candidates(&[
            "HDFCBANK Ltd Warrants | HDFCWARR",
            "HDFC Bank Ltd | HDFCBANK",
        ]);
        // Candidate 0 prefix-matches on display text, but candidate 1's
        // symbol is contained in the query: the symbol tier wins.
        assert_eq!(rank_candidates("HDFCBANK LTD", &cs), Some(1));
    }

    #[test]
    fn name_prefix_and_substring_fallbacks() {
        let cs = candidates(&[
            "Infosys Ltd | INFY",
            "HDFC Bank Ltd | HDFCBANK",
        ]);
        assert_eq!(rank_candidates("hdfc bank", &cs), Some(1));
        assert_eq!(rank_candidates("bank ltd", &cs), Some(1));
    }

    #[test]
    fn falls_back_to_first_candidate() {
        let cs = candidates(&["Some Company Ltd | SCL"]);
        assert_eq!(rank_candidates("unrelated query", &cs), Some(0));
        assert_eq!(rank_candidates("x", &[]), None);
    }

    #[test]
    fn fast_path_accepts_valid_tickers() {
        assert!(SymbolQuery::new(" reliance ").looks_like_symbol());
        assert!(SymbolQuery::new("M&M").looks_like_symbol());
        assert!(SymbolQuery::new("BAJAJ-AUTO").looks_like_symbol());
        assert!(!SymbolQuery::new("Reliance Industries").looks_like_symbol());
        assert!(!SymbolQuery::new("").looks_like_symbol());
        assert!(!SymbolQuery::new("A".repeat(21)).looks_like_symbol());
    }

    #[tokio::test]
    async fn resolve_uses_fast_path_without_interactive() {
        let r = SymbolResolver::exact_only();
        assert_eq!(r.resolve("tcs").await.unwrap(), "TCS");
        let err = r.resolve("Tata Consultancy Services").await.unwrap_err();
        assert!(matches!(err, NseError::SymbolNotResolved { .. }));
    }

    #[tokio::test]
    async fn resolve_ranks_interactive_candidates() {
        struct Canned;
        #[async_trait]
        impl ResolveInteractive for Canned {
            async fn lookup(&self, _q: &SymbolQuery) -> Result<Vec<SymbolCandidate>, NseError> {
                Ok(candidates(&[
                    "Reliance Power Ltd | RPOWER",
                    "Reliance Industries Ltd | RELIANCE",
                ]))
            }
        }
        let r = SymbolResolver::with_interactive(Arc::new(Canned));
        assert_eq!(r.resolve("reliance industries").await.unwrap(), "RELIANCE");
    }
}
