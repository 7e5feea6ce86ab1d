//! VB.NET analyser. No crate on crates.io (nor anywhere in this corpus) ships a
//! working `tree-sitter-vb-dotnet` grammar, so this analyser is permanently
//! unavailable — [`LanguageAnalyser::is_available`] always returns `false` and its
//! extraction methods are never invoked. This is intentional graceful degradation,
//! not a missing feature; see `languages/vbnet.py` for the upstream language this
//! mirrors and its own note about the same unavailable grammar.

use tree_sitter::{Language, Tree};

use crate::config::{DraftSymbol, ImportStatement, RawCall};

use super::LanguageAnalyser;

pub struct VbNetAnalyser;

impl LanguageAnalyser for VbNetAnalyser {
    fn language_name(&self) -> &'static str {
        "vb"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["vb"]
    }

    fn ts_language(&self) -> Language {
        unreachable!("VB.NET has no available grammar; is_available() guards every call site")
    }

    fn is_available(&self) -> bool {
        false
    }

    fn extract_symbols(&self, _tree: &Tree, _source: &[u8], _file_path: &str) -> Vec<DraftSymbol> {
        Vec::new()
    }

    fn extract_imports(&self, _tree: &Tree, _source: &[u8], _file_path: &str) -> Vec<ImportStatement> {
        Vec::new()
    }

    fn extract_calls(&self, _tree: &Tree, _source: &[u8], _file_path: &str) -> Vec<RawCall> {
        Vec::new()
    }

    fn builtin_exclusions(&self) -> &'static [&'static str] {
        &[]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vbnet_analyser_reports_unavailable() {
        assert!(!VbNetAnalyser.is_available());
    }
}
