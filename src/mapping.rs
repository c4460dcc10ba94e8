use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::MappingError;
use crate::rewrite::Lexicon;

/// How symbols are canonicalized before they are used as (or compared to) keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Normalization {
    /// Symbols are compared as written.
    #[default]
    Verbatim,
    /// Lowercase and drop the digits `0`-`9`, so `AA1` and `aa` collide.
    LowercaseStripDigits,
}

impl Normalization {
    pub fn apply(self, symbol: &str) -> String {
        match self {
            Normalization::Verbatim => symbol.to_string(),
            Normalization::LowercaseStripDigits => symbol
                .to_lowercase()
                .chars()
                .filter(|c| !c.is_ascii_digit())
                .collect(),
        }
    }
}

/// Phoneme sequence to replacement dictionary, loaded from a converter file.
///
/// The table remembers the normalization its keys went through. Input
/// symbols are not normalized by the rewriter; callers run them through
/// [`MappingTable::normalize`] first.
#[derive(Debug, Clone)]
pub struct MappingTable {
    entries: HashMap<Vec<String>, String>,
    max_key_len: usize,
    normalization: Normalization,
}

impl MappingTable {
    pub fn new(normalization: Normalization) -> Self {
        Self {
            entries: HashMap::new(),
            max_key_len: 1,
            normalization,
        }
    }

    /// Reads `path`, one `sym [sym...],replacement` rule per line.
    ///
    /// Blank lines and lines without exactly one comma are dropped. A later
    /// rule with the same (normalized) key replaces the earlier one.
    pub fn load(path: &Path, normalization: Normalization) -> Result<Self, MappingError> {
        let contents = fs::read_to_string(path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => MappingError::NotFound {
                path: path.to_owned(),
            },
            _ => MappingError::Load {
                path: path.to_owned(),
                source,
            },
        })?;
        let table = Self::parse(&contents, normalization);
        tracing::debug!(
            "Loaded {} mapping rule(s) from {}",
            table.len(),
            path.display()
        );
        Ok(table)
    }

    pub fn parse(contents: &str, normalization: Normalization) -> Self {
        let mut table = Self::new(normalization);
        for (index, raw_line) in contents.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }
            let mut parts = line.split(',');
            let (Some(sequence), Some(replacement), None) = (parts.next(), parts.next(), parts.next())
            else {
                tracing::debug!("Dropping malformed mapping line {}: `{}`", index + 1, line);
                continue;
            };
            let key: Vec<String> = sequence.split_whitespace().map(str::to_string).collect();
            table.insert(key, replacement.trim());
        }
        table
    }

    /// Adds a rule, normalizing its key. Empty keys are ignored.
    pub fn insert(&mut self, key: Vec<String>, replacement: &str) {
        if key.is_empty() {
            return;
        }
        let key: Vec<String> = key
            .iter()
            .map(|symbol| self.normalization.apply(symbol))
            .collect();
        self.max_key_len = self.max_key_len.max(key.len());
        self.entries.insert(key, replacement.to_string());
    }

    pub fn normalization(&self) -> Normalization {
        self.normalization
    }

    /// Brings an input symbol into the form the keys were stored in.
    pub fn normalize(&self, symbol: &str) -> String {
        self.normalization.apply(symbol)
    }

    pub fn get(&self, key: &[String]) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl Lexicon for MappingTable {
    type Symbol = String;

    fn max_key_len(&self) -> usize {
        self.max_key_len
    }

    fn lookup(&self, key: &[String]) -> Option<&str> {
        self.get(key)
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::rewrite::{rewrite, Origin, PassThrough, SymbolSequence};
    use crate::span::Span;

    fn key(symbols: &[&str]) -> Vec<String> {
        symbols.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_multi_symbol_keys() {
        let table = MappingTable::parse("a i , ai\n\nk  y a,kya\n", Normalization::Verbatim);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(&key(&["a", "i"])), Some("ai"));
        assert_eq!(table.get(&key(&["k", "y", "a"])), Some("kya"));
        assert_eq!(table.max_key_len(), 3);
    }

    #[test]
    fn later_duplicate_overwrites() {
        let table = MappingTable::parse("a,X\na,Y\n", Normalization::Verbatim);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(&key(&["a"])), Some("Y"));
    }

    #[test]
    fn duplicates_collide_after_normalization() {
        let table = MappingTable::parse("AH0,ax\nah1,schwa\n", Normalization::LowercaseStripDigits);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(&key(&["ah"])), Some("schwa"));
    }

    #[test]
    fn malformed_lines_are_dropped() {
        let table = MappingTable::parse("a b,c\nx,y,z\nno comma here\n,\n", Normalization::Verbatim);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(&key(&["a", "b"])), Some("c"));
    }

    #[test]
    fn empty_table_has_unit_window() {
        let table = MappingTable::parse("", Normalization::Verbatim);
        assert!(Lexicon::is_empty(&table));
        assert_eq!(table.max_key_len(), 1);
    }

    #[test]
    fn normalization_lowercases_and_strips_digits() {
        let n = Normalization::LowercaseStripDigits;
        assert_eq!(n.apply("AA1"), "aa");
        assert_eq!(n.apply("Ng2x0"), "ngx");
        assert_eq!(Normalization::Verbatim.apply("AA1"), "AA1");
    }

    #[test]
    fn only_ascii_digits_are_stripped() {
        let n = Normalization::LowercaseStripDigits;
        assert_eq!(n.apply("AA1½"), "aa½");
        assert_eq!(n.apply("〇2"), "〇");
    }

    #[test]
    fn unnormalized_input_misses_normalized_key() {
        let table = MappingTable::parse("AH0,ax\n", Normalization::LowercaseStripDigits);
        let raw: SymbolSequence<String, f64> =
            [("AH0".to_string(), Span::new(0.0, 0.1))].into_iter().collect();

        let tokens = rewrite(&raw, &table, &PassThrough);
        assert_eq!(tokens[0].text, "AH0");
        assert_eq!(tokens[0].origin, Origin::PassThrough);

        let normalized = raw.map_symbols(|s| table.normalize(&s));
        let tokens = rewrite(&normalized, &table, &PassThrough);
        assert_eq!(tokens[0].text, "ax");
        assert_eq!(tokens[0].origin, Origin::Matched);
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = MappingTable::load(&dir.path().join("nope.txt"), Normalization::Verbatim)
            .unwrap_err();
        assert!(matches!(err, MappingError::NotFound { .. }));
    }

    #[test]
    fn load_reports_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.txt");
        fs::write(&path, [0xff, 0xfe, b',', b'a']).unwrap();
        let err = MappingTable::load(&path, Normalization::Verbatim).unwrap_err();
        assert!(matches!(err, MappingError::Load { .. }));
    }

    #[test]
    fn load_tolerates_malformed_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "a b,ab").unwrap();
        writeln!(file, "c,d,e").unwrap();
        let table = MappingTable::load(file.path(), Normalization::Verbatim).unwrap();
        assert_eq!(table.len(), 1);
    }
}
