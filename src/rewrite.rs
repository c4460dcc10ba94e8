//! Greedy longest-match rewriting over symbol sequences.
//!
//! The same loop serves phoneme labels (keys from a mapping file, spans in
//! seconds or ticks) and transcript characters (built-in kana table, spans
//! in character offsets). What differs between callers is captured by
//! [`Lexicon`] and [`MissPolicy`].

use std::fmt::Display;
use std::ops::Range;

use crate::span::{merge, Span};

/// Table of multi-symbol keys, each mapped to one replacement token.
pub trait Lexicon {
    type Symbol;

    /// Number of symbols tried first at each position.
    fn max_key_len(&self) -> usize;

    fn lookup(&self, key: &[Self::Symbol]) -> Option<&str>;

    /// An empty lexicon turns the rewrite into a pure pass-through.
    fn is_empty(&self) -> bool {
        false
    }
}

/// What to emit for a symbol no key starts with.
pub trait MissPolicy<S> {
    /// `None` passes the symbol through unchanged.
    fn on_miss(&self, symbol: &S) -> Option<String>;
}

/// Always falls back to the symbol itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl<S> MissPolicy<S> for PassThrough {
    fn on_miss(&self, _symbol: &S) -> Option<String> {
        None
    }
}

/// Ordered (symbol, span) pairs extracted from one source.
///
/// Symbols and spans are stored side by side so key candidates can be
/// looked up as plain slices.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolSequence<S, T> {
    symbols: Vec<S>,
    spans: Vec<Span<T>>,
}

impl<S, T> SymbolSequence<S, T> {
    pub fn new() -> Self {
        Self {
            symbols: Vec::new(),
            spans: Vec::new(),
        }
    }

    pub fn push(&mut self, symbol: S, span: Span<T>) {
        self.symbols.push(symbol);
        self.spans.push(span);
    }

    pub fn symbols(&self) -> &[S] {
        &self.symbols
    }

    pub fn spans(&self) -> &[Span<T>] {
        &self.spans
    }

    /// Applies `f` to every symbol, keeping spans untouched.
    pub fn map_symbols<U>(self, f: impl FnMut(S) -> U) -> SymbolSequence<U, T> {
        SymbolSequence {
            symbols: self.symbols.into_iter().map(f).collect(),
            spans: self.spans,
        }
    }
}

impl<S, T> Default for SymbolSequence<S, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, T> FromIterator<(S, Span<T>)> for SymbolSequence<S, T> {
    fn from_iter<I: IntoIterator<Item = (S, Span<T>)>>(iter: I) -> Self {
        let mut sequence = Self::new();
        for (symbol, span) in iter {
            sequence.push(symbol, span);
        }
        sequence
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Replacement taken from the lexicon.
    Matched,
    /// Produced by the miss policy.
    Fallback,
    /// The input symbol itself.
    PassThrough,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token<T> {
    pub text: String,
    pub span: Span<T>,
    /// Indices of the input symbols this token consumed.
    pub source: Range<usize>,
    pub origin: Origin,
}

/// Rewrites `input` left to right, trying the longest key first at each
/// position and consuming every symbol exactly once.
pub fn rewrite<L, M, T>(input: &SymbolSequence<L::Symbol, T>, lexicon: &L, miss: &M) -> Vec<Token<T>>
where
    L: Lexicon,
    L::Symbol: Display,
    M: MissPolicy<L::Symbol>,
    T: Copy,
{
    let symbols = input.symbols();
    let spans = input.spans();
    let n = symbols.len();
    let mut tokens = Vec::with_capacity(n);

    if lexicon.is_empty() {
        tokens.extend((0..n).map(|i| pass_through(&symbols[i], spans[i], i)));
        return tokens;
    }

    let max_key_len = lexicon.max_key_len().max(1);
    let mut i = 0;
    'cursor: while i < n {
        let window = max_key_len.min(n - i);
        for k in (1..=window).rev() {
            let Some(replacement) = lexicon.lookup(&symbols[i..i + k]) else {
                continue;
            };
            let span = merge(&spans[i..i + k]).expect("match window holds at least one span");
            tokens.push(Token {
                text: replacement.to_string(),
                span,
                source: i..i + k,
                origin: Origin::Matched,
            });
            i += k;
            continue 'cursor;
        }

        let token = match miss.on_miss(&symbols[i]) {
            Some(text) => Token {
                text,
                span: spans[i],
                source: i..i + 1,
                origin: Origin::Fallback,
            },
            None => pass_through(&symbols[i], spans[i], i),
        };
        tokens.push(token);
        i += 1;
    }

    tokens
}

fn pass_through<S: Display, T>(symbol: &S, span: Span<T>, index: usize) -> Token<T> {
    Token {
        text: symbol.to_string(),
        span,
        source: index..index + 1,
        origin: Origin::PassThrough,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    struct Table(HashMap<Vec<String>, String>);

    impl Table {
        fn of(entries: &[(&str, &str)]) -> Self {
            Table(
                entries
                    .iter()
                    .map(|(key, value)| {
                        (key.split_whitespace().map(str::to_string).collect(), value.to_string())
                    })
                    .collect(),
            )
        }
    }

    impl Lexicon for Table {
        type Symbol = String;

        fn max_key_len(&self) -> usize {
            self.0.keys().map(Vec::len).max().unwrap_or(1)
        }

        fn lookup(&self, key: &[String]) -> Option<&str> {
            self.0.get(key).map(String::as_str)
        }

        fn is_empty(&self) -> bool {
            self.0.is_empty()
        }
    }

    struct Upper;

    impl MissPolicy<String> for Upper {
        fn on_miss(&self, symbol: &String) -> Option<String> {
            (symbol != "x").then(|| symbol.to_uppercase())
        }
    }

    fn sequence(labels: &[&str]) -> SymbolSequence<String, u32> {
        labels
            .iter()
            .zip(0u32..)
            .map(|(label, i)| (label.to_string(), Span::new(i * 10, i * 10 + 10)))
            .collect()
    }

    fn texts<T>(tokens: &[Token<T>]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn longest_key_wins() {
        let table = Table::of(&[("a b", "X"), ("a", "Y")]);
        let tokens = rewrite(&sequence(&["a", "b"]), &table, &PassThrough);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text, "X");
        assert_eq!(tokens[0].span, Span::new(0, 20));
        assert_eq!(tokens[0].source, 0..2);
        assert_eq!(tokens[0].origin, Origin::Matched);
    }

    #[test]
    fn shorter_key_used_when_longer_fails() {
        let table = Table::of(&[("a b c", "X"), ("a", "Y"), ("b d", "Z")]);
        let tokens = rewrite(&sequence(&["a", "b", "d", "q"]), &table, &PassThrough);
        assert_eq!(texts(&tokens), ["Y", "Z", "q"]);
        assert_eq!(tokens[1].span, Span::new(10, 30));
        assert_eq!(tokens[2].origin, Origin::PassThrough);
    }

    #[test]
    fn every_match_is_emitted_with_gapped_span() {
        let table = Table::of(&[("a b c", "X")]);
        let input: SymbolSequence<String, u32> = [("a", 0, 5), ("b", 8, 9), ("c", 20, 30)]
            .into_iter()
            .map(|(label, start, end)| (label.to_string(), Span::new(start, end)))
            .collect();
        let tokens = rewrite(&input, &table, &PassThrough);
        assert_eq!(texts(&tokens), ["X"]);
        assert_eq!(tokens[0].span, Span::new(0, 30));
    }

    #[test]
    fn empty_table_passes_everything_through() {
        let table = Table::of(&[]);
        let input = sequence(&["p1", "p2", "p3"]);
        let tokens = rewrite(&input, &table, &Upper);
        assert_eq!(texts(&tokens), ["p1", "p2", "p3"]);
        for (i, token) in tokens.iter().enumerate() {
            assert_eq!(token.span, input.spans()[i]);
            assert_eq!(token.origin, Origin::PassThrough);
        }
    }

    #[test]
    fn empty_input_yields_nothing() {
        let table = Table::of(&[("a", "Y")]);
        assert!(rewrite(&sequence(&[]), &table, &PassThrough).is_empty());
    }

    #[test]
    fn miss_policy_then_pass_through() {
        let table = Table::of(&[("a", "Y")]);
        let tokens = rewrite(&sequence(&["b", "a", "x"]), &table, &Upper);
        assert_eq!(texts(&tokens), ["B", "Y", "x"]);
        assert_eq!(tokens[0].origin, Origin::Fallback);
        assert_eq!(tokens[2].origin, Origin::PassThrough);
    }

    #[test]
    fn window_shrinks_at_end_of_input() {
        let table = Table::of(&[("a b c", "X"), ("b c", "W")]);
        let tokens = rewrite(&sequence(&["a", "b", "c", "b", "c"]), &table, &PassThrough);
        assert_eq!(texts(&tokens), ["X", "W"]);
    }

    #[test]
    fn coverage_is_preserved() {
        let table = Table::of(&[
            ("a b", "X"),
            ("b b b", "T"),
            ("c", "C"),
            ("a c a", "Q"),
        ]);
        let labels = ["a", "b", "b", "b", "b", "c", "a", "c", "a", "a", "z"];
        let input = sequence(&labels);
        let tokens = rewrite(&input, &table, &PassThrough);

        let mut next = 0;
        for token in &tokens {
            assert_eq!(token.source.start, next);
            assert!(token.source.end > token.source.start);
            assert_eq!(token.span.start, input.spans()[token.source.start].start);
            assert_eq!(token.span.end, input.spans()[token.source.end - 1].end);
            next = token.source.end;
        }
        assert_eq!(next, labels.len());
        assert_eq!(tokens.first().map(|t| t.span.start), Some(0));
        assert_eq!(tokens.last().map(|t| t.span.end), Some(110));
    }

    #[test]
    fn rewrite_is_deterministic() {
        let table = Table::of(&[("a b", "X"), ("b", "B"), ("b a", "R")]);
        let input = sequence(&["a", "b", "a", "b", "b", "a"]);
        assert_eq!(
            rewrite(&input, &table, &PassThrough),
            rewrite(&input, &table, &PassThrough)
        );
    }

    #[test]
    fn map_symbols_keeps_spans() {
        let input = sequence(&["A", "B"]).map_symbols(|s| s.to_lowercase());
        assert_eq!(input.symbols(), ["a", "b"]);
        assert_eq!(input.spans()[1], Span::new(10, 20));
    }
}
