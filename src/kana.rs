//! Japanese transcript romanization.
//!
//! Two passes over the shared longest-match engine: kana to romaji with a
//! built-in table, then romaji to space-separated phone symbols where
//! consonant clusters and digraphs stay glued.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::Context;
use lazy_static::lazy_static;

use crate::batch::{self, BatchReport, Outcome};
use crate::rewrite::{rewrite, Lexicon, MissPolicy, Origin, PassThrough, SymbolSequence, Token};
use crate::span::Span;
use crate::transliterate::{ExtraKana, Then, Transliterate};

/// Kana characters tried together at each position.
const KANA_WINDOW: usize = 3;

/// Marker written around every romanized transcript.
const PAUSE: &str = "SP";

/// Prolonged sound mark; romanized from the vowel before it.
const LONG_VOWEL: char = 'ー';

lazy_static! {
    static ref KANA: HashMap<&'static str, &'static str> = [
        ("あ", "a"), ("い", "i"), ("う", "u"), ("え", "e"), ("お", "o"),
        ("か", "ka"), ("き", "ki"), ("く", "ku"), ("け", "ke"), ("こ", "ko"),
        ("が", "ga"), ("ぎ", "gi"), ("ぐ", "gu"), ("げ", "ge"), ("ご", "go"),
        ("さ", "sa"), ("し", "shi"), ("す", "su"), ("せ", "se"), ("そ", "so"),
        ("ざ", "za"), ("じ", "ji"), ("ず", "zu"), ("ぜ", "ze"), ("ぞ", "zo"),
        ("た", "ta"), ("ち", "chi"), ("つ", "tsu"), ("て", "te"), ("と", "to"),
        ("だ", "da"), ("で", "de"), ("ど", "do"),
        ("な", "na"), ("に", "ni"), ("ぬ", "nu"), ("ね", "ne"), ("の", "no"),
        ("は", "ha"), ("ひ", "hi"), ("ふ", "hu"), ("へ", "he"), ("ほ", "ho"),
        ("ば", "ba"), ("び", "bi"), ("ぶ", "bu"), ("べ", "be"), ("ぼ", "bo"),
        ("ぱ", "pa"), ("ぴ", "pi"), ("ぷ", "pu"), ("ぺ", "pe"), ("ぽ", "po"),
        ("ま", "ma"), ("み", "mi"), ("む", "mu"), ("め", "me"), ("も", "mo"),
        ("や", "ya"), ("ゆ", "yu"), ("よ", "yo"),
        ("ら", "ra"), ("り", "ri"), ("る", "ru"), ("れ", "re"), ("ろ", "ro"),
        ("わ", "wa"), ("を", "wo"), ("ん", "N"),
        ("っ", "xtu"), ("・", "cl"), ("'", "vf"),
        ("ヴ", "vu"), ("ヴぁ", "va"), ("ヴぃ", "vi"), ("ヴぇ", "ve"), ("ヴぉ", "vo"),
        ("うぃ", "wi"), ("うぇ", "we"), ("うぉ", "wo"), ("わぅ", "wu"), ("いぇ", "ye"),
        ("きゃ", "kya"), ("きゅ", "kyu"), ("きぇ", "kye"), ("きょ", "kyo"),
        ("ぎゃ", "gya"), ("ぎゅ", "gyu"), ("ぎぇ", "gye"), ("ぎょ", "gyo"),
        ("しゃ", "sha"), ("しゅ", "shu"), ("しぇ", "she"), ("しょ", "sho"),
        ("じゃ", "ja"), ("じゅ", "ju"), ("じぇ", "je"), ("じょ", "jo"),
        ("ぢゃ", "ja"), ("ぢゅ", "ju"), ("ぢょ", "jo"),
        ("ちゃ", "cha"), ("ちゅ", "chu"), ("ちぇ", "che"), ("ちょ", "cho"),
        ("にゃ", "nya"), ("にゅ", "nyu"), ("にぇ", "nye"), ("にょ", "nyo"),
        ("ひゃ", "hya"), ("ひゅ", "hyu"), ("ひぇ", "hye"), ("ひょ", "hyo"),
        ("びゃ", "bya"), ("びゅ", "byu"), ("びぇ", "bye"), ("びょ", "byo"),
        ("ぴゃ", "pya"), ("ぴゅ", "pyu"), ("ぴぇ", "pye"), ("ぴょ", "pyo"),
        ("みゃ", "mya"), ("みゅ", "myu"), ("みぇ", "mye"), ("みょ", "myo"),
        ("りゃ", "rya"), ("りゅ", "ryu"), ("りぇ", "rye"), ("りょ", "ryo"),
        ("つぁ", "tsa"), ("つぃ", "tsi"), ("つぇ", "tse"), ("つぉ", "tso"),
        ("ふぁ", "fa"), ("ふぃ", "fi"), ("ふぇ", "fe"), ("ふぉ", "fo"),
        ("てぃ", "ti"), ("でぃ", "di"), ("とぅ", "tu"), ("どぅ", "du"),
        ("すぃ", "si"), ("ずぃ", "zi"), ("ほぅ", "hu"),
    ]
    .into_iter()
    .collect();

    /// Consonant clusters and digraphs kept together when spacing romaji.
    static ref CLUSTERS: HashSet<&'static str> = [
        "ky", "py", "by", "ny", "my", "fy", "hy", "gy", "dy", "ty", "vy", "zy", "ry",
        "ch", "sh", "ts", "dh", "th", "vf", "hh", "jh", "ng", "cl",
    ]
    .into_iter()
    .collect();

    static ref CLUSTER_WINDOW: usize = CLUSTERS.iter().map(|c| c.chars().count()).max().unwrap_or(1);
}

/// A transcript character together with the hiragana it is looked up as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Kana {
    pub original: char,
    pub folded: char,
}

impl From<char> for Kana {
    fn from(original: char) -> Self {
        Self {
            original,
            folded: fold_katakana(original),
        }
    }
}

/// Unmatched characters are written back as they appeared in the text.
impl fmt::Display for Kana {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.original)
    }
}

/// The built-in kana table, matched three characters at a time.
pub struct KanaTable;

impl Lexicon for KanaTable {
    type Symbol = Kana;

    fn max_key_len(&self) -> usize {
        KANA_WINDOW
    }

    fn lookup(&self, key: &[Kana]) -> Option<&str> {
        let key: String = key.iter().map(|kana| kana.folded).collect();
        KANA.get(key.as_str()).copied()
    }
}

/// Romaji clusters; a match maps to itself.
struct Clusters;

impl Lexicon for Clusters {
    type Symbol = char;

    fn max_key_len(&self) -> usize {
        *CLUSTER_WINDOW
    }

    fn lookup(&self, key: &[char]) -> Option<&str> {
        let key: String = key.iter().collect();
        CLUSTERS.get(key.as_str()).copied()
    }
}

/// Hands kana misses to the extra kana, then to a transliterator; silence
/// from both means pass-through. `ー` is left for [`lengthen_vowels`].
struct Delegate<'a, F: ?Sized>(&'a F);

impl<F: Transliterate + ?Sized> MissPolicy<Kana> for Delegate<'_, F> {
    fn on_miss(&self, symbol: &Kana) -> Option<String> {
        if symbol.original == LONG_VOWEL {
            return None;
        }
        Then(&ExtraKana, self.0).transliterate(symbol.original)
    }
}

/// Maps katakana onto the hiragana the table is keyed by. `ヴ` has its own
/// entries and is left alone.
pub fn fold_katakana(c: char) -> char {
    match c {
        'ァ'..='ヶ' if c != 'ヴ' => char::from_u32(c as u32 - 0x60).unwrap_or(c),
        _ => c,
    }
}

fn characters(text: &str) -> SymbolSequence<Kana, usize> {
    text.chars()
        .enumerate()
        .map(|(i, c)| (Kana::from(c), Span::new(i, i + 1)))
        .collect()
}

/// Splits `text` into romaji tokens, spans in character offsets.
pub fn tokenize<F: Transliterate + ?Sized>(text: &str, fallback: &F) -> Vec<Token<usize>> {
    let mut tokens = rewrite(&characters(text), &KanaTable, &Delegate(fallback));
    lengthen_vowels(&mut tokens);
    tokens
}

/// Romanization without a reading dictionary; characters nothing knows are
/// kept as they are.
pub fn romanize_kana(text: &str) -> String {
    tokenize(text, &None::<ExtraKana>)
        .into_iter()
        .map(|token| token.text)
        .collect()
}

/// Replaces each passed-through `ー` with the vowel of the token before it.
/// A long `o` is spelled `ou`, as in `とうきょう`.
fn lengthen_vowels(tokens: &mut [Token<usize>]) {
    for i in 1..tokens.len() {
        let (before, rest) = tokens.split_at_mut(i);
        let token = &mut rest[0];
        if token.origin != Origin::PassThrough || !token.text.starts_with(LONG_VOWEL) {
            continue;
        }
        let vowel = match before[i - 1].text.chars().last() {
            Some('o') => 'u',
            Some(v @ ('a' | 'i' | 'u' | 'e')) => v,
            _ => continue,
        };
        token.text = vowel.to_string();
        token.origin = Origin::Fallback;
    }
}

/// Puts a space after every romaji character except inside clusters.
pub fn space_clusters(romaji: &str) -> String {
    let sequence: SymbolSequence<char, usize> = romaji
        .chars()
        .enumerate()
        .map(|(i, c)| (c, Span::new(i, i + 1)))
        .collect();
    let pieces: Vec<String> = rewrite(&sequence, &Clusters, &PassThrough)
        .into_iter()
        .map(|token| token.text)
        .collect();
    pieces.join(" ").trim().to_string()
}

/// Full transcript conversion: romanize, space, and wrap in pause markers.
pub fn romanize<F: Transliterate + ?Sized>(text: &str, fallback: &F) -> String {
    let tokens = tokenize(text, fallback);
    for token in &tokens {
        if token.origin == Origin::PassThrough && !token.text.trim().is_empty() {
            tracing::debug!("No romanization for `{}`", token.text);
        }
    }
    let romaji: String = tokens.into_iter().map(|token| token.text).collect();
    format!("{PAUSE} {} {PAUSE}", space_clusters(&romaji))
}

/// Romanizes every `.txt` under `input` in place.
pub fn romanize_files<F: Transliterate + ?Sized>(
    input: &Path,
    fallback: &F,
) -> anyhow::Result<BatchReport> {
    let files = batch::collect_files(input, "txt")?;
    Ok(batch::process(&files, |path| {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Skipped '{}', not a UTF-8 text file", path.display()))?;
        batch::write_file(path, &romanize(&text, fallback))?;
        Ok(Outcome::Written(path.to_owned()))
    }))
}
