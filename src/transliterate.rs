use std::path::Path;

use crate::kana::{fold_katakana, romanize_kana};

/// Romanizes a single character the kana table does not know.
pub trait Transliterate {
    /// `None` when the character has no romanization.
    fn transliterate(&self, c: char) -> Option<String>;
}

/// An absent transliterator never produces output.
impl<T: Transliterate> Transliterate for Option<T> {
    fn transliterate(&self, c: char) -> Option<String> {
        self.as_ref()?.transliterate(c)
    }
}

impl<T: Transliterate + ?Sized> Transliterate for &T {
    fn transliterate(&self, c: char) -> Option<String> {
        (**self).transliterate(c)
    }
}

/// Asks `A` first and falls back to `B`.
pub struct Then<A, B>(pub A, pub B);

impl<A: Transliterate, B: Transliterate> Transliterate for Then<A, B> {
    fn transliterate(&self, c: char) -> Option<String> {
        self.0.transliterate(c).or_else(|| self.1.transliterate(c))
    }
}

/// Kana the built-in table has no standalone entry for: `ぢ`, `づ`, the
/// small vowels and glides, and the historical `ゐ`/`ゑ`. Katakana forms are
/// folded first. The small counters `ヵ`/`ヶ` are read differently by
/// context and are left to a dictionary.
pub struct ExtraKana;

impl Transliterate for ExtraKana {
    fn transliterate(&self, c: char) -> Option<String> {
        let romaji = match fold_katakana(c) {
            'ぢ' => "ji",
            'づ' => "zu",
            'ぁ' => "a",
            'ぃ' => "i",
            'ぅ' => "u",
            'ぇ' => "e",
            'ぉ' => "o",
            'ゃ' => "ya",
            'ゅ' => "yu",
            'ょ' => "yo",
            'ゎ' => "wa",
            'ゐ' => "i",
            'ゑ' => "e",
            'ゔ' => "vu",
            _ => return None,
        };
        Some(romaji.to_string())
    }
}

/// Reads characters (typically kanji) with a jpreprocess dictionary and
/// romanizes the resulting katakana.
pub struct DictionaryReading {
    read: Box<dyn Fn(&str) -> Option<String>>,
}

impl DictionaryReading {
    pub fn open(dictionary: &Path) -> anyhow::Result<Self> {
        let jpre = jpreprocess::JPreprocess::from_config(jpreprocess::JPreprocessConfig {
            dictionary: jpreprocess::SystemDictionaryConfig::File(dictionary.to_owned()),
            user_dictionary: None,
        })
        .map_err(|err| {
            anyhow::anyhow!(
                "Failed to load dictionary '{}': {err}",
                dictionary.display()
            )
        })?;

        let read = move |text: &str| -> Option<String> {
            let mut njd = jpre.text_to_njd(text).ok()?;
            njd.preprocess();
            Some(
                njd.nodes
                    .iter()
                    .map(|node| node.get_pron().to_string())
                    .collect(),
            )
        };
        Ok(Self {
            read: Box::new(read),
        })
    }
}

impl Transliterate for DictionaryReading {
    fn transliterate(&self, c: char) -> Option<String> {
        let pron = (self.read)(c.encode_utf8(&mut [0; 4]))?;
        let kana = reading_to_kana(&pron);
        if kana.is_empty() {
            return None;
        }
        Some(romanize_kana(&kana))
    }
}

/// Keeps only the kana of a pronunciation string, as hiragana. The long
/// vowel mark stays so the romanizer can extend the vowel before it.
fn reading_to_kana(pron: &str) -> String {
    pron.chars()
        .map(fold_katakana)
        .filter(|c| matches!(c, 'ぁ'..='ゖ' | 'ヴ' | 'ー'))
        .collect()
}
