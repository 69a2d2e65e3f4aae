//! Re-encoding of extended characters as XML character references
//!
//! Jira's Jelly runner and the BugTrack tooling around it do not reliably
//! survive raw non-ASCII text, so every transformed payload goes through a
//! [`CharacterMap`] that swaps configured codepoints for `&#N;` references.
//! Characters absent from the map are copied through untouched, and because
//! references are plain ASCII a second pass changes nothing.

use std::collections::HashMap;

/// Typographic characters outside Latin-1 that BugTrack exports commonly carry.
const TYPOGRAPHIC: &[char] = &[
    '\u{0152}', // Œ
    '\u{0153}', // œ
    '\u{0160}', // Š
    '\u{0161}', // š
    '\u{0178}', // Ÿ
    '\u{0192}', // ƒ
    '\u{02C6}', // ˆ
    '\u{02DC}', // ˜
    '\u{2013}', // –
    '\u{2014}', // —
    '\u{2018}', // ‘
    '\u{2019}', // ’
    '\u{201A}', // ‚
    '\u{201C}', // “
    '\u{201D}', // ”
    '\u{201E}', // „
    '\u{2020}', // †
    '\u{2021}', // ‡
    '\u{2022}', // •
    '\u{2026}', // …
    '\u{2030}', // ‰
    '\u{2039}', // ‹
    '\u{203A}', // ›
    '\u{20AC}', // €
    '\u{2122}', // ™
];

/// Immutable codepoint to replacement table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharacterMap {
    entries: HashMap<char, String>,
}

impl CharacterMap {
    /// Build a map from `(codepoint, replacement)` pairs.
    ///
    /// When a codepoint appears more than once the last pair wins.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (char, S)>,
        S: Into<String>,
    {
        let mut map = HashMap::new();
        for (character, replacement) in entries {
            map.insert(character, replacement.into());
        }
        Self { entries: map }
    }

    /// The table used for BugTrack exports: the Latin-1 supplement plus
    /// [`TYPOGRAPHIC`] characters, each mapped to its decimal reference.
    pub fn bugtrack_default() -> Self {
        let latin1 = ('\u{00A0}'..='\u{00FF}').map(|c| (c, numeric_reference(c)));
        let typographic = TYPOGRAPHIC.iter().map(|&c| (c, numeric_reference(c)));
        Self::from_entries(latin1.chain(typographic))
    }

    pub fn get(&self, character: char) -> Option<&str> {
        self.entries.get(&character).map(String::as_str)
    }

    pub fn contains(&self, character: char) -> bool {
        self.entries.contains_key(&character)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace every mapped codepoint in `text`.
    pub fn encode(&self, text: &str) -> String {
        let mut output = String::with_capacity(text.len());
        for character in text.chars() {
            match self.entries.get(&character) {
                Some(replacement) => output.push_str(replacement),
                None => output.push(character),
            }
        }
        output
    }

    /// Decode `bytes` as UTF-8 and re-encode mapped codepoints.
    pub fn encode_bytes(&self, bytes: Vec<u8>) -> Result<Vec<u8>, std::string::FromUtf8Error> {
        let text = String::from_utf8(bytes)?;
        Ok(self.encode(&text).into_bytes())
    }
}

/// `&#N;` for the given character.
pub fn numeric_reference(character: char) -> String {
    format!("&#{};", u32::from(character))
}
