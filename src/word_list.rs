use smallvec::{smallvec, SmallVec};
use std::collections::HashMap;
use std::ffi::OsString;
use std::fmt;
use std::fmt::Debug;
use std::fs;
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

use crate::error::WordListError;
use crate::types::{GlyphId, WordId};
use crate::{MAX_GLYPH_COUNT, MAX_SLOT_LENGTH};

/// A struct representing a word in the word list.
#[derive(Debug, Clone)]
pub struct Word {
    /// The word as it would appear in a grid -- uppercase, NFC-normalized, no whitespace.
    pub normalized_string: String,

    /// The word as it appears in the user's word list.
    pub canonical_string: String,

    /// The glyph ids making up `normalized_string`.
    pub glyphs: SmallVec<[GlyphId; MAX_SLOT_LENGTH]>,

    /// The index of the source this word was first loaded from.
    pub source_index: u16,
}

impl Word {
    /// The number of glyphs (not bytes) in the word.
    #[must_use]
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

/// Given a canonical word string from a word list file, turn it into the normalized form we'll
/// use in the actual fill engine. Every word and every prefilled grid letter goes through this,
/// so casing can never cause a spurious mismatch.
#[must_use]
pub fn normalize_word(canonical: &str) -> String {
    canonical
        .to_uppercase()
        .nfc() // Normalize Unicode combining forms
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// Configuration describing a source of word list entries.
pub enum WordListSourceConfig {
    Memory { id: String, words: Vec<String> },
    File { id: String, path: OsString },
}

impl WordListSourceConfig {
    /// The unique id of this source, used to key its load report.
    #[must_use]
    pub fn id(&self) -> String {
        match self {
            WordListSourceConfig::Memory { id, .. } | WordListSourceConfig::File { id, .. } => {
                id.clone()
            }
        }
    }
}

#[derive(Debug)]
pub struct WordListSourceState {
    pub id: String,
    pub errors: Vec<WordListError>,
}

/// A single word list entry, before glyph ids have been assigned.
struct RawWordListEntry {
    normalized: String,
    canonical: String,
    source_index: u16,
}

/// Parse a word list file: one word per line, optionally followed by `;score` as in scored
/// dictionary files. The score is accepted but not used.
fn parse_word_list_file_contents(
    file_contents: &str,
    source_index: u16,
    errors: &mut Vec<WordListError>,
) -> Vec<RawWordListEntry> {
    file_contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map_while(|line| {
            if errors.len() > 100 {
                return None;
            }

            let canonical = line.split(';').next().unwrap_or_default().trim().to_string();
            let normalized = normalize_word(&canonical);
            if normalized.is_empty() {
                errors.push(WordListError::InvalidWord(line.into()));
                return Some(None);
            }

            Some(Some(RawWordListEntry {
                normalized,
                canonical,
                source_index,
            }))
        })
        .flatten()
        .collect()
}

fn load_words_from_source(
    source: &WordListSourceConfig,
    source_index: u16,
) -> (Vec<RawWordListEntry>, WordListSourceState) {
    let mut errors = vec![];

    let entries = match source {
        WordListSourceConfig::Memory { words, .. } => words
            .iter()
            .filter_map(|canonical| {
                let normalized = normalize_word(canonical);
                if normalized.is_empty() {
                    errors.push(WordListError::InvalidWord(canonical.clone()));
                    return None;
                }

                Some(RawWordListEntry {
                    normalized,
                    canonical: canonical.clone(),
                    source_index,
                })
            })
            .collect(),

        WordListSourceConfig::File { path, .. } => {
            if let Ok(contents) = fs::read_to_string(path) {
                parse_word_list_file_contents(&contents, source_index, &mut errors)
            } else {
                errors.push(WordListError::InvalidPath(path.to_string_lossy().into()));
                vec![]
            }
        }
    };

    (
        entries,
        WordListSourceState {
            id: source.id(),
            errors,
        },
    )
}

/// The loaded word list. Each distinct normalized word gets exactly one `WordId`, assigned in
/// load order, so iterating ids always visits words in the order the sources listed them.
pub struct WordList {
    /// A list of all characters that occur in any (normalized) word. `GlyphId`s used everywhere
    /// else are indices into this list.
    pub glyphs: SmallVec<[char; MAX_GLYPH_COUNT]>,

    /// The inverse of `glyphs`.
    pub glyph_id_by_char: HashMap<char, GlyphId>,

    /// All loaded words, indexed by `WordId`.
    pub words: Vec<Word>,

    /// A map from a normalized string to the id of the Word representing it.
    pub word_id_by_string: HashMap<String, WordId>,

    /// The maximum word length provided when configuring the WordList, if any.
    pub max_length: Option<usize>,

    /// The state of each word list source after loading, keyed by source id.
    pub source_states: HashMap<String, WordListSourceState>,
}

impl WordList {
    /// Construct a new `WordList` using the given sources, omitting any entries that are longer
    /// than `max_length`. If the same word appears more than once, only the first occurrence is
    /// kept.
    #[must_use]
    pub fn new(source_configs: &[WordListSourceConfig], max_length: Option<usize>) -> WordList {
        assert!(
            source_configs.len() < 2usize.pow(16),
            "Too many word list sources"
        );

        let mut instance = WordList {
            glyphs: smallvec![],
            glyph_id_by_char: HashMap::new(),
            words: vec![],
            word_id_by_string: HashMap::new(),
            max_length,
            source_states: HashMap::new(),
        };

        for (source_index, source) in source_configs.iter().enumerate() {
            let (entries, source_state) = load_words_from_source(source, source_index as u16);

            for entry in entries {
                if max_length.map_or(false, |max_length| entry.normalized.chars().count() > max_length) {
                    continue;
                }
                if instance.word_id_by_string.contains_key(&entry.normalized) {
                    continue;
                }
                instance.add_word(&entry);
            }

            instance
                .source_states
                .insert(source_state.id.clone(), source_state);
        }

        debug!(
            words = instance.words.len(),
            glyphs = instance.glyphs.len(),
            "loaded word list"
        );

        instance
    }

    /// Build a `WordList` from a single in-memory list of words.
    #[must_use]
    pub fn from_words<S: AsRef<str>>(words: &[S]) -> WordList {
        WordList::new(
            &[WordListSourceConfig::Memory {
                id: "0".into(),
                words: words.iter().map(|word| word.as_ref().to_string()).collect(),
            }],
            None,
        )
    }

    /// Build a `WordList` from a single word list file.
    #[must_use]
    pub fn from_file(path: impl Into<OsString>, max_length: Option<usize>) -> WordList {
        WordList::new(
            &[WordListSourceConfig::File {
                id: "0".into(),
                path: path.into(),
            }],
            max_length,
        )
    }

    fn add_word(&mut self, raw_entry: &RawWordListEntry) -> WordId {
        let glyphs: SmallVec<[GlyphId; MAX_SLOT_LENGTH]> = raw_entry
            .normalized
            .chars()
            .map(|c| self.glyph_id_for_char(c))
            .collect();

        let word_id = self.words.len();

        self.words.push(Word {
            normalized_string: raw_entry.normalized.clone(),
            canonical_string: raw_entry.canonical.clone(),
            glyphs,
            source_index: raw_entry.source_index,
        });

        self.word_id_by_string
            .insert(raw_entry.normalized.clone(), word_id);

        word_id
    }

    /// What's the unique glyph id for the given char? We assign these lazily, since word list
    /// entries may also contain numbers, non-English letters, or punctuation.
    pub fn glyph_id_for_char(&mut self, ch: char) -> GlyphId {
        self.glyph_id_by_char.get(&ch).copied().unwrap_or_else(|| {
            self.glyphs.push(ch);
            let id = self.glyphs.len() - 1;
            self.glyph_id_by_char.insert(ch, id);
            id
        })
    }

    /// Look up a glyph without registering it. `None` means no loaded word contains the char.
    #[must_use]
    pub fn glyph_id(&self, ch: char) -> Option<GlyphId> {
        self.glyph_id_by_char.get(&ch).copied()
    }

    #[must_use]
    pub fn word(&self, word_id: WordId) -> &Word {
        &self.words[word_id]
    }

    /// Find the id of a word, normalizing the input first.
    #[must_use]
    pub fn word_id(&self, word: &str) -> Option<WordId> {
        self.word_id_by_string.get(&normalize_word(word)).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// For each source, return any errors it emitted while loading.
    #[must_use]
    pub fn get_source_errors(&self) -> HashMap<String, Vec<WordListError>> {
        self.source_states
            .iter()
            .map(|(source_id, source_state)| (source_id.clone(), source_state.errors.clone()))
            .collect()
    }
}

impl Debug for WordList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WordList")
            .field("glyphs", &self.glyphs)
            .field("words", &self.words.len())
            .field("max_length", &self.max_length)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub mod tests {
    use crate::error::WordListError;
    use crate::word_list::{
        normalize_word, parse_word_list_file_contents, WordList, WordListSourceConfig,
    };

    #[test]
    fn test_normalizes_to_uppercase() {
        assert_eq!(normalize_word("hello"), "HELLO");
        assert_eq!(normalize_word(" ice cream "), "ICECREAM");
        assert_eq!(normalize_word("Cat"), normalize_word("cAT"));
    }

    #[test]
    fn test_duplicates_collapse() {
        let word_list = WordList::from_words(&["cat", "CAT", "dog", "Cat"]);

        assert_eq!(word_list.len(), 2);
        assert_eq!(word_list.word_id("cat"), Some(0));
        assert_eq!(word_list.word_id("DOG"), Some(1));
        assert_eq!(word_list.word(0).canonical_string, "cat");
    }

    #[test]
    fn test_glyphs_are_shared_between_words() {
        let word_list = WordList::from_words(&["abc", "cab"]);

        assert_eq!(word_list.glyphs.len(), 3);
        let abc = word_list.word(0);
        let cab = word_list.word(1);
        assert_eq!(abc.glyphs[0], cab.glyphs[1]);
        assert_eq!(abc.glyphs[2], cab.glyphs[0]);
        assert_eq!(word_list.glyph_id('B'), Some(abc.glyphs[1]));
        assert_eq!(word_list.glyph_id('Z'), None);
    }

    #[test]
    #[allow(clippy::unicode_not_nfc)]
    fn test_unusual_characters() {
        let word_list = WordList::from_words(&[
            // Non-English character expressed as one two-byte `char`
            "monsutâ",
            // Non-English character expressed as two chars w/ combining form
            "hélen",
        ]);

        assert_eq!(word_list.word(0).len(), 7);
        assert_eq!(word_list.word(1).len(), 5);
    }

    #[test]
    fn test_max_length() {
        let word_list = WordList::new(
            &[WordListSourceConfig::Memory {
                id: "0".into(),
                words: vec!["ant".into(), "antelope".into(), "bee".into()],
            }],
            Some(5),
        );

        assert_eq!(word_list.len(), 2);
        assert!(word_list.word_id("antelope").is_none());
    }

    #[test]
    fn test_parses_scored_lines() {
        let mut errors = vec![];
        let entries =
            parse_word_list_file_contents("apple;50\n\nbanana\n;40\ncherry ; 10\n", 0, &mut errors);

        let words: Vec<_> = entries.iter().map(|entry| entry.normalized.as_str()).collect();
        assert_eq!(words, vec!["APPLE", "BANANA", "CHERRY"]);
        assert_eq!(errors.len(), 1);
        assert!(matches!(&errors[0], WordListError::InvalidWord(line) if line == ";40"));
    }

    #[test]
    fn test_missing_file_is_reported() {
        let word_list = WordList::from_file("/definitely/not/a/real/words.txt", None);

        assert!(word_list.is_empty());
        let errors = word_list.get_source_errors();
        assert!(matches!(
            errors.get("0").map(Vec::as_slice),
            Some([WordListError::InvalidPath(_)])
        ));
    }

    #[test]
    fn test_earlier_sources_win() {
        let word_list = WordList::new(
            &[
                WordListSourceConfig::Memory {
                    id: "a".into(),
                    words: vec!["wolves".into()],
                },
                WordListSourceConfig::Memory {
                    id: "b".into(),
                    words: vec!["Wolves".into(), "wharves".into()],
                },
            ],
            None,
        );

        assert_eq!(word_list.len(), 2);
        assert_eq!(word_list.word(0).source_index, 0);
        assert_eq!(word_list.word(1).source_index, 1);
        assert_eq!(word_list.word(0).canonical_string, "wolves");
    }
}
