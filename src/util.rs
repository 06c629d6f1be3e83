use smallvec::{smallvec, SmallVec};

use crate::types::{GlyphId, WordId};
use crate::word_list::WordList;
use crate::MAX_GLYPH_COUNT;

/// Number of occurrences of each glyph in one cell across a set of options, indexed by `GlyphId`.
/// This lets us check whether a crossing letter is supported in constant time.
pub type GlyphCounts = SmallVec<[u32; MAX_GLYPH_COUNT]>;

/// Count the glyphs appearing at `cell_idx` in each of the given words. Words too short to have
/// that cell don't contribute anything.
pub fn build_glyph_counts_for_cell<'a>(
    word_list: &WordList,
    cell_idx: usize,
    options: impl IntoIterator<Item = &'a WordId>,
) -> GlyphCounts {
    let mut result: GlyphCounts = smallvec![0; word_list.glyphs.len()];

    for &word_id in options {
        if let Some(&glyph) = word_list.words[word_id].glyphs.get(cell_idx) {
            result[glyph] += 1;
        }
    }

    result
}

/// The glyph at `cell_idx` of the given word, if the word is long enough to have one.
#[must_use]
pub fn glyph_at(word_list: &WordList, word_id: WordId, cell_idx: usize) -> Option<GlyphId> {
    word_list.words[word_id].glyphs.get(cell_idx).copied()
}

#[cfg(test)]
mod tests {
    use crate::util::{build_glyph_counts_for_cell, glyph_at};
    use crate::word_list::WordList;

    #[test]
    fn test_counts_glyphs_in_cell() {
        let word_list = WordList::from_words(&["cat", "cot", "dog", "at"]);
        let options: Vec<usize> = (0..word_list.len()).collect();

        let counts = build_glyph_counts_for_cell(&word_list, 2, &options);

        let t = word_list.glyph_id('T').unwrap();
        let g = word_list.glyph_id('G').unwrap();
        let a = word_list.glyph_id('A').unwrap();
        assert_eq!(counts[t], 2);
        assert_eq!(counts[g], 1);
        assert_eq!(counts[a], 0);
        assert_eq!(counts.iter().sum::<u32>(), 3);
        assert_eq!(glyph_at(&word_list, 3, 2), None);
    }
}
