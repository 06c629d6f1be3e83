//! The domain store: for each slot, the set of words still considered possible for it. A word in a
//! domain is a candidate, not a commitment.

use std::collections::BTreeSet;

use crate::grid::Grid;
use crate::types::{SlotId, WordId};
use crate::word_list::WordList;

/// Candidate words for every slot in a grid, indexed by `SlotId`. Sets are ordered by `WordId`, so
/// iterating a domain always visits words in word-list order.
///
/// Every removal is recorded in an elimination log, so the search can take a cheap checkpoint
/// before a tentative choice and undo everything that followed from it with `restore`.
#[derive(Debug, Clone)]
pub struct Domains {
    domains: Vec<BTreeSet<WordId>>,

    /// Words removed since the log was last cleared, as (slot, word), oldest first.
    eliminations: Vec<(SlotId, WordId)>,
}

impl PartialEq for Domains {
    fn eq(&self, other: &Self) -> bool {
        self.domains == other.domains
    }
}

impl Eq for Domains {}

impl Domains {
    /// Seed every slot's domain with every word in the list. No constraints are applied yet.
    #[must_use]
    pub fn new(grid: &Grid, word_list: &WordList) -> Domains {
        let all_words: BTreeSet<WordId> = (0..word_list.len()).collect();

        Domains {
            domains: vec![all_words; grid.slot_count()],
            eliminations: vec![],
        }
    }

    #[must_use]
    pub fn get(&self, slot_id: SlotId) -> &BTreeSet<WordId> {
        &self.domains[slot_id]
    }

    /// Keep only the words in a slot's domain for which `keep` returns true, logging the rest.
    /// Returns the number of words removed.
    pub(crate) fn retain(
        &mut self,
        slot_id: SlotId,
        mut keep: impl FnMut(WordId) -> bool,
    ) -> usize {
        let eliminations = &mut self.eliminations;
        let initial_len = eliminations.len();

        self.domains[slot_id].retain(|&word_id| {
            let kept = keep(word_id);
            if !kept {
                eliminations.push((slot_id, word_id));
            }
            kept
        });

        eliminations.len() - initial_len
    }

    /// The number of candidates left for a slot.
    #[must_use]
    pub fn len(&self, slot_id: SlotId) -> usize {
        self.domains[slot_id].len()
    }

    #[must_use]
    pub fn is_empty(&self, slot_id: SlotId) -> bool {
        self.domains[slot_id].is_empty()
    }

    #[must_use]
    pub fn sizes(&self) -> Vec<usize> {
        self.domains.iter().map(BTreeSet::len).collect()
    }

    /// The candidate words for a slot, as normalized strings.
    pub fn words<'a>(
        &'a self,
        word_list: &'a WordList,
        slot_id: SlotId,
    ) -> impl Iterator<Item = &'a str> + 'a {
        self.domains[slot_id]
            .iter()
            .map(|&word_id| word_list.word(word_id).normalized_string.as_str())
    }

    /// Reduce a slot's domain to the single chosen word.
    pub(crate) fn collapse(&mut self, slot_id: SlotId, word_id: WordId) {
        self.retain(slot_id, |candidate| candidate == word_id);
    }

    /// A marker for the current position in the elimination log.
    #[must_use]
    pub(crate) fn checkpoint(&self) -> usize {
        self.eliminations.len()
    }

    /// Put back every word eliminated since `checkpoint` was taken.
    pub(crate) fn restore(&mut self, checkpoint: usize) {
        for (slot_id, word_id) in self.eliminations.drain(checkpoint..).rev() {
            self.domains[slot_id].insert(word_id);
        }
    }

    /// Forget the elimination log, making the current domains the new baseline.
    pub(crate) fn commit(&mut self) {
        self.eliminations.clear();
    }

    /// Is every domain here contained in the corresponding domain of `other`?
    #[must_use]
    pub fn is_subset_of(&self, other: &Domains) -> bool {
        self.domains.len() == other.domains.len()
            && self
                .domains
                .iter()
                .zip(&other.domains)
                .all(|(domain, other_domain)| domain.is_subset(other_domain))
    }
}
