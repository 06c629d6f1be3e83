use std::collections::{BTreeMap, HashSet};

use crate::grid::{Grid, Variable};
use crate::types::{SlotId, WordId};
use crate::util::glyph_at;
use crate::word_list::WordList;

/// A struct recording a slot assignment made during a fill process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice {
    pub slot_id: SlotId,
    pub word_id: WordId,
}

/// A mapping from slot to the single word chosen for it. During search this is partial; a
/// solution assigns every slot in the grid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assignment {
    word_ids: BTreeMap<SlotId, WordId>,
}

impl Assignment {
    #[must_use]
    pub fn new() -> Assignment {
        Assignment::default()
    }

    /// Assign a word to a slot, returning the word it replaced, if any.
    pub fn insert(&mut self, slot_id: SlotId, word_id: WordId) -> Option<WordId> {
        self.word_ids.insert(slot_id, word_id)
    }

    pub fn remove(&mut self, slot_id: SlotId) -> Option<WordId> {
        self.word_ids.remove(&slot_id)
    }

    #[must_use]
    pub fn get(&self, slot_id: SlotId) -> Option<WordId> {
        self.word_ids.get(&slot_id).copied()
    }

    #[must_use]
    pub fn contains(&self, slot_id: SlotId) -> bool {
        self.word_ids.contains_key(&slot_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.word_ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.word_ids.is_empty()
    }

    /// Does every slot in the grid have a word?
    #[must_use]
    pub fn is_complete(&self, grid: &Grid) -> bool {
        (0..grid.slot_count()).all(|slot_id| self.contains(slot_id))
    }

    /// The slots in the grid that don't have a word yet.
    pub fn unassigned<'a>(&'a self, grid: &Grid) -> impl Iterator<Item = SlotId> + 'a {
        (0..grid.slot_count()).filter(move |&slot_id| !self.contains(slot_id))
    }

    /// The choices making up this assignment, in `SlotId` order.
    pub fn choices(&self) -> impl Iterator<Item = Choice> + '_ {
        self.word_ids.iter().map(|(&slot_id, &word_id)| Choice { slot_id, word_id })
    }

    /// The word assigned to a slot, as a normalized string.
    #[must_use]
    pub fn word<'a>(&self, word_list: &'a WordList, slot_id: SlotId) -> Option<&'a str> {
        self.get(slot_id)
            .map(|word_id| word_list.word(word_id).normalized_string.as_str())
    }

    /// The word assigned to a variable, if the variable is part of the grid and has a word.
    #[must_use]
    pub fn word_for<'a>(
        &self,
        grid: &Grid,
        word_list: &'a WordList,
        variable: &Variable,
    ) -> Option<&'a str> {
        self.word(word_list, grid.slot_id(variable)?)
    }

    /// Resolve the assignment to variables and word strings.
    #[must_use]
    pub fn to_words(&self, grid: &Grid, word_list: &WordList) -> BTreeMap<Variable, String> {
        self.choices()
            .map(|Choice { slot_id, word_id }| {
                (
                    *grid.variable(slot_id),
                    word_list.word(word_id).normalized_string.clone(),
                )
            })
            .collect()
    }
}

/// Check whether an assignment (partial or complete) is consistent: no word is used twice, every
/// word fits its slot's length, and every pair of assigned crossing slots agrees on the letter in
/// their shared cell. Crossing slots that aren't assigned yet are skipped.
#[must_use]
pub fn consistent(grid: &Grid, word_list: &WordList, assignment: &Assignment) -> bool {
    let mut seen_words: HashSet<WordId> = HashSet::with_capacity(assignment.len());

    for Choice { slot_id, word_id } in assignment.choices() {
        if !seen_words.insert(word_id) {
            return false;
        }

        if word_list.word(word_id).len() != grid.variable(slot_id).length {
            return false;
        }

        for &neighbor in grid.neighbors(slot_id) {
            let Some(neighbor_word_id) = assignment.get(neighbor) else {
                continue;
            };
            let Some((cell_idx, neighbor_cell_idx)) = grid.overlap(slot_id, neighbor) else {
                continue;
            };

            if glyph_at(word_list, word_id, cell_idx)
                != glyph_at(word_list, neighbor_word_id, neighbor_cell_idx)
            {
                return false;
            }
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use crate::assignment::{consistent, Assignment};
    use crate::grid::{Direction, Grid, Variable};
    use crate::word_list::WordList;

    fn cross() -> Grid {
        // Across slot 0 at row 1 crosses down slot 1 at column 0, sharing across[0] and down[1].
        Grid::from_template_string(
            "
            _##
            ___
            _##
            ",
        )
        .unwrap()
    }

    fn assign(word_list: &WordList, words: &[(usize, &str)]) -> Assignment {
        let mut assignment = Assignment::new();
        for &(slot_id, word) in words {
            assignment.insert(slot_id, word_list.word_id(word).unwrap());
        }
        assignment
    }

    #[test]
    fn test_empty_assignment_is_consistent() {
        let grid = cross();
        let word_list = WordList::from_words(&["cat"]);

        assert!(consistent(&grid, &word_list, &Assignment::new()));
    }

    #[test]
    fn test_matching_crossing_is_consistent() {
        let grid = cross();
        let word_list = WordList::from_words(&["cat", "act", "dog"]);

        assert_eq!(grid.overlap(0, 1), Some((0, 1)));
        assert!(consistent(
            &grid,
            &word_list,
            &assign(&word_list, &[(0, "act"), (1, "cat")])
        ));
        assert!(!consistent(
            &grid,
            &word_list,
            &assign(&word_list, &[(0, "dog"), (1, "cat")])
        ));
    }

    #[test]
    fn test_unassigned_neighbors_are_skipped() {
        let grid = cross();
        let word_list = WordList::from_words(&["dog"]);

        assert!(consistent(&grid, &word_list, &assign(&word_list, &[(1, "dog")])));
    }

    #[test]
    fn test_wrong_length_is_inconsistent() {
        let grid = cross();
        let word_list = WordList::from_words(&["cats"]);

        assert!(!consistent(&grid, &word_list, &assign(&word_list, &[(0, "cats")])));
    }

    #[test]
    fn test_repeated_word_is_inconsistent() {
        let grid = Grid::from_template_string(
            "
            ___
            ###
            ___
            ",
        )
        .unwrap();
        let word_list = WordList::from_words(&["cat", "dog"]);

        assert!(consistent(
            &grid,
            &word_list,
            &assign(&word_list, &[(0, "cat"), (1, "dog")])
        ));
        assert!(!consistent(
            &grid,
            &word_list,
            &assign(&word_list, &[(0, "cat"), (1, "cat")])
        ));
    }

    #[test]
    fn test_completeness_and_lookup() {
        let grid = cross();
        let word_list = WordList::from_words(&["cat", "act"]);
        let mut assignment = assign(&word_list, &[(0, "act")]);

        assert!(!assignment.is_complete(&grid));
        assert_eq!(assignment.unassigned(&grid).collect::<Vec<_>>(), vec![1]);

        assignment.insert(1, word_list.word_id("cat").unwrap());
        assert!(assignment.is_complete(&grid));

        let down = Variable::new(0, 0, Direction::Down, 3);
        assert_eq!(assignment.word_for(&grid, &word_list, &down), Some("CAT"));
        assert_eq!(assignment.to_words(&grid, &word_list).get(&down).map(String::as_str), Some("CAT"));

        assert_eq!(assignment.remove(1), word_list.word_id("cat"));
        assert!(!assignment.contains(1));
    }
}
