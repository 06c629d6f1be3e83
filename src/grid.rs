//! This module describes the static geometry of a grid: which cells can hold letters, which runs of
//! cells form slots, and where those slots cross. Nothing here changes once a `Grid` is built.

use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

#[cfg(feature = "serde")]
use serde_derive::{Deserialize, Serialize};

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::GridError;
use crate::types::{GridCoord, SlotId};
use crate::word_list::normalize_word;
use crate::MAX_SLOT_LENGTH;

/// Template character for a cell that can't hold a letter.
pub const BLOCK_MARKER: char = '#';

/// Template characters for an empty cell that can hold a letter.
pub const OPEN_MARKERS: [char; 2] = ['_', '.'];

/// The direction that a slot is facing.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    Across,
    Down,
}

impl Direction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Across => "across",
            Direction::Down => "down",
        }
    }
}

/// A slot in the grid: a maximal run of fillable cells in one direction. Two variables are the
/// same slot iff all four fields match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable {
    pub row: usize,
    pub col: usize,
    pub direction: Direction,
    pub length: usize,
}

impl Variable {
    #[must_use]
    pub fn new(row: usize, col: usize, direction: Direction, length: usize) -> Variable {
        Variable {
            row,
            col,
            direction,
            length,
        }
    }

    /// The coords of the cell holding the `cell_idx`th letter of this slot.
    #[must_use]
    pub fn cell_coord(&self, cell_idx: usize) -> GridCoord {
        match self.direction {
            Direction::Across => (self.row, self.col + cell_idx),
            Direction::Down => (self.row + cell_idx, self.col),
        }
    }

    /// Generate the coords for each cell of this slot.
    #[must_use]
    pub fn cell_coords(&self) -> Vec<GridCoord> {
        (0..self.length)
            .map(|cell_idx| self.cell_coord(cell_idx))
            .collect()
    }

    /// Parse a string like "1,2,down,5" into a `Variable`.
    pub fn from_key(key: &str) -> Result<Variable, String> {
        let key_parts: Vec<&str> = key.split(',').map(str::trim).collect();
        if key_parts.len() != 4 {
            return Err(format!("invalid slot key: {key}"));
        }

        let row: Result<usize, _> = key_parts[0].parse();
        let col: Result<usize, _> = key_parts[1].parse();
        let direction: Option<Direction> = match key_parts[2] {
            "across" => Some(Direction::Across),
            "down" => Some(Direction::Down),
            _ => None,
        };
        let length: Result<usize, _> = key_parts[3].parse();

        if let (Ok(row), Ok(col), Some(direction), Ok(length)) = (row, col, direction, length) {
            Ok(Variable::new(row, col, direction, length))
        } else {
            Err(format!("invalid slot key: {key:?}"))
        }
    }

    /// Represent this slot as a string like "1,2,down,5".
    #[must_use]
    pub fn to_key(&self) -> String {
        format!(
            "{},{},{},{}",
            self.row,
            self.col,
            self.direction.as_str(),
            self.length
        )
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}) {} : {}",
            self.row,
            self.col,
            self.direction.as_str(),
            self.length
        )
    }
}

/// Serialize a `Variable` into a string key.
#[cfg(feature = "serde")]
impl Serialize for Variable {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_key())
    }
}

/// Deserialize a `Variable` from a string key.
#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for Variable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw_string = String::deserialize(deserializer)?;
        Variable::from_key(&raw_string).map_err(serde::de::Error::custom)
    }
}

/// A struct representing a crossing between one slot and another, referencing the other slot's id
/// and the location of the intersection within the other slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crossing {
    pub other_slot_id: SlotId,
    pub other_slot_cell: usize,
}

/// A struct representing the aspects of a slot in the grid that are static during filling.
#[derive(Debug, Clone)]
pub struct SlotConfig {
    pub id: SlotId,
    pub variable: Variable,

    /// For each cell of the slot, the slot crossing it there, if any.
    pub crossings: SmallVec<[Option<Crossing>; MAX_SLOT_LENGTH]>,
}

impl SlotConfig {
    #[must_use]
    pub fn length(&self) -> usize {
        self.variable.length
    }
}

/// Find every maximal run of at least two fillable cells, across runs first (row by row) and then
/// down runs (column by column).
#[must_use]
pub fn generate_variables(structure: &[Vec<bool>]) -> Vec<Variable> {
    fn push_run(
        variables: &mut Vec<Variable>,
        start: Option<GridCoord>,
        length: usize,
        direction: Direction,
    ) {
        if let Some((row, col)) = start {
            if length > 1 {
                variables.push(Variable::new(row, col, direction, length));
            }
        }
    }

    let height = structure.len();
    let width = structure.first().map_or(0, Vec::len);
    let mut variables: Vec<Variable> = vec![];

    for row in 0..height {
        let mut start: Option<GridCoord> = None;
        let mut length = 0;
        for col in 0..width {
            if structure[row][col] {
                start.get_or_insert((row, col));
                length += 1;
            } else {
                push_run(&mut variables, start.take(), length, Direction::Across);
                length = 0;
            }
        }
        push_run(&mut variables, start, length, Direction::Across);
    }

    for col in 0..width {
        let mut start: Option<GridCoord> = None;
        let mut length = 0;
        for row in 0..height {
            if structure[row][col] {
                start.get_or_insert((row, col));
                length += 1;
            } else {
                push_run(&mut variables, start.take(), length, Direction::Down);
                length = 0;
            }
        }
        push_run(&mut variables, start, length, Direction::Down);
    }

    variables
}

/// Given the variables in a grid, generate `SlotConfig`s containing derived information about
/// crossings.
#[must_use]
pub fn generate_slot_configs(variables: &[Variable]) -> Vec<SlotConfig> {
    // Build a map from cell location to slots involved, which we can then use to calculate
    // crossings. Each entry is (slot index, cell index within slot).
    let mut slots_by_loc: HashMap<GridCoord, SmallVec<[(SlotId, usize); 2]>> = HashMap::new();

    for (slot_id, variable) in variables.iter().enumerate() {
        for (cell_idx, loc) in variable.cell_coords().into_iter().enumerate() {
            slots_by_loc.entry(loc).or_default().push((slot_id, cell_idx));
        }
    }

    variables
        .iter()
        .enumerate()
        .map(|(slot_id, &variable)| {
            let crossings = variable
                .cell_coords()
                .iter()
                .map(|loc| {
                    // In a 2D grid, a cell belongs to at most one across and one down slot.
                    slots_by_loc[loc]
                        .iter()
                        .find(|&&(other_slot_id, _)| other_slot_id != slot_id)
                        .map(|&(other_slot_id, other_slot_cell)| Crossing {
                            other_slot_id,
                            other_slot_cell,
                        })
                })
                .collect();

            SlotConfig {
                id: slot_id,
                variable,
                crossings,
            }
        })
        .collect()
}

/// An immutable description of a grid: its cells, the slots they form, and how those slots cross.
#[derive(Debug, Clone)]
pub struct Grid {
    pub width: usize,
    pub height: usize,

    /// `structure[row][col]` is true if the cell can hold a letter.
    pub structure: Vec<Vec<bool>>,

    /// Letters given in the template, already normalized. `None` for blocks and empty cells.
    pub fill: Vec<Vec<Option<char>>>,

    /// Config for every slot in the grid, indexed by `SlotId`.
    pub slot_configs: Vec<SlotConfig>,

    /// For each slot, the ids of the slots crossing it, in cell order.
    neighbors: Vec<Vec<SlotId>>,

    slot_id_by_variable: HashMap<Variable, SlotId>,
}

impl Grid {
    /// Build a grid from a structure and an optional set of prefilled letters. `structure` and
    /// `fill` must have the same dimensions. Prefilled letters are normalized like words, and any
    /// letter given for a blocked cell is dropped.
    pub fn new(
        structure: Vec<Vec<bool>>,
        fill: Option<Vec<Vec<Option<char>>>>,
    ) -> Result<Grid, GridError> {
        let height = structure.len();
        let width = structure.first().map(Vec::len).ok_or(GridError::Empty)?;

        for (row, cells) in structure.iter().enumerate() {
            if cells.len() != width {
                return Err(GridError::MalformedRow {
                    row,
                    expected: width,
                    found: cells.len(),
                });
            }
        }

        let mut fill = fill.unwrap_or_else(|| vec![vec![None; width]; height]);
        if fill.len() != height {
            return Err(GridError::FillHeight {
                expected: height,
                found: fill.len(),
            });
        }
        for (row, cells) in fill.iter_mut().enumerate() {
            if cells.len() != width {
                return Err(GridError::MalformedRow {
                    row,
                    expected: width,
                    found: cells.len(),
                });
            }

            for (col, cell) in cells.iter_mut().enumerate() {
                *cell = cell
                    .filter(|_| structure[row][col])
                    .and_then(|ch| normalize_word(&ch.to_string()).chars().next());
            }
        }

        let slot_configs = generate_slot_configs(&generate_variables(&structure));

        let neighbors = slot_configs
            .iter()
            .map(|slot_config| {
                slot_config
                    .crossings
                    .iter()
                    .flatten()
                    .map(|crossing| crossing.other_slot_id)
                    .collect()
            })
            .collect();

        let slot_id_by_variable = slot_configs
            .iter()
            .map(|slot_config| (slot_config.variable, slot_config.id))
            .collect();

        Ok(Grid {
            width,
            height,
            structure,
            fill,
            slot_configs,
            neighbors,
            slot_id_by_variable,
        })
    }

    /// Parse a template string with `#` representing blocks, `_` or `.` representing empty cells,
    /// and any other character representing a cell prefilled with that letter.
    pub fn from_template_string(template: &str) -> Result<Grid, GridError> {
        let rows: Vec<Vec<char>> = template
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| line.chars().collect())
            .collect();

        let structure = rows
            .iter()
            .map(|cells| cells.iter().map(|&c| c != BLOCK_MARKER).collect())
            .collect();

        let fill = rows
            .iter()
            .map(|cells| {
                cells
                    .iter()
                    .map(|&c| {
                        if c == BLOCK_MARKER || OPEN_MARKERS.contains(&c) {
                            None
                        } else {
                            Some(c)
                        }
                    })
                    .collect()
            })
            .collect();

        Grid::new(structure, Some(fill))
    }

    /// Read and parse a template file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Grid, GridError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| GridError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Grid::from_template_string(&contents)
    }

    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slot_configs.len()
    }

    /// All variables in the grid, in `SlotId` order.
    pub fn variables(&self) -> impl Iterator<Item = &Variable> + '_ {
        self.slot_configs
            .iter()
            .map(|slot_config| &slot_config.variable)
    }

    #[must_use]
    pub fn variable(&self, slot_id: SlotId) -> &Variable {
        &self.slot_configs[slot_id].variable
    }

    #[must_use]
    pub fn slot_id(&self, variable: &Variable) -> Option<SlotId> {
        self.slot_id_by_variable.get(variable).copied()
    }

    /// The ids of the slots that share a cell with the given slot.
    #[must_use]
    pub fn neighbors(&self, slot_id: SlotId) -> &[SlotId] {
        &self.neighbors[slot_id]
    }

    /// If slots `a` and `b` share a cell, return the index of that cell within `a` and within `b`.
    #[must_use]
    pub fn overlap(&self, a: SlotId, b: SlotId) -> Option<(usize, usize)> {
        self.slot_configs[a]
            .crossings
            .iter()
            .enumerate()
            .find_map(|(cell_idx, crossing)| match crossing {
                Some(crossing) if crossing.other_slot_id == b => {
                    Some((cell_idx, crossing.other_slot_cell))
                }
                _ => None,
            })
    }

    /// Like `overlap`, but addressed by variable. Variables that aren't part of this grid never
    /// overlap anything.
    #[must_use]
    pub fn overlap_for(&self, a: &Variable, b: &Variable) -> Option<(usize, usize)> {
        self.overlap(self.slot_id(a)?, self.slot_id(b)?)
    }

    #[must_use]
    pub fn is_fillable(&self, row: usize, col: usize) -> bool {
        self.structure
            .get(row)
            .and_then(|cells| cells.get(col))
            .copied()
            .unwrap_or(false)
    }

    #[must_use]
    pub fn prefilled(&self, row: usize, col: usize) -> Option<char> {
        self.fill.get(row).and_then(|cells| cells.get(col)).copied().flatten()
    }
}

#[cfg(test)]
mod tests {
    use crate::error::GridError;
    use crate::grid::{Direction, Grid, Variable};

    #[test]
    fn test_single_row() {
        let grid = Grid::from_template_string("_____").unwrap();

        assert_eq!((grid.height, grid.width), (1, 5));
        assert_eq!(
            grid.variables().copied().collect::<Vec<_>>(),
            vec![Variable::new(0, 0, Direction::Across, 5)]
        );
        assert!(grid.neighbors(0).is_empty());
    }

    #[test]
    fn test_single_cells_are_not_slots() {
        let grid = Grid::from_template_string(
            "
            _#_
            ###
            _#_
            ",
        )
        .unwrap();

        assert_eq!(grid.slot_count(), 0);
    }

    #[test]
    fn test_discovers_slots_and_overlaps() {
        let grid = Grid::from_template_string(
            "
            #_#
            ___
            #_#
            ",
        )
        .unwrap();

        let across = Variable::new(1, 0, Direction::Across, 3);
        let down = Variable::new(0, 1, Direction::Down, 3);
        assert_eq!(
            grid.variables().copied().collect::<Vec<_>>(),
            vec![across, down]
        );

        assert_eq!(grid.overlap_for(&across, &down), Some((1, 1)));
        assert_eq!(grid.neighbors(0), &[1]);
        assert_eq!(grid.neighbors(1), &[0]);
    }

    #[test]
    fn test_overlaps_are_symmetric() {
        let grid = Grid::from_template_string(
            "
            #___#
            _____
            __#__
            _____
            #___#
            ",
        )
        .unwrap();

        for a in 0..grid.slot_count() {
            assert_eq!(grid.overlap(a, a), None);

            for b in 0..grid.slot_count() {
                if let Some((p, q)) = grid.overlap(a, b) {
                    assert_eq!(grid.overlap(b, a), Some((q, p)));
                    assert_eq!(
                        grid.variable(a).cell_coord(p),
                        grid.variable(b).cell_coord(q),
                    );
                    assert!(grid.neighbors(a).contains(&b));
                } else {
                    assert_eq!(grid.overlap(b, a), None);
                    assert!(!grid.neighbors(a).contains(&b));
                }
            }
        }
    }

    #[test]
    fn test_rejects_ragged_rows() {
        let result = Grid::from_template_string(
            "
            ___
            __
            ___
            ",
        );

        assert!(matches!(
            result,
            Err(GridError::MalformedRow {
                row: 1,
                expected: 3,
                found: 2
            })
        ));
    }

    #[test]
    fn test_rejects_empty_template() {
        assert!(matches!(
            Grid::from_template_string("\n  \n"),
            Err(GridError::Empty)
        ));
    }

    #[test]
    fn test_prefilled_letters() {
        let grid = Grid::from_template_string(
            "
            c..
            #.#
            ",
        )
        .unwrap();

        assert_eq!(grid.prefilled(0, 0), Some('C'));
        assert_eq!(grid.prefilled(0, 1), None);
        assert_eq!(grid.prefilled(1, 0), None);
        assert!(grid.is_fillable(0, 0));
        assert!(!grid.is_fillable(1, 0));
        assert!(!grid.is_fillable(5, 5));
    }

    #[test]
    fn test_rejects_fill_with_wrong_dimensions() {
        let structure = vec![vec![true, true], vec![true, true]];

        assert!(matches!(
            Grid::new(structure.clone(), Some(vec![vec![None, None]])),
            Err(GridError::FillHeight {
                expected: 2,
                found: 1
            })
        ));
        assert!(matches!(
            Grid::new(structure, Some(vec![vec![None, None], vec![None]])),
            Err(GridError::MalformedRow {
                row: 1,
                expected: 2,
                found: 1
            })
        ));
    }

    #[test]
    fn test_supplied_fill_is_normalized() {
        let grid = Grid::new(
            vec![vec![true, true], vec![false, true]],
            Some(vec![vec![Some('a'), None], vec![Some('b'), Some(' ')]]),
        )
        .unwrap();

        assert_eq!(grid.prefilled(0, 0), Some('A'));
        // Letters on blocked cells are dropped, and whitespace isn't a letter.
        assert_eq!(grid.prefilled(1, 0), None);
        assert_eq!(grid.prefilled(1, 1), None);
    }

    #[test]
    fn test_slot_key_round_trip() {
        let variable = Variable::new(3, 4, Direction::Down, 12);

        assert_eq!(variable.to_key(), "3,4,down,12");
        assert_eq!(Variable::from_key("3,4,down,12"), Ok(variable));
        assert!(Variable::from_key("3,4,sideways,12").is_err());
        assert!(Variable::from_key("3,4,down").is_err());
    }
}

#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use crate::grid::{Direction, Variable};

    #[test]
    fn test_variable_serialization() {
        let variable = Variable::new(1, 2, Direction::Across, 5);

        let key = serde_json::to_string(&variable).unwrap();

        assert_eq!(key, "\"1,2,across,5\"");
    }

    #[test]
    fn test_variable_deserialization() {
        let variable: Variable = serde_json::from_str("\"3,4,down,12\"").unwrap();

        assert_eq!(variable, Variable::new(3, 4, Direction::Down, 12));
    }
}
