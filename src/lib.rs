pub mod arc_consistency;
pub mod assignment;
pub mod backtracking_search;
pub mod domains;
pub mod error;
pub mod grid;
pub mod render;
pub mod types;
pub mod util;
pub mod word_list;

pub const CHECK_INVARIANTS: bool = cfg!(feature = "check_invariants");

/// The expected maximum number of distinct characters appearing in a word list.
pub const MAX_GLYPH_COUNT: usize = 256;

/// The expected maximum length for a single slot.
pub const MAX_SLOT_LENGTH: usize = 21;

pub use assignment::{consistent, Assignment};
pub use backtracking_search::{
    find_fill, solve, FillFailure, FillOptions, FillSuccess, SearchLimits, Solver, Statistics,
};
pub use error::{GridError, RenderError, WordListError};
pub use grid::{Direction, Grid, Variable};
pub use render::{letter_grid, render_grid, render_svg};
pub use word_list::WordList;
