//! This module contains a crossword-specific implementation of node consistency and the AC-3
//! algorithm. For our purposes, a grid is arc-consistent when every word left in a slot's domain
//! has, at each crossing, at least one word in the crossing slot's domain with the same letter in
//! the shared cell. For example, if 1D doesn't have any options starting with the letter A, we
//! want to remove any options for 1A that start with the letter A.
//!
//! Arc consistency is a local guarantee only: it prunes domains without search, but an
//! arc-consistent grid can still have no fill.

use smallvec::SmallVec;
use std::collections::{HashSet, VecDeque};
use tracing::{debug, trace};

use crate::domains::Domains;
use crate::grid::Grid;
use crate::types::{GlyphId, SlotId};
use crate::util::{build_glyph_counts_for_cell, glyph_at};
use crate::word_list::WordList;
use crate::MAX_SLOT_LENGTH;

/// Result from a successful call to `ac3`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArcConsistencySuccess {
    /// How many arc revisions removed at least one word.
    pub revisions: usize,
}

/// Result from a failed call to `ac3`: some slot's domain was wiped out, so no fill exists under
/// the current domains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArcConsistencyFailure {
    pub wiped_out_slot: SlotId,
}

/// Result from a call to `ac3`.
pub type ArcConsistencyResult = Result<ArcConsistencySuccess, ArcConsistencyFailure>;

/// Remove every word that violates a slot's unary constraints: its length must match the slot's
/// length, and it must agree with any letters prefilled in the slot's cells.
pub fn enforce_node_consistency(grid: &Grid, word_list: &WordList, domains: &mut Domains) {
    for slot_config in &grid.slot_configs {
        let variable = slot_config.variable;

        // A prefilled letter that no word contains maps to `None`, which nothing can match.
        let required_glyphs: SmallVec<[(usize, Option<GlyphId>); MAX_SLOT_LENGTH]> = variable
            .cell_coords()
            .into_iter()
            .enumerate()
            .filter_map(|(cell_idx, (row, col))| {
                grid.prefilled(row, col)
                    .map(|ch| (cell_idx, word_list.glyph_id(ch)))
            })
            .collect();

        domains.retain(slot_config.id, |word_id| {
            let word = word_list.word(word_id);

            word.len() == variable.length
                && required_glyphs
                    .iter()
                    .all(|&(cell_idx, glyph)| glyph == Some(word.glyphs[cell_idx]))
        });
    }

    debug!(domain_sizes = ?domains.sizes(), "enforced node consistency");
}

/// Make slot `x` arc-consistent with slot `y`: remove every word from `x`'s domain that has no
/// compatible word in `y`'s domain at their shared cell. Returns true iff anything was removed.
/// `y`'s domain is never modified, and slots that don't cross are left alone.
pub fn revise(
    grid: &Grid,
    word_list: &WordList,
    domains: &mut Domains,
    x: SlotId,
    y: SlotId,
) -> bool {
    let Some((x_cell, y_cell)) = grid.overlap(x, y) else {
        return false;
    };

    let supported_glyphs = build_glyph_counts_for_cell(word_list, y_cell, domains.get(y));

    let removed = domains.retain(x, |word_id| {
        glyph_at(word_list, word_id, x_cell).map_or(false, |glyph| supported_glyphs[glyph] > 0)
    });
    if removed > 0 {
        trace!(x, y, removed, "revised arc");
    }

    removed > 0
}

/// Every ordered pair of crossing slots in the grid, in `SlotId` order.
pub fn all_arcs(grid: &Grid) -> impl Iterator<Item = (SlotId, SlotId)> + '_ {
    (0..grid.slot_count()).flat_map(move |slot_id| {
        grid.neighbors(slot_id)
            .iter()
            .map(move |&neighbor| (slot_id, neighbor))
    })
}

/// Run AC-3 over the given arcs, or over every arc in the grid if `arcs` is `None`. Arcs are
/// processed first-in, first-out; whenever revising `(x, y)` shrinks `x`'s domain, every arc
/// `(z, x)` with `z != y` is queued again, since `z` may have lost its support in `x`.
pub fn ac3(
    grid: &Grid,
    word_list: &WordList,
    domains: &mut Domains,
    arcs: Option<Vec<(SlotId, SlotId)>>,
) -> ArcConsistencyResult {
    let mut queue: VecDeque<(SlotId, SlotId)> =
        arcs.map_or_else(|| all_arcs(grid).collect(), VecDeque::from);

    // Arcs currently waiting in the queue, so the same arc is never queued twice.
    let mut queued: HashSet<(SlotId, SlotId)> = queue.iter().copied().collect();

    let mut revisions = 0;

    while let Some((x, y)) = queue.pop_front() {
        queued.remove(&(x, y));

        if !revise(grid, word_list, domains, x, y) {
            continue;
        }
        revisions += 1;

        if domains.is_empty(x) {
            debug!(slot = %grid.variable(x), revisions, "domain wipeout");
            return Err(ArcConsistencyFailure { wiped_out_slot: x });
        }

        for &z in grid.neighbors(x) {
            if z != y && queued.insert((z, x)) {
                queue.push_back((z, x));
            }
        }
    }

    Ok(ArcConsistencySuccess { revisions })
}
