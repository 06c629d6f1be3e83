//! This module implements grid-filling using a depth-first backtracking search. Before searching we
//! enforce node consistency and establish arc consistency with AC-3; during the search we pick
//! slots with the minimum-remaining-values heuristic (ties broken by degree) and try words in
//! least-constraining-value order. By default we also maintain arc consistency after every
//! tentative choice, which prunes the same branches earlier without changing which fills are
//! reachable.

use std::cmp::Reverse;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

use crate::arc_consistency::{self, ArcConsistencyResult};
use crate::assignment::{self, Assignment};
use crate::domains::Domains;
use crate::grid::Grid;
use crate::types::{SlotId, WordId};
use crate::util::{build_glyph_counts_for_cell, glyph_at, GlyphCounts};
use crate::word_list::WordList;
use crate::CHECK_INVARIANTS;

/// How many states should we visit between checks of the deadline and the abort flag?
pub const INTERRUPT_FREQUENCY: usize = 10;

/// A struct tracking stats about the filling process.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    /// Number of search states visited (calls into the recursive search).
    pub states: usize,

    /// Number of tentative choices that were retracted.
    pub backtracks: usize,

    pub total_time: Duration,
    pub initial_arc_consistency_time: Duration,
    pub propagation_time: Duration,
}

/// Optional bounds on a fill attempt. The search itself has no notion of time, so callers that
/// need an answer quickly can cap it here.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchLimits<'a> {
    pub max_backtracks: Option<usize>,
    pub timeout: Option<Duration>,

    /// An optional atomic flag that can be set to signal that the fill should be canceled.
    pub abort: Option<&'a AtomicBool>,
}

/// Settings for a fill attempt.
#[derive(Debug, Clone, Copy)]
pub struct FillOptions<'a> {
    /// Should we run AC-3 after each tentative choice, or only once before the search starts?
    pub maintain_arc_consistency: bool,

    pub limits: SearchLimits<'a>,
}

impl Default for FillOptions<'_> {
    fn default() -> Self {
        FillOptions {
            maintain_arc_consistency: true,
            limits: SearchLimits::default(),
        }
    }
}

/// A struct representing the results of a successful fill operation.
#[derive(Debug)]
pub struct FillSuccess {
    pub statistics: Statistics,
    pub assignment: Assignment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillFailure {
    /// The grid can't be filled with this word list.
    HardFailure,
    Timeout,
    Abort,
    ExceededBacktrackLimit(usize),
}

/// The state of a single fill attempt: borrowed, immutable grid and word list, plus the domain
/// store it owns and narrows as it goes.
pub struct Solver<'a> {
    grid: &'a Grid,
    word_list: &'a WordList,
    domains: Domains,
    options: FillOptions<'a>,
    deadline: Option<Instant>,
    statistics: Statistics,
}

impl<'a> Solver<'a> {
    /// Create a solver with default options: arc consistency maintained during search, no limits.
    #[must_use]
    pub fn new(grid: &'a Grid, word_list: &'a WordList) -> Solver<'a> {
        Solver::with_options(grid, word_list, FillOptions::default())
    }

    /// Create a solver with the given options. Every slot's domain starts out as the whole word
    /// list; any timeout starts counting now.
    #[must_use]
    pub fn with_options(
        grid: &'a Grid,
        word_list: &'a WordList,
        options: FillOptions<'a>,
    ) -> Solver<'a> {
        Solver {
            grid,
            word_list,
            domains: Domains::new(grid, word_list),
            options,
            deadline: options.limits.timeout.map(|timeout| Instant::now() + timeout),
            statistics: Statistics::default(),
        }
    }

    #[must_use]
    pub fn domains(&self) -> &Domains {
        &self.domains
    }

    #[must_use]
    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    pub fn enforce_node_consistency(&mut self) {
        arc_consistency::enforce_node_consistency(self.grid, self.word_list, &mut self.domains);
    }

    pub fn revise(&mut self, x: SlotId, y: SlotId) -> bool {
        arc_consistency::revise(self.grid, self.word_list, &mut self.domains, x, y)
    }

    pub fn ac3(&mut self, arcs: Option<Vec<(SlotId, SlotId)>>) -> ArcConsistencyResult {
        arc_consistency::ac3(self.grid, self.word_list, &mut self.domains, arcs)
    }

    #[must_use]
    pub fn consistent(&self, assignment: &Assignment) -> bool {
        assignment::consistent(self.grid, self.word_list, assignment)
    }

    /// Choose the unassigned slot with the fewest remaining candidates, breaking ties in favor of
    /// the slot with the most crossings and then the lowest id. Returns `None` if every slot is
    /// assigned.
    #[must_use]
    pub fn select_unassigned_variable(&self, assignment: &Assignment) -> Option<SlotId> {
        assignment.unassigned(self.grid).min_by_key(|&slot_id| {
            (
                self.domains.len(slot_id),
                Reverse(self.grid.neighbors(slot_id).len()),
            )
        })
    }

    /// Return the candidates for a slot ordered by how many options each one would rule out in
    /// the domains of unassigned crossing slots, fewest first. Ties keep word-list order.
    #[must_use]
    pub fn order_domain_values(&self, slot_id: SlotId, assignment: &Assignment) -> Vec<WordId> {
        // For each unassigned crossing: our cell index, the crossing's glyph counts in its cell,
        // and the crossing's domain size.
        let crossing_counts: Vec<(usize, GlyphCounts, usize)> = self
            .grid
            .neighbors(slot_id)
            .iter()
            .filter(|&&neighbor| !assignment.contains(neighbor))
            .filter_map(|&neighbor| {
                let (cell_idx, neighbor_cell_idx) = self.grid.overlap(slot_id, neighbor)?;
                Some((
                    cell_idx,
                    build_glyph_counts_for_cell(
                        self.word_list,
                        neighbor_cell_idx,
                        self.domains.get(neighbor),
                    ),
                    self.domains.len(neighbor),
                ))
            })
            .collect();

        let mut options: Vec<WordId> = self.domains.get(slot_id).iter().copied().collect();

        options.sort_by_cached_key(|&word_id| {
            crossing_counts
                .iter()
                .map(|(cell_idx, glyph_counts, domain_size)| {
                    let compatible = glyph_at(self.word_list, word_id, *cell_idx)
                        .map_or(0, |glyph| glyph_counts[glyph] as usize);
                    domain_size - compatible
                })
                .sum::<usize>()
        });

        options
    }

    /// Search for a complete, consistent extension of `assignment`. `Ok(None)` means every
    /// branch was exhausted; an `Err` means the search was cut off by one of the limits.
    pub fn backtrack(
        &mut self,
        mut assignment: Assignment,
    ) -> Result<Option<Assignment>, FillFailure> {
        if self.search(&mut assignment)? {
            Ok(Some(assignment))
        } else {
            Ok(None)
        }
    }

    /// Enforce node consistency, establish arc consistency, and then search from an empty
    /// assignment.
    pub fn find_fill(&mut self) -> Result<FillSuccess, FillFailure> {
        let start = Instant::now();
        info!(
            slots = self.grid.slot_count(),
            words = self.word_list.len(),
            maintain_arc_consistency = self.options.maintain_arc_consistency,
            "starting fill"
        );

        // If we can't even establish initial consistency, we're obviously not going to be able to
        // find a fill, and there's no point starting the search.
        self.enforce_node_consistency();
        if let Some(slot_id) = (0..self.grid.slot_count()).find(|&id| self.domains.is_empty(id)) {
            info!(slot = %self.grid.variable(slot_id), "no word fits slot");
            return Err(FillFailure::HardFailure);
        }
        let initial_result = self.ac3(None);
        self.statistics.initial_arc_consistency_time = start.elapsed();
        debug!(
            domain_sizes = ?self.domains.sizes(),
            elapsed = ?self.statistics.initial_arc_consistency_time,
            "established initial arc consistency"
        );
        if initial_result.is_err() {
            info!("grid is not arc-consistent");
            return Err(FillFailure::HardFailure);
        }

        // Nothing the search does can undo the initial eliminations.
        self.domains.commit();

        let result = self.backtrack(Assignment::new());
        self.statistics.total_time = start.elapsed();

        match result {
            Ok(Some(assignment)) => {
                if CHECK_INVARIANTS && !self.consistent(&assignment) {
                    panic!("Search produced an inconsistent fill?");
                }
                info!(
                    states = self.statistics.states,
                    backtracks = self.statistics.backtracks,
                    elapsed = ?self.statistics.total_time,
                    "found fill"
                );
                Ok(FillSuccess {
                    statistics: self.statistics.clone(),
                    assignment,
                })
            }
            Ok(None) => {
                info!(
                    states = self.statistics.states,
                    backtracks = self.statistics.backtracks,
                    "search exhausted"
                );
                Err(FillFailure::HardFailure)
            }
            Err(failure) => {
                info!(?failure, states = self.statistics.states, "fill interrupted");
                Err(failure)
            }
        }
    }

    /// Run the whole fill process, returning `None` if no fill exists. With limits configured,
    /// hitting a limit also yields `None`; use `find_fill` to tell the cases apart.
    pub fn solve(mut self) -> Option<Assignment> {
        self.find_fill().ok().map(|success| success.assignment)
    }

    /// The recursive core of `backtrack`. On success `assignment` holds the complete fill; on
    /// exhaustion it's back to the state it was passed in.
    fn search(&mut self, assignment: &mut Assignment) -> Result<bool, FillFailure> {
        self.statistics.states += 1;
        self.check_interrupts()?;

        let Some(slot_id) = self.select_unassigned_variable(assignment) else {
            return Ok(true);
        };

        for word_id in self.order_domain_values(slot_id, assignment) {
            trace!(
                slot = %self.grid.variable(slot_id),
                word = %self.word_list.word(word_id).normalized_string,
                "trying word"
            );
            assignment.insert(slot_id, word_id);

            if self.consistent(assignment) {
                let checkpoint = if self.options.maintain_arc_consistency {
                    self.propagate_choice(slot_id, word_id, assignment)
                } else {
                    Ok(None)
                };

                if let Ok(checkpoint) = checkpoint {
                    if self.search(assignment)? {
                        return Ok(true);
                    }
                    if let Some((checkpoint, snapshot)) = checkpoint {
                        self.domains.restore(checkpoint);
                        if CHECK_INVARIANTS && snapshot.as_ref() != Some(&self.domains) {
                            panic!("Restoring a checkpoint didn't restore the domains?");
                        }
                    }
                }
            }

            assignment.remove(slot_id);
            self.statistics.backtracks += 1;

            if let Some(max_backtracks) = self.options.limits.max_backtracks {
                if self.statistics.backtracks > max_backtracks {
                    return Err(FillFailure::ExceededBacktrackLimit(self.statistics.backtracks));
                }
            }
        }

        Ok(false)
    }

    /// Narrow the chosen slot's domain to its word and propagate that to the unassigned crossing
    /// slots. On success, return the elimination-log checkpoint from before the choice so it can
    /// be undone when the choice is retracted (plus a full copy of the domains when checking
    /// invariants); on a wipeout the domains have already been restored.
    #[allow(clippy::type_complexity)]
    fn propagate_choice(
        &mut self,
        slot_id: SlotId,
        word_id: WordId,
        assignment: &Assignment,
    ) -> Result<Option<(usize, Option<Domains>)>, ()> {
        let start = Instant::now();
        let checkpoint = self.domains.checkpoint();
        let snapshot = CHECK_INVARIANTS.then(|| self.domains.clone());

        self.domains.collapse(slot_id, word_id);
        let arcs: Vec<(SlotId, SlotId)> = self
            .grid
            .neighbors(slot_id)
            .iter()
            .filter(|&&neighbor| !assignment.contains(neighbor))
            .map(|&neighbor| (neighbor, slot_id))
            .collect();

        let result = self.ac3(Some(arcs));
        self.statistics.propagation_time += start.elapsed();

        match result {
            Ok(_) => {
                if let Some(snapshot) = &snapshot {
                    if !self.domains.is_subset_of(snapshot) {
                        panic!("Propagation grew a domain?");
                    }
                }
                Ok(Some((checkpoint, snapshot)))
            }
            Err(_) => {
                self.domains.restore(checkpoint);
                Err(())
            }
        }
    }

    fn check_interrupts(&self) -> Result<(), FillFailure> {
        // Check on the first state and then every `INTERRUPT_FREQUENCY` states.
        if (self.statistics.states - 1) % INTERRUPT_FREQUENCY != 0 {
            return Ok(());
        }

        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(FillFailure::Timeout);
            }
        }
        if let Some(abort) = self.options.limits.abort {
            if abort.load(Ordering::Relaxed) {
                return Err(FillFailure::Abort);
            }
        }

        Ok(())
    }
}

/// Search for a valid fill for the given grid, within whatever limits `options` sets.
pub fn find_fill(
    grid: &Grid,
    word_list: &WordList,
    options: &FillOptions,
) -> Result<FillSuccess, FillFailure> {
    Solver::with_options(grid, word_list, *options).find_fill()
}

/// Fill the grid, or return `None` if that's impossible with this word list.
#[must_use]
pub fn solve(grid: &Grid, word_list: &WordList) -> Option<Assignment> {
    Solver::new(grid, word_list).solve()
}
