//! Turning a complete assignment into letters on the grid, for the console or as an SVG image.

use crate::assignment::{Assignment, Choice};
use crate::error::RenderError;
use crate::grid::Grid;
use crate::word_list::WordList;

pub const BLOCK_CHAR: char = '█';

const CELL_SIZE: usize = 100;
const CELL_BORDER: usize = 2;
const FONT_SIZE: usize = 80;

/// Lay the assigned words out on the grid. Cells that aren't part of any slot keep whatever letter
/// was prefilled in them, if any. The assignment has to be complete, and every word has to be as
/// long as its slot.
pub fn letter_grid(
    grid: &Grid,
    word_list: &WordList,
    assignment: &Assignment,
) -> Result<Vec<Vec<Option<char>>>, RenderError> {
    if !assignment.is_complete(grid) {
        return Err(RenderError::IncompleteAssignment {
            unassigned: assignment
                .unassigned(grid)
                .map(|slot_id| *grid.variable(slot_id))
                .collect(),
        });
    }

    let mut letters = grid.fill.clone();

    for Choice { slot_id, word_id } in assignment.choices() {
        let variable = grid.variable(slot_id);
        let word = word_list.word(word_id);
        if word.len() != variable.length {
            return Err(RenderError::WordLengthMismatch {
                variable: *variable,
                word: word.normalized_string.clone(),
            });
        }

        for (cell_idx, &glyph) in word.glyphs.iter().enumerate() {
            let (row, col) = variable.cell_coord(cell_idx);
            letters[row][col] = Some(word_list.glyphs[glyph]);
        }
    }

    Ok(letters)
}

/// Render a filled grid as text, one line per row.
pub fn render_grid(
    grid: &Grid,
    word_list: &WordList,
    assignment: &Assignment,
) -> Result<String, RenderError> {
    let letters = letter_grid(grid, word_list, assignment)?;

    Ok(letters
        .iter()
        .enumerate()
        .map(|(row, cells)| {
            cells
                .iter()
                .enumerate()
                .map(|(col, cell)| {
                    if grid.is_fillable(row, col) {
                        cell.unwrap_or(' ')
                    } else {
                        BLOCK_CHAR
                    }
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n"))
}

/// Render a filled grid as an SVG document: white squares with centered letters on a black
/// background, so blocked cells and the borders between squares come out black.
pub fn render_svg(
    grid: &Grid,
    word_list: &WordList,
    assignment: &Assignment,
) -> Result<String, RenderError> {
    let letters = letter_grid(grid, word_list, assignment)?;

    let width = grid.width * CELL_SIZE;
    let height = grid.height * CELL_SIZE;

    let mut svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" \
         viewBox=\"0 0 {width} {height}\">\n\
         <rect width=\"{width}\" height=\"{height}\" fill=\"black\"/>\n"
    );

    for (row, cells) in letters.iter().enumerate() {
        for (col, cell) in cells.iter().enumerate() {
            if grid.is_fillable(row, col) {
                svg.push_str(&svg_cell(row, col, *cell));
            }
        }
    }

    svg.push_str("</svg>\n");

    Ok(svg)
}

/// The SVG elements for one fillable cell: its white square, and its letter if it has one.
fn svg_cell(row: usize, col: usize, letter: Option<char>) -> String {
    let interior_size = CELL_SIZE - 2 * CELL_BORDER;

    let mut elements = format!(
        "<rect x=\"{}\" y=\"{}\" width=\"{interior_size}\" height=\"{interior_size}\" \
         fill=\"white\"/>\n",
        col * CELL_SIZE + CELL_BORDER,
        row * CELL_SIZE + CELL_BORDER,
    );

    if let Some(letter) = letter {
        elements.push_str(&format!(
            "<text x=\"{}\" y=\"{}\" font-family=\"sans-serif\" font-size=\"{FONT_SIZE}\" \
             text-anchor=\"middle\" dominant-baseline=\"central\" fill=\"black\">{}</text>\n",
            col * CELL_SIZE + CELL_SIZE / 2,
            row * CELL_SIZE + CELL_SIZE / 2,
            escape_xml(letter),
        ));
    }

    elements
}

fn escape_xml(ch: char) -> String {
    match ch {
        '&' => "&amp;".into(),
        '<' => "&lt;".into(),
        '>' => "&gt;".into(),
        '"' => "&quot;".into(),
        '\'' => "&apos;".into(),
        _ => ch.to_string(),
    }
}
