use clap::Parser;
use gridfill::backtracking_search::{find_fill, FillFailure, FillOptions, SearchLimits};
use gridfill::grid::Grid;
use gridfill::render::{render_grid, render_svg};
use gridfill::word_list::WordList;
use std::fmt::{Debug, Formatter};
use std::fs;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// generate: Command-line crossword generation tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the structure file, as text with # representing blocks and _ representing empty
    /// squares
    structure: String,

    /// Path to the word list file, with one word per line
    words: String,

    /// Path to write an SVG image of the filled grid to
    output: Option<String>,

    /// Only establish arc consistency once, before the search starts
    #[arg(long)]
    no_propagation: bool,

    /// Give up after this many backtracks [default: none]
    #[arg(long)]
    max_backtracks: Option<usize>,

    /// Give up after this many seconds [default: none]
    #[arg(long)]
    timeout_secs: Option<u64>,
}

/// Printed instead of a grid when the grid can't be filled with the given words.
const NO_SOLUTION: &str = "No solution.";

struct Error(String);

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0) // Print error unquoted
    }
}

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gridfill=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    println!("{}", generate(&args)?);

    Ok(())
}

/// Fill the grid described by `args`, writing the SVG if asked to, and return the text to print.
fn generate(args: &Args) -> Result<String, Error> {
    let grid = Grid::from_file(&args.structure).map_err(|err| Error(err.to_string()))?;

    let word_list = WordList::from_file(&args.words, Some(grid.width.max(grid.height)));

    #[allow(clippy::comparison_chain)]
    if let Some(errors) = word_list.get_source_errors().get("0") {
        if errors.len() == 1 {
            return Err(Error(format!("{}", errors[0])));
        } else if errors.len() > 1 {
            let mut full_error: String = "".into();
            for error in errors {
                full_error.push_str(&format!("\n- {error}"));
            }
            return Err(Error(full_error));
        }
    }

    let options = FillOptions {
        maintain_arc_consistency: !args.no_propagation,
        limits: SearchLimits {
            max_backtracks: args.max_backtracks,
            timeout: args.timeout_secs.map(Duration::from_secs),
            abort: None,
        },
    };

    let result = match find_fill(&grid, &word_list, &options) {
        Ok(result) => result,
        Err(FillFailure::HardFailure) => return Ok(NO_SOLUTION.into()),
        Err(FillFailure::Timeout) => return Err(Error("Timed out looking for a fill".into())),
        Err(FillFailure::Abort) => return Err(Error("Fill was aborted".into())),
        Err(FillFailure::ExceededBacktrackLimit(backtracks)) => {
            return Err(Error(format!("Gave up after {backtracks} backtracks")))
        }
    };

    let rendered =
        render_grid(&grid, &word_list, &result.assignment).map_err(|err| Error(err.to_string()))?;

    if let Some(output) = &args.output {
        let svg = render_svg(&grid, &word_list, &result.assignment)
            .map_err(|err| Error(err.to_string()))?;
        fs::write(output, svg).map_err(|_| Error(format!("Couldn't write file '{output}'")))?;
    }

    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use crate::{generate, Args, NO_SOLUTION};
    use clap::Parser;
    use std::fs;
    use std::path::PathBuf;

    fn write_temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("gridfill-{}-{name}", std::process::id()));
        fs::write(&path, contents).unwrap();
        path
    }

    fn args(parts: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("generate").chain(parts.iter().copied())).unwrap()
    }

    #[test]
    fn test_words_too_long_for_grid_is_no_solution() {
        let structure = write_temp_file("short.grid", "___\n");
        let words = write_temp_file("long.words", "helloworld\n");

        let output =
            generate(&args(&[structure.to_str().unwrap(), words.to_str().unwrap()])).unwrap();

        assert_eq!(output, NO_SOLUTION);
    }

    #[test]
    fn test_fills_grid_and_writes_svg() {
        let structure = write_temp_file("cross.grid", "_##\n___\n_##\n");
        let words = write_temp_file("cross.words", "cat;50\ndog;40\nact;30\n");
        let image = std::env::temp_dir().join(format!("gridfill-{}-cross.svg", std::process::id()));

        let output = generate(&args(&[
            structure.to_str().unwrap(),
            words.to_str().unwrap(),
            image.to_str().unwrap(),
            "--no-propagation",
        ]))
        .unwrap();

        assert!(output == "C██\nACT\nT██" || output == "A██\nCAT\nT██");
        assert!(fs::read_to_string(&image).unwrap().starts_with("<svg"));
    }

    #[test]
    fn test_missing_structure_file_is_an_error() {
        let words = write_temp_file("missing.words", "cat\n");

        let result = generate(&args(&["/definitely/not/a/real.grid", words.to_str().unwrap()]));

        assert!(result.is_err());
    }
}
