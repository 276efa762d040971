//! The machine tape: a bi-infinite sequence of symbols materialized lazily as a finite
//! vector plus a cursor. Moving past either end appends or prepends one blank cell, so the
//! cursor never leaves the materialized range.

use std::fmt;

use crate::types::{Direction, Symbol, TuringMachineError, Write, BLANK_SYMBOL};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tape {
    cells: Vec<Symbol>,
    cursor: usize,
}

impl Default for Tape {
    fn default() -> Self {
        Self {
            cells: vec![BLANK_SYMBOL.to_string()],
            cursor: 0,
        }
    }
}

impl Tape {
    /// Creates a tape holding a single blank cell.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tape from input symbols with the cursor at `cursor`.
    ///
    /// An empty input yields a single blank cell. The cursor must lie inside the input.
    pub fn from_symbols<I, S>(symbols: I, cursor: usize) -> Result<Self, TuringMachineError>
    where
        I: IntoIterator<Item = S>,
        S: Into<Symbol>,
    {
        let mut cells: Vec<Symbol> = symbols.into_iter().map(Into::into).collect();
        if cells.is_empty() {
            cells.push(BLANK_SYMBOL.to_string());
        }

        if cursor >= cells.len() {
            return Err(TuringMachineError::TapeBoundary);
        }

        Ok(Self { cells, cursor })
    }

    /// Returns the symbol under the cursor.
    pub fn read(&self) -> &str {
        &self.cells[self.cursor]
    }

    /// Writes at the cursor. [`Write::Nothing`] leaves the cell as it is.
    pub fn write(&mut self, write: &Write) {
        if let Write::Symbol(symbol) = write {
            self.cells[self.cursor] = symbol.clone();
        }
    }

    pub fn move_left(&mut self) {
        if self.cursor == 0 {
            // Extend tape to the left; the cursor lands on the new cell
            self.cells.insert(0, BLANK_SYMBOL.to_string());
        } else {
            self.cursor -= 1;
        }
    }

    pub fn move_right(&mut self) {
        if self.cursor + 1 == self.cells.len() {
            self.cells.push(BLANK_SYMBOL.to_string());
        }
        self.cursor += 1;
    }

    pub fn move_neutral(&mut self) {}

    /// Moves the cursor in `direction`.
    pub fn shift(&mut self, direction: Direction) {
        match direction {
            Direction::Left => self.move_left(),
            Direction::Right => self.move_right(),
            Direction::Neutral => self.move_neutral(),
        }
    }

    /// Returns every materialized cell.
    pub fn cells(&self) -> &[Symbol] {
        &self.cells
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Returns the number of materialized cells. Always at least one.
    pub fn width(&self) -> usize {
        self.cells.len()
    }

    /// Returns the written part of the tape, with leading and trailing blanks trimmed.
    pub fn contents(&self) -> Vec<Symbol> {
        let is_written = |cell: &Symbol| cell != BLANK_SYMBOL;

        match (
            self.cells.iter().position(is_written),
            self.cells.iter().rposition(is_written),
        ) {
            (Some(first), Some(last)) => self.cells[first..=last].to_vec(),
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for Tape {
    /// Renders cells separated by `|`, blanks as `_`, the cursor cell in brackets.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, cell) in self.cells.iter().enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }

            let cell = if cell == BLANK_SYMBOL { "_" } else { cell.as_str() };
            if i == self.cursor {
                write!(f, "[{cell}]")?;
            } else {
                f.write_str(cell)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tape_is_single_blank() {
        let tape = Tape::new();

        assert_eq!(tape.cells(), &[String::new()]);
        assert_eq!(tape.cursor(), 0);
        assert_eq!(tape.read(), "");
    }

    #[test]
    fn test_move_left_expands_at_origin() {
        let mut tape = Tape::from_symbols(["a", "b"], 0).unwrap();
        tape.move_left();

        assert_eq!(tape.cells(), &["", "a", "b"]);
        assert_eq!(tape.cursor(), 0);
        assert_eq!(tape.read(), "");
    }

    #[test]
    fn test_move_right_expands_at_end() {
        let mut tape = Tape::from_symbols(["a"], 0).unwrap();
        tape.move_right();

        assert_eq!(tape.cells(), &["a", ""]);
        assert_eq!(tape.cursor(), 1);

        tape.move_left();
        assert_eq!(tape.read(), "a");
        assert_eq!(tape.width(), 2);
    }

    #[test]
    fn test_write_nothing_keeps_cell() {
        let mut tape = Tape::from_symbols(["a"], 0).unwrap();
        tape.write(&Write::Nothing);
        assert_eq!(tape.read(), "a");

        tape.write(&Write::from("b"));
        assert_eq!(tape.read(), "b");
    }

    #[test]
    fn test_neutral_move() {
        let mut tape = Tape::from_symbols(["a", "b"], 1).unwrap();
        tape.shift(Direction::Neutral);

        assert_eq!(tape.cursor(), 1);
        assert_eq!(tape.width(), 2);
    }

    #[test]
    fn test_cursor_outside_input() {
        assert_eq!(
            Tape::from_symbols(["a"], 1),
            Err(TuringMachineError::TapeBoundary)
        );
    }

    #[test]
    fn test_contents_trims_blanks() {
        let tape = Tape::from_symbols(["", "1", "", "0", ""], 0).unwrap();
        assert_eq!(tape.contents(), vec!["1", "", "0"]);
        assert!(Tape::new().contents().is_empty());
    }

    #[test]
    fn test_display() {
        let tape = Tape::from_symbols(["1", "", "0"], 1).unwrap();
        assert_eq!(tape.to_string(), "1|[_]|0");
    }
}
