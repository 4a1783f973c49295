//! Screen reset and column header drawn at the start of every refresh.

use std::io::{self, Write};

use crossterm::{
    cursor::MoveTo,
    queue,
    terminal::{Clear, ClearType},
};

pub const HEADER: &str = "CONTAINER\tCPU %\tMEM USAGE/LIMIT\tMEM %\tNET I/O\n";

/// Clear the terminal and home the cursor. Goes straight to the terminal, not through the table.
pub fn clear_screen<W: Write>(term: &mut W) -> io::Result<()> {
    queue!(term, Clear(ClearType::All), MoveTo(0, 0))
}

pub fn draw_header<W: Write>(tw: &mut W) -> io::Result<()> {
    tw.write_all(HEADER.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_screen_resets_and_homes() {
        let mut out = Vec::new();
        clear_screen(&mut out).unwrap();
        assert_eq!(out, b"\x1b[2J\x1b[1;1H");
    }
}
