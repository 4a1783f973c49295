//! Terminal output: screen reset, header, aligned table, formatting helpers.

pub mod header;
pub mod util;

use std::io::Write;

use tabwriter::TabWriter;

/// Elastic-tab table over `out`; every column is at least 20 wide and 3 apart.
pub fn table<W: Write>(out: W) -> TabWriter<W> {
    TabWriter::new(out).minwidth(20).padding(3)
}
