//! Writes Quartus-style memory initialization files.
use std::io::{self, Write};
use super::ast::Word;

/// Number of words in the target memory.
pub const DEPTH: usize = 256;

/// Writes `words` as a 256x16 memory image. Addresses past the end of the
/// program are filled with all ones.
pub fn write<W: Write>(out: &mut W, name: &str, words: &[Word]) -> io::Result<()> {
    writeln!(out, "-- {}", name)?;
    writeln!(out, "DEPTH = {};", DEPTH)?;
    writeln!(out, "WIDTH = 16;")?;
    writeln!(out, "ADDRESS_RADIX = HEX;")?;
    writeln!(out, "DATA_RADIX = BIN;")?;
    writeln!(out, "CONTENT")?;
    writeln!(out, "BEGIN")?;

    for (addr, word) in words.iter().enumerate() {
        writeln!(out, "{:02X} : {};", addr, word)?;
    }

    if words.len() < DEPTH {
        writeln!(out, "[{:02X}..{:02X}] : {};", words.len(), DEPTH - 1, Word::FILL)?;
    }

    writeln!(out, "END;")
}
