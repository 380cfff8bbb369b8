//! The Assembler module is in charge of taking a
//! source file and producing the machine words of
//! a 256 word memory image.
//!
//! It does this in two passes over tokenized lines:
//! the first assigns addresses to labels, the second
//! encodes instructions and expands calls that carry
//! arguments.

pub mod ast;
pub mod error;
pub mod lexer;
pub mod mif;
pub mod numeric;
pub mod parser;
pub mod symbols;

use self::ast::Word;
use self::error::Error;
use self::parser::{Emitted, Parser};

/// Whether calls may carry arguments and routines may declare parameters.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Mode {
    /// Labels are bare names; `call` takes only a target.
    Plain,
    /// `call L r1 ..` expands into push/call/pop sequences and
    /// `name: p1 ..` declares a routine with parameters.
    Arguments,
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Arguments
    }
}

/// Assembles `source` and returns each emitted instruction with the line it
/// came from.
pub fn assemble_listing(source: &str, mode: Mode) -> Result<Vec<Emitted>, Error> {
    let lines = lexer::tokenize(source.lines());
    let (labels, lines) = symbols::pass1(lines, mode)?;
    let program = Parser::new(lines, labels, mode).run()?;

    if program.len() > mif::DEPTH {
        return Err(Error::ImageOverflow { words: program.len() });
    }
    Ok(program)
}

/// Assembles `source` into machine words in execution order.
pub fn assemble(source: &str, mode: Mode) -> Result<Vec<Word>, Error> {
    Ok(assemble_listing(source, mode)?
        .iter()
        .map(Emitted::word)
        .collect())
}
