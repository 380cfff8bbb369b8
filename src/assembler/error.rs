//! Everything that can stop an assembly run.
//!
//! All variants are fatal. The library never exits the process itself; the
//! binary prints the `Display` form as a single diagnostic and exits nonzero.
use std::fmt;

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Error {
    DuplicateLabel { line: usize, label: String },
    InvalidLabel { line: usize, label: String },
    UnknownInstruction { line: usize, text: String },
    UnknownOperand { line: usize, operand: String },
    MissingOperand { line: usize, mnemonic: String, position: usize },
    UndefinedLabel { line: usize, label: String },
    Encoding { line: usize, value: String, reason: &'static str },
    ImageOverflow { words: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Error::*;
        match self {
            DuplicateLabel { line, label } =>
                write!(f, "duplicate label `{}` on line {}", label, line),
            InvalidLabel { line, label } =>
                write!(f, "invalid label declaration `{}` on line {}", label, line),
            UnknownInstruction { line, text } =>
                write!(f, "instruction not defined on line {}: `{}`", line, text),
            UnknownOperand { line, operand } =>
                write!(f, "unknown operand `{}` on line {}", operand, line),
            MissingOperand { line, mnemonic, position } =>
                write!(f, "`{}` on line {} is missing operand {}", mnemonic, line, position),
            UndefinedLabel { line, label } =>
                write!(f, "undefined label `{}` on line {}", label, line),
            Encoding { line, value, reason } =>
                write!(f, "invalid value `{}` on line {}: {}", value, line, reason),
            ImageOverflow { words } =>
                write!(f, "program is {} words long but the memory image holds 256", words),
        }
    }
}

impl std::error::Error for Error {}
