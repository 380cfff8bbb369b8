//! Pass 1: assigns instruction addresses and records where each label points.
use std::collections::HashMap;
use regex::Regex;
use super::error::Error;
use super::lexer::TokenLine;
use super::Mode;

lazy_static! {
    static ref SYMBOL: Regex = Regex::new(r"^[[:graph:]&&[^:]]+$").unwrap();
}

/// Label name to instruction address.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct LabelTable {
    labels: HashMap<String, usize>,
}

impl LabelTable {
    pub fn new() -> Self {
        LabelTable { labels: HashMap::new() }
    }

    pub fn get(&self, label: &str) -> Option<usize> {
        self.labels.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Registers `label` at `address`. Fails if the name is already taken.
    pub fn declare(&mut self, label: &str, address: usize, line: usize) -> Result<(), Error> {
        if self.labels.contains_key(label) {
            return Err(Error::DuplicateLabel { line, label: label.to_owned() });
        }
        self.labels.insert(label.to_owned(), address);
        Ok(())
    }

    /// Returns a copy of the table where every address strictly greater than
    /// `after` has moved forward by `by`.
    pub fn rebase(&self, after: usize, by: usize) -> LabelTable {
        let labels = self.labels
            .iter()
            .map(|(name, &addr)| {
                let addr = if addr > after { addr + by } else { addr };
                (name.clone(), addr)
            })
            .collect();
        LabelTable { labels }
    }
}

/// Runs the first pass.
///
/// Every non-label line takes the next address; a label gets the address of
/// the instruction that follows it. In [`Mode::Plain`] the label lines are
/// dropped from the returned lines. In [`Mode::Arguments`] they are kept so
/// the second pass can expand parameterized entry points, and an entry with
/// parameters takes one address for its frame setup.
pub fn pass1(lines: Vec<TokenLine>, mode: Mode) -> Result<(LabelTable, Vec<TokenLine>), Error> {
    let mut table = LabelTable::new();
    let mut address: usize = 0;
    let mut kept = Vec::with_capacity(lines.len());

    for line in lines {
        match line.label() {
            Some(label) => {
                if !SYMBOL.is_match(label) {
                    return Err(Error::InvalidLabel { line: line.line, label: line.head().to_owned() });
                }
                table.declare(label, address, line.line)?;
                debug!("label `{}` -> {:#04X}", label, address);

                if mode == Mode::Arguments {
                    if !line.operands().is_empty() {
                        address += 1;
                    }
                    kept.push(line);
                }
            },
            None => {
                address += 1;
                kept.push(line);
            },
        }
    }

    info!("pass 1: {} label(s), {} statement(s)", table.len(), address);
    Ok((table, kept))
}
