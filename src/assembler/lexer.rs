//! This lexer tokenizes assembly source into lines of lowercase words.
//!
//! Comments start with `#` and run to the end of the line. Blank lines
//! (including lines that are only a comment) produce nothing. The lexer
//! never fails: whatever words a line contains are handed to the passes,
//! which decide whether they make sense.

/// One source statement: a label declaration (first token ends in `:`) or an
/// instruction with its operands.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TokenLine {
    /// 1-based line number in the source text.
    pub line: usize,
    pub tokens: Vec<String>,
}

impl TokenLine {
    pub fn new(line: usize, tokens: Vec<String>) -> Self {
        TokenLine { line, tokens }
    }

    /// The mnemonic or label declaration that starts the line.
    pub fn head(&self) -> &str {
        &self.tokens[0]
    }

    /// Everything after the first token.
    pub fn operands(&self) -> &[String] {
        &self.tokens[1..]
    }

    /// The label name, if this line declares one.
    pub fn label(&self) -> Option<&str> {
        let head = self.head();
        if head.ends_with(':') {
            Some(&head[..head.len() - 1])
        } else {
            None
        }
    }

    /// The words joined back together, for diagnostics and listings.
    pub fn text(&self) -> String {
        self.tokens.join(" ")
    }
}

/// Tokenizes every line of `source`.
pub fn tokenize<'a, I>(source: I) -> Vec<TokenLine>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out = Vec::new();

    for (index, line) in source.into_iter().enumerate() {
        if let Some(toks) = tokenize_line(line) {
            out.push(TokenLine::new(index + 1, toks));
        }
    }

    trace!("lexer produced {} statement(s)", out.len());
    out
}

fn tokenize_line(line: &str) -> Option<Vec<String>> {
    let mut sb = String::new();
    for c in line.trim().chars() {
        match c {
            '#' => break,
            _ => sb.push(c),
        }
    }

    let words: Vec<String> = sb
        .split_whitespace()
        .map(|w| w.to_lowercase())
        .collect();

    if words.is_empty() {
        None
    } else {
        Some(words)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_tokenize_line() {
        assert_eq!(tokenize_line("LOAD RA 12"), Some(words(&["load", "ra", "12"])));
        assert_eq!(tokenize_line("  \tadd ra\t\trb   rc  "), Some(words(&["add", "ra", "rb", "rc"])));
        assert_eq!(tokenize_line("halt # stop here"), Some(words(&["halt"])));
        assert_eq!(tokenize_line("halt#stop"), Some(words(&["halt"])));
        assert_eq!(tokenize_line("Loop:"), Some(words(&["loop:"])));

        assert_eq!(tokenize_line(""), None);
        assert_eq!(tokenize_line("   \t "), None);
        assert_eq!(tokenize_line("# only a comment"), None);
        assert_eq!(tokenize_line("   # indented comment"), None);
    }

    #[test]
    fn test_tokenize() {
        let asm_input = "
        # count down from ten
        MOVEI 10 RA
        top:
        SUB ra ONES ra  # ra <- ra - 1
        BRAZ done

        BRA top
        done:
        HALT
        ";
        let out = tokenize(asm_input.lines());

        assert_eq!(out, vec![
            TokenLine::new(3, words(&["movei", "10", "ra"])),
            TokenLine::new(4, words(&["top:"])),
            TokenLine::new(5, words(&["sub", "ra", "ones", "ra"])),
            TokenLine::new(6, words(&["braz", "done"])),
            TokenLine::new(8, words(&["bra", "top"])),
            TokenLine::new(9, words(&["done:"])),
            TokenLine::new(10, words(&["halt"])),
        ]);
    }

    #[test]
    fn test_label() {
        let decl = TokenLine::new(1, words(&["func:", "x", "y"]));
        assert_eq!(decl.label(), Some("func"));
        assert_eq!(decl.operands(), &words(&["x", "y"])[..]);

        let ins = TokenLine::new(1, words(&["bra", "func"]));
        assert_eq!(ins.label(), None);
        assert_eq!(ins.text(), "bra func");
    }
}
