//! Pass 2: turns label-resolved token lines into machine instructions.
//!
//! Branch and call targets are kept symbolic until every line has been
//! processed, because call expansions later in the program move the labels
//! they point at. Once the label table is final the targets are resolved.
use std::collections::{HashMap, VecDeque};
use super::ast::*;
use super::error::Error;
use super::lexer::TokenLine;
use super::numeric::{encode_signed8, encode_unsigned8, parse_decimal};
use super::symbols::LabelTable;
use super::Mode;

/// Parameter names of the routine currently being assembled, bound to
/// their frame offsets relative to `re`.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct ArgumentAliases {
    aliases: HashMap<String, i64>,
}

impl ArgumentAliases {
    /// Binds `params` for a routine entered with `params.len()` arguments.
    /// The first parameter lives furthest from the frame pointer, the last
    /// one just below the return address.
    pub fn bind(params: &[String]) -> Self {
        let n = params.len() as i64;
        let aliases = params
            .iter()
            .enumerate()
            .map(|(i, p)| (p.clone(), i as i64 - (n + 1)))
            .collect();
        ArgumentAliases { aliases }
    }

    pub fn get(&self, name: &str) -> Option<i64> {
        self.aliases.get(name).copied()
    }

    /// Reads an operand that may name a parameter or be a decimal literal.
    fn value(&self, token: &str, line: usize) -> Result<i64, Error> {
        match self.get(token) {
            Some(v) => Ok(v),
            None => parse_decimal(token, line),
        }
    }
}

/// An instruction whose branch target may still be a label name.
#[derive(Clone, PartialEq, Eq, Debug)]
enum Pending {
    Ready(Instruction),
    Branch(Cond, String),
    Call(String),
}

/// One emitted word together with the source line it came from.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Emitted {
    pub line: usize,
    pub instruction: Instruction,
}

impl Emitted {
    pub fn word(&self) -> Word {
        self.instruction.assemble()
    }
}

pub struct Parser {
    lines:   VecDeque<TokenLine>,
    labels:  LabelTable,
    mode:    Mode,
    aliases: ArgumentAliases,
    code:    Vec<(usize, Pending)>,
}

impl Parser {
    pub fn new(lines: Vec<TokenLine>, labels: LabelTable, mode: Mode) -> Self {
        let capacity = lines.len();
        Parser {
            lines: VecDeque::from(lines),
            labels,
            mode,
            aliases: ArgumentAliases::default(),
            code: Vec::with_capacity(capacity),
        }
    }

    /// Run the parser, consuming itself and returning the program in
    /// execution order.
    pub fn run(mut self) -> Result<Vec<Emitted>, Error> {
        while let Some(line) = self.consume() {
            self.statement(&line)?;
        }

        let labels = &self.labels;
        let program = self.code
            .into_iter()
            .map(|(line, pending)| {
                let instruction = match pending {
                    Pending::Ready(ins) => ins,
                    Pending::Branch(cond, label) => Instruction::Branch(cond, resolve(labels, &label, line)?),
                    Pending::Call(label) => Instruction::Call(resolve(labels, &label, line)?),
                };
                Ok(Emitted { line, instruction })
            })
            .collect::<Result<Vec<_>, Error>>()?;

        info!("pass 2: {} word(s) emitted", program.len());
        Ok(program)
    }

    fn statement(&mut self, line: &TokenLine) -> Result<(), Error> {
        if line.label().is_some() {
            return self.entry(line);
        }

        if line.head() == "call" && self.mode == Mode::Arguments && line.operands().len() > 1 {
            return self.call_with_arguments(line);
        }

        let pending = self.operation(line)?;
        self.emit(line.line, pending);
        Ok(())
    }

    /// A label declaration. Only reachable in argument mode; plain labels
    /// take no space, labels with parameters set up a frame in the slot
    /// pass 1 gave them.
    fn entry(&mut self, line: &TokenLine) -> Result<(), Error> {
        let params = line.operands();
        if params.is_empty() {
            return Ok(());
        }

        self.aliases = ArgumentAliases::bind(params);
        debug!("line {}: routine `{}` takes {:?}", line.line, line.head(), params);

        // re <- sp, so parameters are addressed relative to the frame.
        self.emit(line.line, Pending::Ready(Instruction::Move(Register::SP, Register::RE)));
        Ok(())
    }

    /// `call L r1 .. rk` expands to a reserved return-value slot, pushes of
    /// the argument registers, the call itself and pops in reverse order.
    fn call_with_arguments(&mut self, line: &TokenLine) -> Result<(), Error> {
        let target = self.operand(line, 0)?.to_owned();
        let regs = line.operands()[1..]
            .iter()
            .map(|name| lookup(Field::C, name, line.line))
            .collect::<Result<Vec<_>, Error>>()?;

        // This line already owns one address from pass 1.
        self.shift_labels(2 * regs.len() + 1);

        self.emit(line.line, Pending::Ready(Instruction::Push(Register::RA)));
        for reg in regs.iter() {
            self.emit(line.line, Pending::Ready(Instruction::Push(*reg)));
        }
        self.emit(line.line, Pending::Call(target));
        for reg in regs.iter().rev() {
            self.emit(line.line, Pending::Ready(Instruction::Pop(*reg)));
        }

        self.aliases = ArgumentAliases::default();
        Ok(())
    }

    fn operation(&self, line: &TokenLine) -> Result<Pending, Error> {
        let ready = |ins: Instruction| -> Result<Pending, Error> { Ok(Pending::Ready(ins)) };
        match line.head() {
            "load"   => ready(self.op_reg_address(line, Instruction::Load, false)?),
            "loada"  => ready(self.op_reg_address(line, Instruction::LoadA, true)?),
            "store"  => ready(self.op_reg_address(line, Instruction::Store, false)?),
            "storea" => ready(self.op_reg_address(line, Instruction::StoreA, true)?),

            "bra"  => self.op_branch(line, Cond::Always),
            "braz" => self.op_branch(line, Cond::Zero),
            "brao" => self.op_branch(line, Cond::Overflow),
            "bran" => self.op_branch(line, Cond::Negative),
            "brac" => self.op_branch(line, Cond::Carry),
            "call" => {
                let target = self.operand(line, 0)?.to_owned();
                self.check_arity(line, 1);
                Ok(Pending::Call(target))
            },

            "return" => { self.check_arity(line, 0); ready(Instruction::Return) },
            "halt"   => { self.check_arity(line, 0); ready(Instruction::Halt) },

            "push"  => ready(Instruction::Push(self.op_single_reg(line, Field::C)?)),
            "pop"   => ready(Instruction::Pop(self.op_single_reg(line, Field::C)?)),
            "oport" => ready(Instruction::OPort(self.op_single_reg(line, Field::D)?)),
            "iport" => ready(Instruction::IPort(self.op_single_reg(line, Field::B)?)),

            "add" => ready(self.op_alu(line, AluOp::Add)?),
            "sub" => ready(self.op_alu(line, AluOp::Sub)?),
            "and" => ready(self.op_alu(line, AluOp::And)?),
            "or"  => ready(self.op_alu(line, AluOp::Or)?),
            "xor" => ready(self.op_alu(line, AluOp::Xor)?),

            "shiftl" => ready(self.op_shift(line, ShiftOp::ShiftL)?),
            "shiftr" => ready(self.op_shift(line, ShiftOp::ShiftR)?),
            "rotl"   => ready(self.op_shift(line, ShiftOp::RotL)?),
            "rotr"   => ready(self.op_shift(line, ShiftOp::RotR)?),

            "move" => {
                let a = self.register(line, 0, Field::D)?;
                let c = self.register(line, 1, Field::B)?;
                self.check_arity(line, 2);
                ready(Instruction::Move(a, c))
            },
            "movei" => {
                let v = self.aliases.value(self.operand(line, 0)?, line.line)?;
                let v = encode_signed8(v, line.line)?;
                let c = self.register(line, 1, Field::B)?;
                self.check_arity(line, 2);
                ready(Instruction::MoveI(v, c))
            },

            _ => Err(Error::UnknownInstruction { line: line.line, text: line.text() }),
        }
    }

    /// `OP R A` where A is a signed 8-bit address. The indexed forms accept
    /// a parameter name in place of A.
    fn op_reg_address(
        &self,
        line: &TokenLine,
        build: fn(Register, Immediate) -> Instruction,
        indexed: bool,
    ) -> Result<Instruction, Error> {
        let reg = self.register(line, 0, Field::B)?;
        let token = self.operand(line, 1)?;
        let value = if indexed {
            self.aliases.value(token, line.line)?
        } else {
            parse_decimal(token, line.line)?
        };
        self.check_arity(line, 2);
        Ok(build(reg, encode_signed8(value, line.line)?))
    }

    fn op_branch(&self, line: &TokenLine, cond: Cond) -> Result<Pending, Error> {
        let target = self.operand(line, 0)?.to_owned();
        self.check_arity(line, 1);
        Ok(Pending::Branch(cond, target))
    }

    fn op_single_reg(&self, line: &TokenLine, field: Field) -> Result<Register, Error> {
        let reg = self.register(line, 0, field)?;
        self.check_arity(line, 1);
        Ok(reg)
    }

    fn op_alu(&self, line: &TokenLine, op: AluOp) -> Result<Instruction, Error> {
        let a = self.register(line, 0, Field::E)?;
        let b = self.register(line, 1, Field::E)?;
        let c = self.register(line, 2, Field::B)?;
        self.check_arity(line, 3);
        Ok(Instruction::Alu(op, a, b, c))
    }

    fn op_shift(&self, line: &TokenLine, op: ShiftOp) -> Result<Instruction, Error> {
        let a = self.register(line, 0, Field::E)?;
        let c = self.register(line, 1, Field::B)?;
        self.check_arity(line, 2);
        Ok(Instruction::Shift(op, a, c))
    }

    fn register(&self, line: &TokenLine, index: usize, field: Field) -> Result<Register, Error> {
        lookup(field, self.operand(line, index)?, line.line)
    }

    fn operand<'l>(&self, line: &'l TokenLine, index: usize) -> Result<&'l str, Error> {
        match line.operands().get(index) {
            Some(tok) => Ok(tok.as_str()),
            None => Err(Error::MissingOperand {
                line: line.line,
                mnemonic: line.head().to_owned(),
                position: index + 1,
            }),
        }
    }

    fn check_arity(&self, line: &TokenLine, expected: usize) {
        let extra = &line.operands()[expected.min(line.operands().len())..];
        if !extra.is_empty() {
            warn!("line {}: ignoring extra operand(s) {:?} to `{}`", line.line, extra, line.head());
        }
    }

    /// Moves every label past the current end of code forward by `by`.
    fn shift_labels(&mut self, by: usize) {
        let at = self.code.len();
        self.labels = self.labels.rebase(at, by);
        debug!("labels after {:#04X} moved forward by {}", at, by);
    }

    fn emit(&mut self, line: usize, pending: Pending) {
        self.code.push((line, pending));
    }

    /// Pops a line off the input and returns it.
    /// Returns None if no lines are left.
    #[inline]
    fn consume(&mut self) -> Option<TokenLine> {
        self.lines.pop_front()
    }
}

fn lookup(field: Field, name: &str, line: usize) -> Result<Register, Error> {
    field.lookup(name).ok_or_else(|| Error::UnknownOperand { line, operand: name.to_owned() })
}

fn resolve(labels: &LabelTable, label: &str, line: usize) -> Result<Address, Error> {
    match labels.get(label) {
        Some(addr) => encode_unsigned8(addr as i64, line),
        None => Err(Error::UndefinedLabel { line, label: label.to_owned() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::lexer::tokenize;
    use super::super::symbols::pass1;

    fn assemble(src: &str, mode: Mode) -> Result<Vec<Emitted>, Error> {
        let (labels, lines) = pass1(tokenize(src.lines()), mode)?;
        Parser::new(lines, labels, mode).run()
    }

    fn words(src: &str, mode: Mode) -> Vec<String> {
        assemble(src, mode)
            .unwrap()
            .iter()
            .map(|e| e.word().to_string())
            .collect()
    }

    #[test]
    fn test_operation() {
        let src = "
        load ra 12
        loada rb -3
        store sp 127
        storea re -128
        push cr
        pop pc
        oport ir
        iport rd
        add ra rb rc
        sub zeros ones rd
        and ra rb rc
        or ra rb rc
        xor ra rb rc
        shiftl ra rb
        shiftr ones rb
        rotl ra rb
        rotr ra rb
        move pc ra
        movei -1 rb
        return
        halt
        ";
        assert_eq!(words(src, Mode::Plain), vec![
            "0000000000001100",
            "0000100111111101",
            "0001010101111111",
            "0001110010000000",
            "0100111000000000",
            "0101110000000000",
            "0110111000000000",
            "0111011000000000",
            "1000000001000010",
            "1001110111000011",
            "1010000001000010",
            "1011000001000010",
            "1100000001000010",
            "1110000000000001",
            "1110111100000001",
            "1110000000000001",
            "1110100000000001",
            "1111011000000000",
            "1111111111111001",
            "0011100000000000",
            "0011110000000000",
        ]);
    }

    #[test]
    fn test_branches() {
        let src = "
        top:
        bra top
        braz end
        brao end
        bran end
        brac end
        call top
        end:
        halt
        ";
        assert_eq!(words(src, Mode::Plain), vec![
            "0010000000000000",
            "0011000000000110",
            "0011000100000110",
            "0011001000000110",
            "0011001100000110",
            "0011010000000000",
            "0011110000000000",
        ]);
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            assemble("frob ra rb", Mode::Plain),
            Err(Error::UnknownInstruction { line: 1, text: "frob ra rb".to_owned() })
        );
        assert_eq!(
            assemble("halt\npush ir", Mode::Plain),
            Err(Error::UnknownOperand { line: 2, operand: "ir".to_owned() })
        );
        assert_eq!(
            assemble("bra nowhere", Mode::Plain),
            Err(Error::UndefinedLabel { line: 1, label: "nowhere".to_owned() })
        );
        assert_eq!(
            assemble("add ra rb", Mode::Plain),
            Err(Error::MissingOperand { line: 1, mnemonic: "add".to_owned(), position: 3 })
        );
        assert!(match assemble("load ra 128", Mode::Plain) {
            Err(Error::Encoding { line: 1, .. }) => true,
            _ => false,
        });
        assert!(assemble("movei ten ra", Mode::Plain).is_err());
        // The destination of an ALU op cannot be a constant.
        assert!(assemble("add ra rb ones", Mode::Plain).is_err());
    }

    #[test]
    fn test_extra_operands_are_ignored() {
        assert_eq!(words("halt now please", Mode::Plain), vec!["0011110000000000"]);
        assert_eq!(words("f:\ncall f ra rb", Mode::Plain), vec!["0011010000000000"]);
    }

    #[test]
    fn test_call_expansion() {
        let src = "
        call f ra rb
        bra after
        after:
        halt
        f:
        return
        ";
        let out = words(src, Mode::Arguments);

        // 2k + 2 words for k = 2, then bra, halt, return.
        assert_eq!(out.len(), 6 + 3);
        assert_eq!(&out[..6], &[
            "0100000000000000", // reserved return-value slot
            "0100000000000000", // push ra
            "0100001000000000", // push rb
            "0011010000001000", // call f (address 8)
            "0101001000000000", // pop rb
            "0101000000000000", // pop ra
        ]);
        // bra after -> address 7, where the halt really sits.
        assert_eq!(out[6], "0010000000000111");
        assert_eq!(out[7], "0011110000000000");
        assert_eq!(out[8], "0011100000000000");
    }

    #[test]
    fn test_call_without_arguments_in_argument_mode() {
        let out = words("f:\ncall f\nhalt", Mode::Arguments);
        assert_eq!(out, vec!["0011010000000000", "0011110000000000"]);
    }

    #[test]
    fn test_forward_reference_across_expansion() {
        let src = "
        bra end
        call f rc
        end:
        halt
        f:
        return
        ";
        let program = assemble(src, Mode::Arguments).unwrap();
        // bra(1) + expansion(4) puts `end` at 5 and `f` at 6.
        assert_eq!(program.len(), 7);
        assert_eq!(program[0].instruction, Instruction::Branch(Cond::Always, 5));
        assert_eq!(program[3].instruction, Instruction::Call(6));
        assert_eq!(program[5].instruction, Instruction::Halt);
        assert_eq!(program[6].instruction, Instruction::Return);
    }

    #[test]
    fn test_entry_with_parameters() {
        let src = "
        call sum ra rb
        halt
        sum: x y
        loada rc x
        loada rd y
        storea rc y
        movei x rc
        add rc rd rc
        return
        ";
        let program = assemble(src, Mode::Arguments).unwrap();

        // expansion(6) + halt, then the frame setup at `sum`.
        assert_eq!(program[3].instruction, Instruction::Call(7));
        assert_eq!(program[7].instruction, Instruction::Move(Register::SP, Register::RE));
        assert_eq!(program[7].word().to_string(), "1111010100000100");

        // x -> -3, y -> -2
        assert_eq!(program[8].instruction, Instruction::LoadA(Register::RC, (-3i8) as u8));
        assert_eq!(program[9].instruction, Instruction::LoadA(Register::RD, (-2i8) as u8));
        assert_eq!(program[10].instruction, Instruction::StoreA(Register::RC, (-2i8) as u8));
        assert_eq!(program[11].instruction, Instruction::MoveI((-3i8) as u8, Register::RC));
        assert_eq!(program.len(), 14);
    }

    #[test]
    fn test_label_after_entry() {
        let program = assemble("f: x\ninner:\nhalt\nbra inner", Mode::Arguments).unwrap();
        assert_eq!(program.len(), 3);
        assert_eq!(program[0].instruction, Instruction::Move(Register::SP, Register::RE));
        assert_eq!(program[1].instruction, Instruction::Halt);
        assert_eq!(program[2].instruction, Instruction::Branch(Cond::Always, 1));
    }

    #[test]
    fn test_label_before_entry() {
        let program = assemble("top:\nf: x\nhalt\nbra top", Mode::Arguments).unwrap();
        assert_eq!(program[2].instruction, Instruction::Branch(Cond::Always, 0));
    }

    #[test]
    fn test_consecutive_entries() {
        let src = "
        call g ra
        halt
        f: x
        g: y
        return
        ";
        let program = assemble(src, Mode::Arguments).unwrap();
        // expansion(4) + halt, then f's frame setup at 5 and g's at 6.
        assert_eq!(program.len(), 8);
        assert_eq!(program[2].instruction, Instruction::Call(6));
        assert_eq!(program[5].instruction, Instruction::Move(Register::SP, Register::RE));
        assert_eq!(program[6].instruction, Instruction::Move(Register::SP, Register::RE));
        assert_eq!(program[7].instruction, Instruction::Return);
    }

    #[test]
    fn test_aliases_reset_after_call() {
        let src = "
        f: x
        call g ra
        loada rb x
        g:
        return
        ";
        assert!(match assemble(src, Mode::Arguments) {
            Err(Error::Encoding { line: 4, .. }) => true,
            _ => false,
        });
    }

    #[test]
    fn test_aliases_are_plain_mode_literals() {
        // Without argument mode there are no entry points, so names fail.
        assert!(assemble("loada ra x", Mode::Plain).is_err());
    }

    #[test]
    fn test_argument_aliases_bind() {
        let params: Vec<String> = vec!["a".into(), "b".into(), "c".into()];
        let aliases = ArgumentAliases::bind(&params);
        assert_eq!(aliases.get("a"), Some(-4));
        assert_eq!(aliases.get("b"), Some(-3));
        assert_eq!(aliases.get("c"), Some(-2));
        assert_eq!(aliases.get("d"), None);
        assert_eq!(ArgumentAliases::default().get("a"), None);
    }
}
