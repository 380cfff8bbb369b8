//! Typed instructions for the 16-bit teaching CPU and their binary encoding.
//!
//! Execution begins with the first instruction in the file.
//! Comments are prefixed with `#` and are single-line only.
//! Instructions are delimited by newlines; operands by whitespace.
//!
//! Supported Instructions:
//!
//! ```text
//! LOAD D A    ; D <= mem[A]
//! LOADA D A   ; D <= mem[A + RE]
//! STORE S A   ; mem[A] <= S
//! STOREA S A  ; mem[A + RE] <= S
//! BRA L       ; branch to L
//! BRAZ L      ; branch to L if the CR zero flag is set
//! BRAO L      ; branch to L if the CR overflow flag is set
//! BRAN L      ; branch to L if the CR negative flag is set
//! BRAC L      ; branch to L if the CR carry flag is set
//! CALL L      ; call the routine at L
//! RETURN      ; return from a routine
//! HALT        ; stop
//! PUSH S      ; push S
//! POP D       ; pop into D
//! OPORT S     ; output port <= S
//! IPORT D     ; D <= input port
//! ADD A B C   ; C <= A + B
//! SUB A B C   ; C <= A - B
//! AND A B C   ; C <= A & B
//! OR  A B C   ; C <= A | B
//! XOR A B C   ; C <= A ^ B
//! SHIFTL A C  ; C <= A << 1
//! SHIFTR A C  ; C <= A >> 1
//! ROTL A C    ; C <= A rotated left
//! ROTR A C    ; C <= A rotated right
//! MOVE A C    ; C <= A
//! MOVEI V C   ; C <= V (8-bit signed)
//! ```
use std::fmt;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Register {
    RA,
    RB,
    RC,
    RD,
    RE,
    SP,
    PC,
    CR,
    IR,
    Zeros,
    Ones,
}

impl Register {
    pub fn from_name(name: &str) -> Option<Register> {
        use Register::*;
        match name {
            "ra"    => Some(RA),
            "rb"    => Some(RB),
            "rc"    => Some(RC),
            "rd"    => Some(RD),
            "re"    => Some(RE),
            "sp"    => Some(SP),
            "pc"    => Some(PC),
            "cr"    => Some(CR),
            "ir"    => Some(IR),
            "zeros" => Some(Zeros),
            "ones"  => Some(Ones),
            _       => None,
        }
    }

    /// The 3-bit field code. Codes 110 and 111 are shared between registers
    /// that never appear in the same field.
    pub fn to_u16(&self) -> u16 {
        use Register::*;
        match self {
            RA    => 0b000,
            RB    => 0b001,
            RC    => 0b010,
            RD    => 0b011,
            RE    => 0b100,
            SP    => 0b101,
            PC    => 0b110,
            CR    => 0b111,
            IR    => 0b111,
            Zeros => 0b110,
            Ones  => 0b111,
        }
    }

    fn name(&self) -> &'static str {
        use Register::*;
        match self {
            RA    => "ra",
            RB    => "rb",
            RC    => "rc",
            RD    => "rd",
            RE    => "re",
            SP    => "sp",
            PC    => "pc",
            CR    => "cr",
            IR    => "ir",
            Zeros => "zeros",
            Ones  => "ones",
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Which registers an operand slot may name.
///
/// * `B`: general purpose registers and the stack pointer.
/// * `C`: `B` plus `pc` and `cr`. Used by the stack instructions.
/// * `D`: `B` plus `pc` and `ir`. Used for readable sources.
/// * `E`: `B` plus the `zeros` and `ones` constants. Used for ALU sources.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Field {
    B,
    C,
    D,
    E,
}

impl Field {
    pub fn lookup(&self, name: &str) -> Option<Register> {
        use Register::*;
        let reg = Register::from_name(name)?;
        let allowed = match (*self, reg) {
            (_, RA) | (_, RB) | (_, RC) |
            (_, RD) | (_, RE) | (_, SP)   => true,
            (Field::C, PC) | (Field::C, CR) => true,
            (Field::D, PC) | (Field::D, IR) => true,
            (Field::E, Zeros) | (Field::E, Ones) => true,
            _ => false,
        };
        if allowed { Some(reg) } else { None }
    }
}

/// Conditions the `bra*` family can test.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Cond {
    Always,
    Zero,
    Overflow,
    Negative,
    Carry,
}

/// Binary ALU operations.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum AluOp {
    Add,
    Sub,
    And,
    Or,
    Xor,
}

/// Unary shift and rotate operations.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ShiftOp {
    ShiftL,
    ShiftR,
    RotL,
    RotR,
}

pub type Immediate = u8;
pub type Address = u8;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Instruction {
    Load  (Register, Immediate),
    LoadA (Register, Immediate),
    Store (Register, Immediate),
    StoreA(Register, Immediate),
    Branch(Cond, Address),
    Call  (Address),
    Return,
    Halt,
    Push  (Register),
    Pop   (Register),
    OPort (Register),
    IPort (Register),
    Alu   (AluOp, Register, Register, Register),
    Shift (ShiftOp, Register, Register),
    Move  (Register, Register),
    MoveI (Immediate, Register),
}

/// Renders the instruction back as assembly, immediates as signed decimals.
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Instruction::*;
        match self {
            Load  (r, v) => write!(f, "load {} {}", r, *v as i8),
            LoadA (r, v) => write!(f, "loada {} {}", r, *v as i8),
            Store (r, v) => write!(f, "store {} {}", r, *v as i8),
            StoreA(r, v) => write!(f, "storea {} {}", r, *v as i8),
            Branch(cond, addr) => {
                let m = match cond {
                    Cond::Always   => "bra",
                    Cond::Zero     => "braz",
                    Cond::Overflow => "brao",
                    Cond::Negative => "bran",
                    Cond::Carry    => "brac",
                };
                write!(f, "{} {:#04X}", m, addr)
            },
            Call(addr) => write!(f, "call {:#04X}", addr),
            Return     => write!(f, "return"),
            Halt       => write!(f, "halt"),
            Push (r)   => write!(f, "push {}", r),
            Pop  (r)   => write!(f, "pop {}", r),
            OPort(r)   => write!(f, "oport {}", r),
            IPort(r)   => write!(f, "iport {}", r),
            Alu(op, a, b, c) => {
                let m = match op {
                    AluOp::Add => "add",
                    AluOp::Sub => "sub",
                    AluOp::And => "and",
                    AluOp::Or  => "or",
                    AluOp::Xor => "xor",
                };
                write!(f, "{} {} {} {}", m, a, b, c)
            },
            Shift(op, a, c) => {
                let m = match op {
                    ShiftOp::ShiftL => "shiftl",
                    ShiftOp::ShiftR => "shiftr",
                    ShiftOp::RotL   => "rotl",
                    ShiftOp::RotR   => "rotr",
                };
                write!(f, "{} {} {}", m, a, c)
            },
            Move (a, c) => write!(f, "move {} {}", a, c),
            MoveI(v, c) => write!(f, "movei {} {}", *v as i8, c),
        }
    }
}

impl Instruction {
    /// Assembles the instruction to its 16-bit machine word.
    pub fn assemble(&self) -> Word {
        use Instruction::*;
        let bits = match self {
            Load  (reg, value) |
            LoadA (reg, value) |
            Store (reg, value) |
            StoreA(reg, value)  => (self.opcode() << 11) | (reg.to_u16() << 8) | (*value as u16),

            Branch(_, addr) |
            Call  (addr)        => (self.opcode() << 8) | (*addr as u16),

            Return | Halt       => self.opcode() << 10,

            Push (reg) |
            Pop  (reg) |
            OPort(reg) |
            IPort(reg)          => (self.opcode() << 12) | (reg.to_u16() << 9),

            Alu(_, a, b, c)     => (self.opcode() << 12) | (a.to_u16() << 9) | (b.to_u16() << 6) | c.to_u16(),

            Shift(_, a, c) |
            Move (a, c)         => (self.opcode() << 11) | (a.to_u16() << 8) | c.to_u16(),

            MoveI(value, c)     => (self.opcode() << 11) | ((*value as u16) << 3) | c.to_u16(),
        };
        Word(bits)
    }

    /// Returns the opcode, right-aligned. Its width depends on the format.
    fn opcode(&self) -> u16 {
        use Instruction::*;
        match self {
            Load(..)   => 0b00000,
            LoadA(..)  => 0b00001,
            Store(..)  => 0b00010,
            StoreA(..) => 0b00011,

            Branch(Cond::Always, _)   => 0b0010_0000,
            Branch(Cond::Zero, _)     => 0b0011_0000,
            Branch(Cond::Overflow, _) => 0b0011_0001,
            Branch(Cond::Negative, _) => 0b0011_0010,
            Branch(Cond::Carry, _)    => 0b0011_0011,
            Call(_)                   => 0b0011_0100,

            Return => 0b001110,
            Halt   => 0b001111,

            Push(_)  => 0b0100,
            Pop(_)   => 0b0101,
            OPort(_) => 0b0110,
            IPort(_) => 0b0111,

            Alu(AluOp::Add, ..) => 0b1000,
            Alu(AluOp::Sub, ..) => 0b1001,
            Alu(AluOp::And, ..) => 0b1010,
            Alu(AluOp::Or, ..)  => 0b1011,
            Alu(AluOp::Xor, ..) => 0b1100,

            // Rotates share the shift encodings.
            Shift(ShiftOp::ShiftL, ..) | Shift(ShiftOp::RotL, ..) => 0b11100,
            Shift(ShiftOp::ShiftR, ..) | Shift(ShiftOp::RotR, ..) => 0b11101,

            Move(..)  => 0b11110,
            MoveI(..) => 0b11111,
        }
    }
}

/// One 16-bit machine word. Its `Display` form is the 16-digit binary string
/// written to memory images.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Word(pub u16);

impl Word {
    /// Fill value for unused memory.
    pub const FILL: Word = Word(0xFFFF);
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:016b}", self.0)
    }
}
