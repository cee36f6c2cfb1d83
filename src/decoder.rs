use serde::{Deserialize, Serialize};

/// One of the 16 general registers. Indices 12..=15 double as FP, SP, LR and PC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Reg(u8);

const REG_NAMES: [&str; 16] = [
    "R0", "R1", "R2", "R3", "R4", "R5", "R6", "R7", "R8", "R9", "R10", "R11", "FP", "SP", "LR",
    "PC",
];

impl Reg {
    pub const R0: Reg = Reg(0);
    pub const FP: Reg = Reg(12);
    pub const SP: Reg = Reg(13);
    pub const LR: Reg = Reg(14);
    pub const PC: Reg = Reg(15);

    pub const fn new(index: u8) -> Option<Reg> {
        if index < 16 {
            Some(Reg(index))
        } else {
            None
        }
    }

    /// Builds a register from the low four bits of a field value.
    pub(crate) const fn from_field(bits: u16) -> Reg {
        Reg((bits & 0xF) as u8)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Canonical name: `R0`..`R11`, then the FP/SP/LR/PC aliases.
    pub fn name(self) -> &'static str {
        REG_NAMES[self.index()]
    }

    /// Accepts `R0`..`R15` and the four aliases, in any letter case.
    pub fn parse(token: &str) -> Option<Reg> {
        let upper = token.trim().to_ascii_uppercase();
        if let Some(i) = REG_NAMES.iter().position(|n| *n == upper) {
            return Some(Reg(i as u8));
        }
        let digits = upper.strip_prefix('R')?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse::<u8>().ok().and_then(Reg::new)
    }
}

impl std::fmt::Display for Reg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Second ALU operand: a register or a 4-bit unsigned immediate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operand {
    Reg(Reg),
    Imm(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AluOp {
    Add,
    Sub,
    And,
    Or,
    Xor,
}

impl AluOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            AluOp::Add => "ADD",
            AluOp::Sub => "SUB",
            AluOp::And => "AND",
            AluOp::Or => "OR",
            AluOp::Xor => "XOR",
        }
    }

    /// Name of the flags-only (no write-back) form, where one exists.
    pub fn flags_only_mnemonic(self) -> Option<&'static str> {
        match self {
            AluOp::Add => Some("ANW"),
            AluOp::Sub => Some("CMP"),
            AluOp::And => Some("TBS"),
            AluOp::Or | AluOp::Xor => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShiftOp {
    Sl,
    Sr,
    Sra,
    Ror,
}

impl ShiftOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            ShiftOp::Sl => "SL",
            ShiftOp::Sr => "SR",
            ShiftOp::Sra => "SRA",
            ShiftOp::Ror => "ROR",
        }
    }
}

/// Branch condition, tested against the PSW flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cond {
    Z,
    Nz,
    C,
    Nc,
    N,
    Nn,
    O,
    No,
}

impl Cond {
    pub fn mnemonic(self) -> &'static str {
        match self {
            Cond::Z => "JZ",
            Cond::Nz => "JNZ",
            Cond::C => "JC",
            Cond::Nc => "JNC",
            Cond::N => "JN",
            Cond::Nn => "JNN",
            Cond::O => "JO",
            Cond::No => "JNO",
        }
    }
}

/// Which PSW nibble a SET/CLR-family instruction indexes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlagGroup {
    /// `SET`/`CLR`: index 0 is PSW bit 0 (N).
    Low,
    /// `SET2`/`CLR2`: index 0 is PSW bit 4 (I).
    High,
}

impl FlagGroup {
    pub const fn base_bit(self) -> u8 {
        match self {
            FlagGroup::Low => 0,
            FlagGroup::High => 4,
        }
    }

    /// PSW bit touched by `index` within this group.
    pub const fn bit(self, index: u8) -> u8 {
        (self.base_bit() + index) & 0xF
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SysOp {
    Nop,
    Hlt,
    Swi,
    Reti,
}

impl SysOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            SysOp::Nop => "NOP",
            SysOp::Hlt => "HLT",
            SysOp::Swi => "SWI",
            SysOp::Reti => "RETI",
        }
    }
}

/// A fully decoded instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instr {
    /// R0 <- imm15
    Ldi { imm: u16 },
    Ld { rd: Reg, base: Reg, offset: i8 },
    St { rs: Reg, base: Reg, offset: i8 },
    /// `write == false` is the flags-only form (CMP and friends).
    Alu {
        op: AluOp,
        rd: Reg,
        src: Operand,
        write: bool,
    },
    Shift { op: ShiftOp, rd: Reg, count: u8 },
    /// Offset in words, relative to the word after the branch.
    Branch { cond: Cond, offset: i16 },
    /// rd <- rs + imm2
    Mov { rd: Reg, rs: Reg, imm: u8 },
    Lsi { rd: Reg, imm: i8 },
    Flag {
        set: bool,
        group: FlagGroup,
        index: u8,
    },
    Sys(SysOp),
    /// The all-ones stop sentinel.
    Halt,
    /// No family matched; executes as a no-op.
    Unknown(u16),
}

pub trait Decoder {
    /// Total: every word decodes to something, `Instr::Unknown` at worst.
    fn decode(&self, word: u16) -> Instr;
}
