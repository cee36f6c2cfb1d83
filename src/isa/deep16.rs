use crate::decoder::{AluOp, Cond, Decoder, FlagGroup, Instr, Operand, Reg, ShiftOp, SysOp};
use crate::error::EncodingError;

/// Deep16 codec.
///
/// Encode and decode are both driven by the [`layout`] constants and the
/// code tables below, so the two directions cannot drift apart.
#[derive(Debug, Clone, Copy, Default)]
pub struct Deep16Codec;

impl Deep16Codec {
    pub fn new() -> Self {
        Self
    }

    pub fn encode(&self, instr: &Instr) -> Result<u16, EncodingError> {
        encode(instr)
    }
}

impl Decoder for Deep16Codec {
    fn decode(&self, word: u16) -> Instr {
        decode(word)
    }
}

/// Opcode discriminator, most-significant bits first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prefix {
    pub bits: u16,
    pub len: u8,
}

impl Prefix {
    pub const fn matches(self, word: u16) -> bool {
        (word >> (16 - self.len)) == self.bits
    }

    pub const fn place(self) -> u16 {
        self.bits << (16 - self.len)
    }
}

/// A bit field: `width` bits starting at bit `lsb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub lsb: u8,
    pub width: u8,
}

impl Field {
    pub const fn mask(self) -> u16 {
        ((1u32 << self.width) - 1) as u16
    }

    pub const fn get(self, word: u16) -> u16 {
        (word >> self.lsb) & self.mask()
    }

    pub const fn get_signed(self, word: u16) -> i16 {
        let s = 16 - self.width as u32;
        ((self.get(word) << s) as i16) >> s
    }

    pub const fn put(self, value: u16) -> u16 {
        (value & self.mask()) << self.lsb
    }

    pub const fn max_unsigned(self) -> i64 {
        self.mask() as i64
    }

    pub const fn min_signed(self) -> i64 {
        -(1i64 << (self.width - 1))
    }

    pub const fn max_signed(self) -> i64 {
        (1i64 << (self.width - 1)) - 1
    }
}

pub mod layout {
    use super::{Field, Prefix};

    /// `[0][imm15]`, loads R0.
    pub mod ldi {
        use super::*;
        pub const PREFIX: Prefix = Prefix { bits: 0b0, len: 1 };
        pub const IMM: Field = Field { lsb: 0, width: 15 };
    }

    /// `[10][d][Rd4][Rb4][off5]`
    pub mod mem {
        use super::*;
        pub const PREFIX: Prefix = Prefix { bits: 0b10, len: 2 };
        pub const DIR: Field = Field { lsb: 13, width: 1 };
        pub const RD: Field = Field { lsb: 9, width: 4 };
        pub const BASE: Field = Field { lsb: 5, width: 4 };
        pub const OFFSET: Field = Field { lsb: 0, width: 5 };
        pub const LOAD: u16 = 0;
        pub const STORE: u16 = 1;
    }

    /// `[110][op3][Rd4][w][i][Rs4/imm4]`
    pub mod alu {
        use super::*;
        pub const PREFIX: Prefix = Prefix { bits: 0b110, len: 3 };
        pub const OP: Field = Field { lsb: 10, width: 3 };
        pub const RD: Field = Field { lsb: 6, width: 4 };
        pub const WRITE: Field = Field { lsb: 5, width: 1 };
        pub const IMMEDIATE: Field = Field { lsb: 4, width: 1 };
        pub const SRC: Field = Field { lsb: 0, width: 4 };
    }

    /// `[110][111][Rd4][type2][count4]`: ALU op 7 is the shift family.
    pub mod shift {
        use super::*;
        pub const PREFIX: Prefix = Prefix { bits: 0b110111, len: 6 };
        pub const RD: Field = Field { lsb: 6, width: 4 };
        pub const KIND: Field = Field { lsb: 4, width: 2 };
        pub const COUNT: Field = Field { lsb: 0, width: 4 };
    }

    /// `[1110][cond3][offset9]`
    pub mod branch {
        use super::*;
        pub const PREFIX: Prefix = Prefix { bits: 0b1110, len: 4 };
        pub const COND: Field = Field { lsb: 9, width: 3 };
        pub const OFFSET: Field = Field { lsb: 0, width: 9 };
    }

    /// `[111110][Rd4][Rs4][imm2]`
    pub mod mov {
        use super::*;
        pub const PREFIX: Prefix = Prefix { bits: 0b111110, len: 6 };
        pub const RD: Field = Field { lsb: 6, width: 4 };
        pub const RS: Field = Field { lsb: 2, width: 4 };
        pub const IMM: Field = Field { lsb: 0, width: 2 };
    }

    /// `[1111110][Rd4][imm5]`
    pub mod lsi {
        use super::*;
        pub const PREFIX: Prefix = Prefix { bits: 0b1111110, len: 7 };
        pub const RD: Field = Field { lsb: 5, width: 4 };
        pub const IMM: Field = Field { lsb: 0, width: 5 };
    }

    /// `[11111110][type4][index4]`
    pub mod sop {
        use super::*;
        pub const PREFIX: Prefix = Prefix { bits: 0b1111_1110, len: 8 };
        pub const KIND: Field = Field { lsb: 4, width: 4 };
        pub const INDEX: Field = Field { lsb: 0, width: 4 };
        pub const SET: u16 = 0xC;
        pub const CLR: u16 = 0xD;
        pub const SET2: u16 = 0xE;
        pub const CLR2: u16 = 0xF;
    }

    /// `[1111111111110][op3]`
    pub mod sys {
        use super::*;
        pub const PREFIX: Prefix = Prefix { bits: 0b1_1111_1111_1110, len: 13 };
        pub const OP: Field = Field { lsb: 0, width: 3 };
    }

    pub const HALT_WORD: u16 = 0xFFFF;
}

use layout::*;

const ALU_CODES: [(u16, AluOp); 5] = [
    (0, AluOp::Add),
    (1, AluOp::Sub),
    (2, AluOp::And),
    (3, AluOp::Or),
    (4, AluOp::Xor),
];

const SHIFT_CODES: [(u16, ShiftOp); 4] = [
    (0, ShiftOp::Sl),
    (1, ShiftOp::Sr),
    (2, ShiftOp::Sra),
    (3, ShiftOp::Ror),
];

const COND_CODES: [(u16, Cond); 8] = [
    (0, Cond::Z),
    (1, Cond::Nz),
    (2, Cond::C),
    (3, Cond::Nc),
    (4, Cond::N),
    (5, Cond::Nn),
    (6, Cond::O),
    (7, Cond::No),
];

const SYS_CODES: [(u16, SysOp); 4] = [
    (0, SysOp::Nop),
    (1, SysOp::Hlt),
    (2, SysOp::Swi),
    (3, SysOp::Reti),
];

const FLAG_CODES: [(u16, bool, FlagGroup); 4] = [
    (sop::SET, true, FlagGroup::Low),
    (sop::CLR, false, FlagGroup::Low),
    (sop::SET2, true, FlagGroup::High),
    (sop::CLR2, false, FlagGroup::High),
];

fn code_of<T: PartialEq + Copy>(table: &[(u16, T)], value: T) -> u16 {
    table
        .iter()
        .find(|(_, v)| *v == value)
        .map(|(c, _)| *c)
        .unwrap_or_default()
}

fn value_of<T: Copy>(table: &[(u16, T)], code: u16) -> Option<T> {
    table.iter().find(|(c, _)| *c == code).map(|(_, v)| *v)
}

fn reg(field: Field, r: Reg) -> u16 {
    field.put(r.index() as u16)
}

fn unsigned(field: Field, value: i64) -> Result<u16, EncodingError> {
    if (0..=field.max_unsigned()).contains(&value) {
        Ok(field.put(value as u16))
    } else {
        Err(EncodingError::immediate(value, 0, field.max_unsigned()))
    }
}

fn signed(field: Field, value: i64) -> Result<u16, EncodingError> {
    if (field.min_signed()..=field.max_signed()).contains(&value) {
        Ok(field.put(value as i16 as u16))
    } else {
        Err(EncodingError::immediate(
            value,
            field.min_signed(),
            field.max_signed(),
        ))
    }
}

pub fn encode(instr: &Instr) -> Result<u16, EncodingError> {
    let word = match *instr {
        Instr::Ldi { imm } => ldi::PREFIX.place() | unsigned(ldi::IMM, imm as i64)?,
        Instr::Ld { rd, base, offset } => {
            mem::PREFIX.place()
                | mem::DIR.put(mem::LOAD)
                | reg(mem::RD, rd)
                | reg(mem::BASE, base)
                | signed(mem::OFFSET, offset as i64)?
        }
        Instr::St { rs, base, offset } => {
            mem::PREFIX.place()
                | mem::DIR.put(mem::STORE)
                | reg(mem::RD, rs)
                | reg(mem::BASE, base)
                | signed(mem::OFFSET, offset as i64)?
        }
        Instr::Alu { op, rd, src, write } => {
            if !write && op.flags_only_mnemonic().is_none() {
                return Err(EncodingError::UnsupportedForm(format!(
                    "{} without write-back",
                    op.mnemonic()
                )));
            }
            let src_bits = match src {
                Operand::Reg(r) => reg(alu::SRC, r),
                Operand::Imm(v) => alu::IMMEDIATE.put(1) | unsigned(alu::SRC, v as i64)?,
            };
            alu::PREFIX.place()
                | alu::OP.put(code_of(&ALU_CODES, op))
                | reg(alu::RD, rd)
                | alu::WRITE.put(write as u16)
                | src_bits
        }
        Instr::Shift { op, rd, count } => {
            shift::PREFIX.place()
                | reg(shift::RD, rd)
                | shift::KIND.put(code_of(&SHIFT_CODES, op))
                | unsigned(shift::COUNT, count as i64)?
        }
        Instr::Branch { cond, offset } => {
            let off = offset as i64;
            if !(branch::OFFSET.min_signed()..=branch::OFFSET.max_signed()).contains(&off) {
                return Err(EncodingError::BranchRangeExceeded { offset: off });
            }
            branch::PREFIX.place()
                | branch::COND.put(code_of(&COND_CODES, cond))
                | branch::OFFSET.put(offset as u16)
        }
        Instr::Mov { rd, rs, imm } => {
            mov::PREFIX.place()
                | reg(mov::RD, rd)
                | reg(mov::RS, rs)
                | unsigned(mov::IMM, imm as i64)?
        }
        Instr::Lsi { rd, imm } => {
            lsi::PREFIX.place() | reg(lsi::RD, rd) | signed(lsi::IMM, imm as i64)?
        }
        Instr::Flag { set, group, index } => {
            if index as i64 > sop::INDEX.max_unsigned() {
                return Err(EncodingError::FlagIndexOutOfRange(index as i64));
            }
            let kind = FLAG_CODES
                .iter()
                .find(|(_, s, g)| *s == set && *g == group)
                .map(|(k, _, _)| *k)
                .unwrap_or(sop::SET);
            sop::PREFIX.place() | sop::KIND.put(kind) | sop::INDEX.put(index as u16)
        }
        Instr::Sys(op) => sys::PREFIX.place() | sys::OP.put(code_of(&SYS_CODES, op)),
        Instr::Halt => HALT_WORD,
        Instr::Unknown(word) => word,
    };
    Ok(word)
}

pub fn decode(word: u16) -> Instr {
    if word == HALT_WORD {
        return Instr::Halt;
    }
    if sys::PREFIX.matches(word) {
        return value_of(&SYS_CODES, sys::OP.get(word))
            .map(Instr::Sys)
            .unwrap_or(Instr::Unknown(word));
    }
    if sop::PREFIX.matches(word) {
        let kind = sop::KIND.get(word);
        return FLAG_CODES
            .iter()
            .find(|(k, _, _)| *k == kind)
            .map(|&(_, set, group)| Instr::Flag {
                set,
                group,
                index: sop::INDEX.get(word) as u8,
            })
            .unwrap_or(Instr::Unknown(word));
    }
    if lsi::PREFIX.matches(word) {
        return Instr::Lsi {
            rd: Reg::from_field(lsi::RD.get(word)),
            imm: lsi::IMM.get_signed(word) as i8,
        };
    }
    if mov::PREFIX.matches(word) {
        return Instr::Mov {
            rd: Reg::from_field(mov::RD.get(word)),
            rs: Reg::from_field(mov::RS.get(word)),
            imm: mov::IMM.get(word) as u8,
        };
    }
    if shift::PREFIX.matches(word) {
        return match value_of(&SHIFT_CODES, shift::KIND.get(word)) {
            Some(op) => Instr::Shift {
                op,
                rd: Reg::from_field(shift::RD.get(word)),
                count: shift::COUNT.get(word) as u8,
            },
            None => Instr::Unknown(word),
        };
    }
    if branch::PREFIX.matches(word) {
        return match value_of(&COND_CODES, branch::COND.get(word)) {
            Some(cond) => Instr::Branch {
                cond,
                offset: branch::OFFSET.get_signed(word),
            },
            None => Instr::Unknown(word),
        };
    }
    if alu::PREFIX.matches(word) {
        let Some(op) = value_of(&ALU_CODES, alu::OP.get(word)) else {
            return Instr::Unknown(word);
        };
        let write = alu::WRITE.get(word) == 1;
        if !write && op.flags_only_mnemonic().is_none() {
            return Instr::Unknown(word);
        }
        let raw = alu::SRC.get(word);
        let src = if alu::IMMEDIATE.get(word) == 1 {
            Operand::Imm(raw as u8)
        } else {
            Operand::Reg(Reg::from_field(raw))
        };
        return Instr::Alu {
            op,
            rd: Reg::from_field(alu::RD.get(word)),
            src,
            write,
        };
    }
    if mem::PREFIX.matches(word) {
        let r = Reg::from_field(mem::RD.get(word));
        let base = Reg::from_field(mem::BASE.get(word));
        let offset = mem::OFFSET.get_signed(word) as i8;
        return if mem::DIR.get(word) == mem::STORE {
            Instr::St { rs: r, base, offset }
        } else {
            Instr::Ld { rd: r, base, offset }
        };
    }
    if ldi::PREFIX.matches(word) {
        return Instr::Ldi {
            imm: ldi::IMM.get(word),
        };
    }
    Instr::Unknown(word)
}
