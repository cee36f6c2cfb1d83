use crate::decoder::{AluOp, Cond, FlagGroup, ShiftOp, SysOp};

/// Operand shape accepted by a mnemonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Form {
    /// `LDI imm15`
    Ldi,
    /// `LD Rd, Rb[, off]` / `ST Rs, Rb[, off]`
    Mem { store: bool },
    /// `OP Rd, Rs|imm4`
    Alu { op: AluOp, write: bool },
    /// `OP Rd[, count]`
    Shift(ShiftOp),
    /// `Jcc label|offset`
    Branch(Cond),
    /// `MOV Rd, Rs[, imm2]`
    Mov,
    /// `LSI Rd, imm5`
    Lsi,
    /// `SET idx`, or an alias with the index baked in (`SETZ`).
    Flag {
        set: bool,
        group: FlagGroup,
        index: Option<u8>,
    },
    Sys(SysOp),
    Halt,
}

#[derive(Debug, Clone, Copy)]
pub struct InstrDesc {
    pub mnemonic: &'static str,
    pub form: Form,
}

const fn desc(mnemonic: &'static str, form: Form) -> InstrDesc {
    InstrDesc { mnemonic, form }
}

const fn flag(mnemonic: &'static str, set: bool, group: FlagGroup, index: u8) -> InstrDesc {
    desc(
        mnemonic,
        Form::Flag {
            set,
            group,
            index: Some(index),
        },
    )
}

pub const TABLE: &[InstrDesc] = &[
    desc("LDI", Form::Ldi),
    desc("LD", Form::Mem { store: false }),
    desc("ST", Form::Mem { store: true }),
    desc("ADD", Form::Alu { op: AluOp::Add, write: true }),
    desc("SUB", Form::Alu { op: AluOp::Sub, write: true }),
    desc("AND", Form::Alu { op: AluOp::And, write: true }),
    desc("OR", Form::Alu { op: AluOp::Or, write: true }),
    desc("XOR", Form::Alu { op: AluOp::Xor, write: true }),
    desc("ANW", Form::Alu { op: AluOp::Add, write: false }),
    desc("CMP", Form::Alu { op: AluOp::Sub, write: false }),
    desc("TBS", Form::Alu { op: AluOp::And, write: false }),
    desc("SL", Form::Shift(ShiftOp::Sl)),
    desc("SR", Form::Shift(ShiftOp::Sr)),
    desc("SRA", Form::Shift(ShiftOp::Sra)),
    desc("ROR", Form::Shift(ShiftOp::Ror)),
    desc("JZ", Form::Branch(Cond::Z)),
    desc("JNZ", Form::Branch(Cond::Nz)),
    desc("JC", Form::Branch(Cond::C)),
    desc("JNC", Form::Branch(Cond::Nc)),
    desc("JN", Form::Branch(Cond::N)),
    desc("JNN", Form::Branch(Cond::Nn)),
    desc("JO", Form::Branch(Cond::O)),
    desc("JNO", Form::Branch(Cond::No)),
    desc("MOV", Form::Mov),
    desc("LSI", Form::Lsi),
    desc("SET", Form::Flag { set: true, group: FlagGroup::Low, index: None }),
    desc("CLR", Form::Flag { set: false, group: FlagGroup::Low, index: None }),
    desc("SET2", Form::Flag { set: true, group: FlagGroup::High, index: None }),
    desc("CLR2", Form::Flag { set: false, group: FlagGroup::High, index: None }),
    flag("SETN", true, FlagGroup::Low, 0),
    flag("CLRN", false, FlagGroup::Low, 0),
    flag("SETZ", true, FlagGroup::Low, 1),
    flag("CLRZ", false, FlagGroup::Low, 1),
    flag("SETV", true, FlagGroup::Low, 2),
    flag("CLRV", false, FlagGroup::Low, 2),
    flag("SETC", true, FlagGroup::Low, 3),
    flag("CLRC", false, FlagGroup::Low, 3),
    flag("SETI", true, FlagGroup::High, 0),
    flag("CLRI", false, FlagGroup::High, 0),
    flag("SETS", true, FlagGroup::High, 1),
    flag("CLRS", false, FlagGroup::High, 1),
    desc("NOP", Form::Sys(SysOp::Nop)),
    desc("HLT", Form::Sys(SysOp::Hlt)),
    desc("SWI", Form::Sys(SysOp::Swi)),
    desc("RETI", Form::Sys(SysOp::Reti)),
    desc("HALT", Form::Halt),
];

/// Case-insensitive mnemonic lookup.
pub fn lookup(mnemonic: &str) -> Option<&'static InstrDesc> {
    TABLE
        .iter()
        .find(|d| d.mnemonic.eq_ignore_ascii_case(mnemonic))
}

/// Alias that names this flag operation outright, if there is one.
pub fn flag_alias(set: bool, group: FlagGroup, index: u8) -> Option<&'static str> {
    TABLE.iter().find_map(|d| match d.form {
        Form::Flag {
            set: s,
            group: g,
            index: Some(i),
        } if s == set && g == group && i == index => Some(d.mnemonic),
        _ => None,
    })
}
