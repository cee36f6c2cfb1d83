use crate::decoder::{Decoder, Instr, Operand};
use crate::instructions::flag_alias;
use crate::isa::deep16::Deep16Codec;

/// Renders one word. Never fails; unrecognized words come back as `.word 0xNNNN`.
pub fn disassemble(word: u16) -> String {
    fmt_decoded(&Deep16Codec::new().decode(word))
}

/// Output is valid assembler input that encodes back to the same word.
pub fn fmt_decoded(d: &Instr) -> String {
    match *d {
        Instr::Ldi { imm } => format!("LDI {imm:#06x}"),
        Instr::Ld { rd, base, offset } => format!("LD {rd}, {base}, {offset}"),
        Instr::St { rs, base, offset } => format!("ST {rs}, {base}, {offset}"),
        Instr::Alu { op, rd, src, write } => {
            let mn = if write {
                op.mnemonic()
            } else {
                op.flags_only_mnemonic().unwrap_or(op.mnemonic())
            };
            match src {
                Operand::Reg(rs) => format!("{mn} {rd}, {rs}"),
                Operand::Imm(v) => format!("{mn} {rd}, {v}"),
            }
        }
        Instr::Shift { op, rd, count } => format!("{} {rd}, {count}", op.mnemonic()),
        Instr::Branch { cond, offset } => format!("{} {offset}", cond.mnemonic()),
        Instr::Mov { rd, rs, imm } => {
            if imm == 0 {
                format!("MOV {rd}, {rs}")
            } else {
                format!("MOV {rd}, {rs}, {imm}")
            }
        }
        Instr::Lsi { rd, imm } => format!("LSI {rd}, {imm}"),
        Instr::Flag { set, group, index } => match flag_alias(set, group, index) {
            Some(alias) => alias.to_string(),
            None => {
                let base = if set { "SET" } else { "CLR" };
                let suffix = if group.base_bit() == 0 { "" } else { "2" };
                format!("{base}{suffix} {index}")
            }
        },
        Instr::Sys(op) => op.mnemonic().to_string(),
        Instr::Halt => "HALT".to_string(),
        Instr::Unknown(w) => format!(".word {w:#06x}"),
    }
}
