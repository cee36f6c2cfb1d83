use crate::cpu::{Cpu, Flow, Psw, Shadow};
use crate::decoder::{AluOp, Cond, Instr, Operand, ShiftOp, SysOp};
use crate::memory::Bus;

pub trait Executor {
    fn exec<B: Bus>(&self, cpu: &mut Cpu, bus: &mut B, d: Instr) -> Flow;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IntExecutor;
impl Executor for IntExecutor {
    fn exec<B: Bus>(&self, cpu: &mut Cpu, bus: &mut B, d: Instr) -> Flow {
        match d {
            Instr::Ldi { imm } => {
                cpu.regs[0] = imm;
            }
            Instr::Ld { rd, base, offset } => {
                let addr = cpu.reg(base).wrapping_add(offset as i16 as u16);
                let val = bus.read(addr);
                cpu.set_reg(rd, val);
            }
            Instr::St { rs, base, offset } => {
                let addr = cpu.reg(base).wrapping_add(offset as i16 as u16);
                bus.write(addr, cpu.reg(rs));
            }
            Instr::Alu { op, rd, src, write } => {
                let a = cpu.reg(rd);
                let b = match src {
                    Operand::Reg(rs) => cpu.reg(rs),
                    Operand::Imm(v) => v as u16,
                };
                let (res, v, c) = alu(op, a, b);
                cpu.psw.set_nzvc(res & 0x8000 != 0, res == 0, v, c);
                if write {
                    cpu.set_reg(rd, res);
                }
            }
            Instr::Shift { op, rd, count } => {
                let (res, c) = shift(op, cpu.reg(rd), count as u32);
                cpu.psw.set_nzvc(res & 0x8000 != 0, res == 0, false, c);
                cpu.set_reg(rd, res);
            }
            Instr::Branch { cond, offset } => {
                if taken(cond, cpu.psw) {
                    // PC already points past the branch
                    let target = cpu.pc().wrapping_add(offset as u16);
                    cpu.set_pc(target);
                }
            }
            Instr::Mov { rd, rs, imm } => {
                let val = cpu.reg(rs).wrapping_add(imm as u16);
                cpu.set_reg(rd, val);
            }
            Instr::Lsi { rd, imm } => {
                cpu.set_reg(rd, imm as i16 as u16);
            }
            Instr::Flag { set, group, index } => {
                let mask = Psw::from_bits_retain(1 << group.bit(index));
                cpu.psw.set(mask, set);
            }
            Instr::Sys(SysOp::Nop) => {}
            Instr::Sys(SysOp::Hlt) | Instr::Halt => return Flow::Halt,
            Instr::Sys(SysOp::Swi) => {
                cpu.shadow = Shadow {
                    psw: cpu.psw,
                    pc: cpu.pc(),
                    cs: cpu.seg.cs,
                };
                cpu.psw.insert(Psw::S);
                cpu.psw.remove(Psw::I);
                cpu.set_pc(cpu.cfg.swi_vector);
            }
            Instr::Sys(SysOp::Reti) => {
                cpu.psw = cpu.shadow.psw;
                cpu.seg.cs = cpu.shadow.cs;
                cpu.set_pc(cpu.shadow.pc);
            }
            Instr::Unknown(word) => {
                tracing::debug!(word, "unrecognized word executed as no-op");
            }
        }
        Flow::Continue
    }
}

/// Returns `(result, overflow, carry)`.
fn alu(op: AluOp, a: u16, b: u16) -> (u16, bool, bool) {
    match op {
        AluOp::Add => {
            let (res, carry) = a.overflowing_add(b);
            let overflow = (a ^ res) & (b ^ res) & 0x8000 != 0;
            (res, overflow, carry)
        }
        AluOp::Sub => {
            let (res, borrow) = a.overflowing_sub(b);
            let overflow = (a ^ b) & (a ^ res) & 0x8000 != 0;
            (res, overflow, borrow)
        }
        AluOp::And => (a & b, false, false),
        AluOp::Or => (a | b, false, false),
        AluOp::Xor => (a ^ b, false, false),
    }
}

/// Returns `(result, last bit shifted out)`. A zero count leaves the value and clears carry.
fn shift(op: ShiftOp, a: u16, n: u32) -> (u16, bool) {
    if n == 0 {
        return (a, false);
    }
    match op {
        ShiftOp::Sl => (a << n, (a >> (16 - n)) & 1 != 0),
        ShiftOp::Sr => (a >> n, (a >> (n - 1)) & 1 != 0),
        ShiftOp::Sra => (((a as i16) >> n) as u16, (a >> (n - 1)) & 1 != 0),
        ShiftOp::Ror => (a.rotate_right(n), (a >> (n - 1)) & 1 != 0),
    }
}

fn taken(cond: Cond, psw: Psw) -> bool {
    match cond {
        Cond::Z => psw.contains(Psw::Z),
        Cond::Nz => !psw.contains(Psw::Z),
        Cond::C => psw.contains(Psw::C),
        Cond::Nc => !psw.contains(Psw::C),
        Cond::N => psw.contains(Psw::N),
        Cond::Nn => !psw.contains(Psw::N),
        Cond::O => psw.contains(Psw::V),
        Cond::No => !psw.contains(Psw::V),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_sub_flags() {
        assert_eq!(alu(AluOp::Add, 0xFFFF, 1), (0, false, true));
        assert_eq!(alu(AluOp::Add, 0x7FFF, 1), (0x8000, true, false));
        assert_eq!(alu(AluOp::Sub, 0, 1), (0xFFFF, false, true));
        assert_eq!(alu(AluOp::Sub, 0x8000, 1), (0x7FFF, true, false));
        assert_eq!(alu(AluOp::Sub, 5, 5), (0, false, false));
    }

    #[test]
    fn shift_carry_out() {
        assert_eq!(shift(ShiftOp::Sl, 0x8001, 1), (0x0002, true));
        assert_eq!(shift(ShiftOp::Sl, 0x4000, 2), (0x0000, true));
        assert_eq!(shift(ShiftOp::Sr, 0x0003, 1), (0x0001, true));
        assert_eq!(shift(ShiftOp::Sra, 0x8000, 15), (0xFFFF, false));
        assert_eq!(shift(ShiftOp::Ror, 0x0001, 1), (0x8000, true));
        assert_eq!(shift(ShiftOp::Ror, 0x1234, 0), (0x1234, false));
    }
}
