use crate::decoder::{Decoder, Reg};
use crate::exec::Executor;
use crate::memory::Bus;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CpuConfig {
    pub sp_reset: u16, // top of the LDI-loadable range
    pub swi_vector: u16,
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self {
            sp_reset: 0x7FFF,
            swi_vector: 0x0020,
        }
    }
}

bitflags! {
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Psw: u16 {
const N = 1 << 0; // Negative
const Z = 1 << 1; // Zero
const V = 1 << 2; // Overflow
const C = 1 << 3; // Carry
const I = 1 << 4; // Interrupt enable
const S = 1 << 5; // Privileged (system) mode
const SR = 0b1111 << 6;
const DS = 1 << 10;
const ER = 0b1111 << 11;
const DE = 1 << 15;
}
}

impl Psw {
    pub fn sr(self) -> u8 {
        ((self.bits() >> 6) & 0xF) as u8
    }

    pub fn er(self) -> u8 {
        ((self.bits() >> 11) & 0xF) as u8
    }

    /// Overwrites N, Z, V and C, leaving every other bit alone.
    pub fn set_nzvc(&mut self, n: bool, z: bool, v: bool, c: bool) {
        self.set(Psw::N, n);
        self.set(Psw::Z, z);
        self.set(Psw::V, v);
        self.set(Psw::C, c);
    }
}

/// Tracked and displayed; memory accesses do not go through them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segments {
    pub cs: u16,
    pub ds: u16,
    pub ss: u16,
    pub es: u16,
}

/// Context saved by SWI and restored by RETI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shadow {
    pub psw: Psw,
    pub pc: u16,
    pub cs: u16,
}

/// What the run loop should do after an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Halt,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cpu {
    pub regs: [u16; 16],
    pub psw: Psw,
    pub seg: Segments,
    pub shadow: Shadow,
    pub running: bool,
    pub cfg: CpuConfig,
}

impl Cpu {
    pub fn new(cfg: CpuConfig) -> Self {
        let mut cpu = Self {
            regs: [0; 16],
            psw: Psw::empty(),
            seg: Segments::default(),
            shadow: Shadow::default(),
            running: false,
            cfg,
        };
        cpu.reset();
        cpu
    }

    pub fn reset(&mut self) {
        self.regs = [0; 16];
        self.regs[Reg::SP.index()] = self.cfg.sp_reset;
        self.psw = Psw::empty();
        self.seg = Segments::default();
        self.shadow = Shadow::default();
        self.running = false;
    }

    pub fn pc(&self) -> u16 {
        self.regs[Reg::PC.index()]
    }

    pub fn set_pc(&mut self, pc: u16) {
        self.regs[Reg::PC.index()] = pc;
    }

    pub fn reg(&self, r: Reg) -> u16 {
        self.regs[r.index()]
    }

    pub fn set_reg(&mut self, r: Reg, val: u16) {
        self.regs[r.index()] = val;
    }

    /// Fetch, decode, execute one word. PC is advanced before execution, so
    /// control-flow instructions simply overwrite it. A halt leaves PC on
    /// the halting instruction.
    pub fn step<B: Bus, D: Decoder, X: Executor>(
        &mut self,
        bus: &mut B,
        dec: &D,
        exec: &X,
    ) -> Flow {
        let pc = self.pc();
        let word = bus.read(pc);
        let instr = dec.decode(word);
        tracing::trace!(pc, word, ?instr, "step");
        self.set_pc(pc.wrapping_add(1));
        self.running = true;
        let flow = exec.exec(self, bus, instr);
        if flow == Flow::Halt {
            self.set_pc(pc);
            self.running = false;
        }
        flow
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_presets_sp_and_pc() {
        let mut cpu = Cpu::new(CpuConfig::default());
        cpu.regs = [0x1234; 16];
        cpu.psw = Psw::all();
        cpu.seg.ds = 0x1000;
        cpu.shadow.pc = 9;
        cpu.reset();
        assert_eq!(cpu.reg(Reg::SP), 0x7FFF);
        assert_eq!(cpu.pc(), 0);
        assert_eq!(cpu.reg(Reg::R0), 0);
        assert_eq!(cpu.psw, Psw::empty());
        assert_eq!(cpu.seg, Segments::default());
        assert_eq!(cpu.shadow, Shadow::default());
    }

    #[test]
    fn psw_fields() {
        let psw = Psw::from_bits_retain(0b1_1010_1_0110_00_1001);
        assert_eq!(psw.sr(), 0b0110);
        assert_eq!(psw.er(), 0b1010);
        assert!(psw.contains(Psw::DE | Psw::DS | Psw::C | Psw::N));
        assert!(!psw.contains(Psw::Z));
    }
}
