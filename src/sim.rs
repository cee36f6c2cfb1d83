use serde::Serialize;

use crate::asm::MemoryChange;
use crate::cpu::{Cpu, CpuConfig, Flow};
use crate::exec::IntExecutor;
use crate::isa::deep16::Deep16Codec;
use crate::memory::{Memory, MEMORY_WORDS};

/// Result of [`Simulator::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunOutcome {
    pub steps: u64,
    pub halted: bool,
}

/// CPU plus its memory, driven one instruction per [`Simulator::step`].
///
/// Owned by a single caller; concurrent stepping must be serialized outside.
#[derive(Debug, Clone)]
pub struct Simulator {
    pub cpu: Cpu,
    pub mem: Memory,
    codec: Deep16Codec,
    exec: IntExecutor,
}

impl Simulator {
    /// Memory starts filled with the HALT sentinel so a runaway PC stops.
    pub fn new(cfg: CpuConfig) -> Self {
        Self {
            cpu: Cpu::new(cfg),
            mem: Memory::filled(0xFFFF),
            codec: Deep16Codec::new(),
            exec: IntExecutor,
        }
    }

    /// Registers, PSW, segment and shadow registers back to power-on values.
    /// Memory is left as it is.
    pub fn reset(&mut self) {
        self.cpu.reset();
    }

    /// Executes one instruction. Returns `false` once a HALT has executed.
    pub fn step(&mut self) -> bool {
        self.cpu.step(&mut self.mem, &self.codec, &self.exec) == Flow::Continue
    }

    /// Steps until a HALT or until `max_steps` instructions have run.
    pub fn run(&mut self, max_steps: u64) -> RunOutcome {
        let mut steps = 0;
        while steps < max_steps {
            steps += 1;
            if !self.step() {
                tracing::debug!(steps, pc = self.cpu.pc(), "halted");
                return RunOutcome {
                    steps,
                    halted: true,
                };
            }
        }
        RunOutcome {
            steps,
            halted: false,
        }
    }

    /// Replaces all of memory with `image` (shorter images leave the tail untouched).
    pub fn load_image(&mut self, image: &[u16]) {
        self.mem.load(0, &image[..image.len().min(MEMORY_WORDS)]);
    }

    /// Applies sparse `{address, value}` writes in order.
    pub fn load_changes(&mut self, changes: &[MemoryChange]) {
        for ch in changes {
            self.mem.load(ch.address, &[ch.value]);
        }
    }

    pub fn load_words(&mut self, addr: u16, words: &[u16]) -> usize {
        self.mem.load(addr, words)
    }
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new(CpuConfig::default())
    }
}
