pub mod asm;
pub mod cpu;
pub mod decoder;
pub mod disasm;
pub mod error;
pub mod exec;
pub mod instructions;
pub mod memory;
pub mod sim;

pub mod isa {
    pub mod deep16;
}

pub use asm::{assemble, AssemblyResult, ListingEntry, MemoryChange};
pub use cpu::{Cpu, CpuConfig, Psw};
pub use decoder::{Decoder, Instr, Reg};
pub use disasm::disassemble;
pub use error::{EncodingError, LineError};
pub use isa::deep16::Deep16Codec;
pub use memory::{Bus, Memory};
pub use sim::{RunOutcome, Simulator};
