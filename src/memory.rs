use serde::{Deserialize, Serialize};

/// Number of addressable words.
pub const MEMORY_WORDS: usize = 0x1_0000;

/// Word-addressed memory. A 16-bit address can never be out of range.
pub trait Bus {
    fn read(&self, addr: u16) -> u16;
    fn write(&mut self, addr: u16, val: u16);
}

#[derive(Clone, Serialize, Deserialize)]
pub struct Memory {
    words: Box<[u16]>,
}

impl Memory {
    pub fn new() -> Self {
        Self::filled(0)
    }

    pub fn filled(value: u16) -> Self {
        Self {
            words: vec![value; MEMORY_WORDS].into_boxed_slice(),
        }
    }

    /// Copies `words` in starting at `addr`; anything past 0xFFFF is dropped.
    pub fn load(&mut self, addr: u16, words: &[u16]) -> usize {
        let start = addr as usize;
        let n = words.len().min(MEMORY_WORDS - start);
        self.words[start..start + n].copy_from_slice(&words[..n]);
        n
    }

    /// Returns up to `len` words starting at `addr`, stopping at the end of memory.
    pub fn slice(&self, addr: u16, len: usize) -> &[u16] {
        let start = addr as usize;
        let end = start.saturating_add(len).min(MEMORY_WORDS);
        &self.words[start..end]
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let used = self.words.iter().filter(|w| **w != 0).count();
        f.debug_struct("Memory").field("nonzero_words", &used).finish()
    }
}

impl Bus for Memory {
    fn read(&self, addr: u16) -> u16 {
        self.words[addr as usize]
    }

    fn write(&mut self, addr: u16, val: u16) {
        self.words[addr as usize] = val;
    }
}
