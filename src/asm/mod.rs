//! Two-pass assembler.
//!
//! Pass 1 walks the parsed lines and binds every label to a word address.
//! Pass 2 walks the same lines with a fresh address counter, resolves label
//! operands against the pass-1 table and writes encoded words into a 64K-word
//! image. Both passes size lines with [`size_of`], so they always agree on
//! addresses. Per-line failures are collected, never propagated.

mod parse;

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::decoder::{Instr, Operand, Reg};
use crate::error::{EncodingError, LineError};
use crate::instructions::{lookup, Form, InstrDesc};
use crate::isa::deep16::{layout, Deep16Codec, Field};
use crate::memory::MEMORY_WORDS;
use parse::{is_identifier, parse_line, parse_number, Stmt};

/// One record per source line, in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingEntry {
    /// 1-based source line number.
    pub line: usize,
    pub address: Option<u16>,
    /// Words emitted by this line: none, one instruction, or `.word` data.
    pub words: Vec<u16>,
    pub source: String,
    pub error: Option<EncodingError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryChange {
    pub address: u16,
    pub value: u16,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssemblyResult {
    /// True iff `errors` is empty.
    pub success: bool,
    /// Full 64K-word image. Best effort when `success` is false.
    #[serde(skip)]
    pub memory: Vec<u16>,
    pub symbols: BTreeMap<String, u16>,
    /// Ordered by line.
    pub errors: Vec<LineError>,
    pub listing: Vec<ListingEntry>,
}

impl AssemblyResult {
    /// Every emitted word as `{address, value}`, in emission order.
    pub fn memory_changes(&self) -> Vec<MemoryChange> {
        self.listing
            .iter()
            .filter_map(|e| e.address.map(|a| (a, &e.words)))
            .flat_map(|(a, words)| {
                words.iter().enumerate().map(move |(i, &value)| MemoryChange {
                    address: a.wrapping_add(i as u16),
                    value,
                })
            })
            .collect()
    }

    /// Errors rendered as `Line N: message`.
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

/// Assembles a complete source text. Never fails as a whole; check `success`.
pub fn assemble(source: &str) -> AssemblyResult {
    Assembler::new(source).run()
}

struct SourceLine<'a> {
    number: usize,
    text: &'a str,
    stmt: Result<Stmt, EncodingError>,
}

struct Assembler<'a> {
    lines: Vec<SourceLine<'a>>,
    /// Every label name written as `name:` anywhere in the source.
    declared: HashSet<String>,
    symbols: BTreeMap<String, u16>,
    /// Parse and symbol errors found in pass 1, keyed by line.
    early: HashMap<usize, EncodingError>,
    errors: Vec<LineError>,
    codec: Deep16Codec,
}

impl<'a> Assembler<'a> {
    fn new(source: &'a str) -> Self {
        let lines: Vec<SourceLine<'a>> = source
            .lines()
            .enumerate()
            .map(|(i, text)| SourceLine {
                number: i + 1,
                text,
                stmt: parse_line(text),
            })
            .collect();
        let declared = lines
            .iter()
            .filter_map(|l| match &l.stmt {
                Ok(Stmt::Label(name)) => Some(name.clone()),
                _ => None,
            })
            .collect();
        Self {
            lines,
            declared,
            symbols: BTreeMap::new(),
            early: HashMap::new(),
            errors: Vec::new(),
            codec: Deep16Codec::new(),
        }
    }

    fn run(mut self) -> AssemblyResult {
        self.pass1();
        tracing::debug!(
            symbols = self.symbols.len(),
            errors = self.errors.len(),
            "pass 1 done"
        );
        let (memory, listing) = self.pass2();
        self.errors.sort_by_key(|e| e.line);
        tracing::debug!(errors = self.errors.len(), "pass 2 done");
        AssemblyResult {
            success: self.errors.is_empty(),
            memory,
            symbols: self.symbols,
            errors: self.errors,
            listing,
        }
    }

    fn fail(&mut self, line: usize, error: EncodingError) {
        self.errors.push(LineError { line, error });
    }

    fn pass1(&mut self) {
        let mut addr: u32 = 0;
        let mut defined_at: HashMap<String, usize> = HashMap::new();
        let mut found = Vec::new();
        for line in &self.lines {
            match &line.stmt {
                Err(e) => found.push((line.number, e.clone())),
                Ok(Stmt::Org(v)) => addr = *v as u32,
                Ok(Stmt::Label(name)) => {
                    if let Some(&first_line) = defined_at.get(name) {
                        found.push((
                            line.number,
                            EncodingError::DuplicateLabel {
                                name: name.clone(),
                                first_line,
                            },
                        ));
                    } else if addr as usize >= MEMORY_WORDS {
                        found.push((line.number, EncodingError::AddressOverflow(addr)));
                    } else {
                        defined_at.insert(name.clone(), line.number);
                        self.symbols.insert(name.clone(), addr as u16);
                    }
                }
                Ok(stmt) => addr += size_of(stmt, &self.declared),
            }
        }
        for (line, error) in found {
            self.early.insert(line, error.clone());
            self.fail(line, error);
        }
    }

    fn pass2(&mut self) -> (Vec<u16>, Vec<ListingEntry>) {
        let mut memory = vec![0u16; MEMORY_WORDS];
        let mut listing = Vec::with_capacity(self.lines.len());
        let mut addr: u32 = 0;
        let mut found = Vec::new();
        for line in &self.lines {
            let number = line.number;
            let mut entry = ListingEntry {
                line: number,
                address: None,
                words: Vec::new(),
                source: line.text.to_string(),
                error: self.early.get(&number).cloned(),
            };
            match &line.stmt {
                Err(_) | Ok(Stmt::Empty) => {}
                Ok(Stmt::Org(v)) => {
                    addr = *v as u32;
                    entry.address = Some(*v);
                }
                Ok(Stmt::Label(_)) => entry.address = u16::try_from(addr).ok(),
                Ok(stmt) => {
                    let size = size_of(stmt, &self.declared);
                    entry.address = u16::try_from(addr).ok();
                    match self.emit(stmt, addr, size) {
                        Ok(words) => {
                            let start = addr as usize;
                            memory[start..start + words.len()].copy_from_slice(&words);
                            entry.words = words;
                        }
                        Err(e) => {
                            entry.error = Some(e.clone());
                            found.push((number, e));
                        }
                    }
                    addr += size;
                }
            }
            listing.push(entry);
        }
        for (line, error) in found {
            self.fail(line, error);
        }
        (memory, listing)
    }

    fn emit(&self, stmt: &Stmt, addr: u32, size: u32) -> Result<Vec<u16>, EncodingError> {
        if size > 0 && (addr + size) as usize > MEMORY_WORDS {
            return Err(EncodingError::AddressOverflow(addr + size - 1));
        }
        match stmt {
            Stmt::Word(values) => values.iter().map(|v| self.data_word(v)).collect(),
            Stmt::Instr { mnemonic, operands } => match lookup(mnemonic) {
                Some(desc) => {
                    let instr = self.build(desc, operands, addr as u16)?;
                    Ok(vec![self.codec.encode(&instr)?])
                }
                // A bare declared label where an instruction was expected emits nothing.
                None if operands.is_empty() && self.declared.contains(mnemonic) => Ok(vec![]),
                None => Err(EncodingError::UnknownInstruction(mnemonic.clone())),
            },
            Stmt::Empty | Stmt::Label(_) | Stmt::Org(_) => Ok(vec![]),
        }
    }

    fn data_word(&self, token: &str) -> Result<u16, EncodingError> {
        if let Some(v) = parse_number(token) {
            return Ok((v & 0xFFFF) as u16);
        }
        if is_identifier(token) {
            return self.label(token);
        }
        Err(EncodingError::InvalidImmediate {
            value: token.to_string(),
            expected: "a number or label".into(),
        })
    }

    fn label(&self, name: &str) -> Result<u16, EncodingError> {
        self.symbols
            .get(name)
            .copied()
            .ok_or_else(|| EncodingError::UnknownLabel(name.to_string()))
    }

    /// Turns operand tokens into a typed instruction. `addr` is where it will live.
    fn build(&self, desc: &InstrDesc, ops: &[String], addr: u16) -> Result<Instr, EncodingError> {
        let mn = desc.mnemonic;
        let instr = match desc.form {
            Form::Ldi => {
                arity(mn, ops, 1, 1, "1")?;
                Instr::Ldi {
                    imm: unsigned(&ops[0], layout::ldi::IMM)?,
                }
            }
            Form::Mem { store } => {
                arity(mn, ops, 2, 3, "2 or 3")?;
                let r = reg(&ops[0])?;
                let base = reg(&ops[1])?;
                let offset = match ops.get(2) {
                    Some(t) => signed(t, layout::mem::OFFSET)? as i8,
                    None => 0,
                };
                if store {
                    Instr::St { rs: r, base, offset }
                } else {
                    Instr::Ld { rd: r, base, offset }
                }
            }
            Form::Alu { op, write } => {
                arity(mn, ops, 2, 2, "2")?;
                let rd = reg(&ops[0])?;
                let src = match Reg::parse(&ops[1]) {
                    Some(rs) => Operand::Reg(rs),
                    None if looks_like_register(&ops[1]) => {
                        return Err(EncodingError::UnknownRegister(ops[1].clone()))
                    }
                    None => Operand::Imm(unsigned(&ops[1], layout::alu::SRC)? as u8),
                };
                Instr::Alu { op, rd, src, write }
            }
            Form::Shift(op) => {
                arity(mn, ops, 1, 2, "1 or 2")?;
                let rd = reg(&ops[0])?;
                let count = match ops.get(1) {
                    Some(t) => unsigned(t, layout::shift::COUNT)? as u8,
                    None => 1,
                };
                Instr::Shift { op, rd, count }
            }
            Form::Branch(cond) => {
                arity(mn, ops, 1, 1, "1")?;
                let offset = match parse_number(&ops[0]) {
                    Some(v) => v,
                    None => self.label(&ops[0])? as i64 - (addr as i64 + 1),
                };
                let field = layout::branch::OFFSET;
                if !(field.min_signed()..=field.max_signed()).contains(&offset) {
                    return Err(EncodingError::BranchRangeExceeded { offset });
                }
                Instr::Branch {
                    cond,
                    offset: offset as i16,
                }
            }
            Form::Mov => {
                arity(mn, ops, 2, 3, "2 or 3")?;
                let rd = reg(&ops[0])?;
                let rs = reg(&ops[1])?;
                let imm = match ops.get(2) {
                    Some(t) => unsigned(t, layout::mov::IMM)? as u8,
                    None => 0,
                };
                Instr::Mov { rd, rs, imm }
            }
            Form::Lsi => {
                arity(mn, ops, 2, 2, "2")?;
                Instr::Lsi {
                    rd: reg(&ops[0])?,
                    imm: signed(&ops[1], layout::lsi::IMM)? as i8,
                }
            }
            Form::Flag {
                set,
                group,
                index: Some(index),
            } => {
                arity(mn, ops, 0, 0, "0")?;
                Instr::Flag { set, group, index }
            }
            Form::Flag {
                set,
                group,
                index: None,
            } => {
                arity(mn, ops, 1, 1, "1")?;
                let v = number(&ops[0], "a flag index in 0..=15")?;
                if !(0..=layout::sop::INDEX.max_unsigned()).contains(&v) {
                    return Err(EncodingError::FlagIndexOutOfRange(v));
                }
                Instr::Flag {
                    set,
                    group,
                    index: v as u8,
                }
            }
            Form::Sys(op) => {
                arity(mn, ops, 0, 0, "0")?;
                Instr::Sys(op)
            }
            Form::Halt => {
                arity(mn, ops, 0, 0, "0")?;
                Instr::Halt
            }
        };
        Ok(instr)
    }
}

/// Words a statement occupies. Shared by both passes.
fn size_of(stmt: &Stmt, declared: &HashSet<String>) -> u32 {
    match stmt {
        Stmt::Empty | Stmt::Label(_) | Stmt::Org(_) => 0,
        Stmt::Word(values) => values.len() as u32,
        Stmt::Instr { mnemonic, operands } => {
            if lookup(mnemonic).is_none() && operands.is_empty() && declared.contains(mnemonic) {
                0
            } else {
                1
            }
        }
    }
}

fn arity(
    mnemonic: &str,
    ops: &[String],
    min: usize,
    max: usize,
    expected: &'static str,
) -> Result<(), EncodingError> {
    if (min..=max).contains(&ops.len()) {
        Ok(())
    } else {
        Err(EncodingError::OperandCount {
            mnemonic: mnemonic.to_string(),
            expected,
            found: ops.len(),
        })
    }
}

fn reg(token: &str) -> Result<Reg, EncodingError> {
    Reg::parse(token).ok_or_else(|| EncodingError::UnknownRegister(token.to_string()))
}

/// `R` followed only by digits, e.g. `R16`: meant as a register, not a number.
fn looks_like_register(token: &str) -> bool {
    let t = token.trim();
    t.len() > 1
        && (t.starts_with('R') || t.starts_with('r'))
        && t[1..].bytes().all(|b| b.is_ascii_digit())
}

fn number(token: &str, expected: &str) -> Result<i64, EncodingError> {
    parse_number(token).ok_or_else(|| EncodingError::InvalidImmediate {
        value: token.to_string(),
        expected: expected.to_string(),
    })
}

fn unsigned(token: &str, field: Field) -> Result<u16, EncodingError> {
    let v = number(token, "a number")?;
    if (0..=field.max_unsigned()).contains(&v) {
        Ok(v as u16)
    } else {
        Err(EncodingError::immediate(v, 0, field.max_unsigned()))
    }
}

fn signed(token: &str, field: Field) -> Result<i16, EncodingError> {
    let v = number(token, "a number")?;
    if (field.min_signed()..=field.max_signed()).contains(&v) {
        Ok(v as i16)
    } else {
        Err(EncodingError::immediate(
            v,
            field.min_signed(),
            field.max_signed(),
        ))
    }
}
