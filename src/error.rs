use serde::Serialize;

/// Why a line could not be turned into words.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum EncodingError {
    #[error("Unknown register: {0}")]
    UnknownRegister(String),
    #[error("Invalid immediate value: {value} (expected {expected})")]
    InvalidImmediate { value: String, expected: String },
    #[error("Unknown label: {0}")]
    UnknownLabel(String),
    #[error("Unknown instruction: {0}")]
    UnknownInstruction(String),
    #[error("Branch target out of range: offset {offset} words (allowed -256..=255)")]
    BranchRangeExceeded { offset: i64 },
    #[error("Flag index {0} out of range (0-15)")]
    FlagIndexOutOfRange(i64),
    #[error("{mnemonic} expects {expected} operand(s), found {found}")]
    OperandCount {
        mnemonic: String,
        expected: &'static str,
        found: usize,
    },
    #[error("Unknown directive: {0}")]
    UnknownDirective(String),
    #[error("Invalid label name: {0}")]
    InvalidLabel(String),
    #[error("Label {0} must be on its own line")]
    LabelNotAlone(String),
    #[error("Duplicate label: {name} (first defined on line {first_line})")]
    DuplicateLabel { name: String, first_line: usize },
    #[error("Address {0:#x} is outside the 64K word address space")]
    AddressOverflow(u32),
    #[error("{0} has no encoding")]
    UnsupportedForm(String),
}

impl EncodingError {
    pub(crate) fn immediate(value: impl ToString, min: i64, max: i64) -> Self {
        EncodingError::InvalidImmediate {
            value: value.to_string(),
            expected: format!("{min}..={max}"),
        }
    }
}

/// An [`EncodingError`] tagged with its 1-based source line.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("Line {line}: {error}")]
pub struct LineError {
    pub line: usize,
    pub error: EncodingError,
}
