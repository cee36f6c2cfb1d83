use crate::error::EncodingError;

/// One source line, stripped of its comment and classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Stmt {
    Empty,
    Label(String),
    Org(u16),
    /// Raw value tokens; numbers or label names, resolved in pass 2.
    Word(Vec<String>),
    Instr {
        mnemonic: String,
        operands: Vec<String>,
    },
}

pub(crate) fn parse_line(line: &str) -> Result<Stmt, EncodingError> {
    let s = match line.find(';') {
        Some(p) => &line[..p],
        None => line,
    };
    let s = s.trim();
    if s.is_empty() {
        return Ok(Stmt::Empty);
    }
    if let Some(name) = s.strip_suffix(':') {
        let name = name.trim();
        if !is_identifier(name) {
            return Err(EncodingError::InvalidLabel(name.to_string()));
        }
        return Ok(Stmt::Label(name.to_string()));
    }
    if s.starts_with('.') {
        let (dir, rest) = match s.find(char::is_whitespace) {
            Some(p) => (&s[..p], s[p..].trim()),
            None => (s, ""),
        };
        return match dir.to_ascii_lowercase().as_str() {
            ".org" => {
                let value = parse_number(rest)
                    .filter(|v| (0..=0xFFFF).contains(v))
                    .ok_or_else(|| EncodingError::InvalidImmediate {
                        value: rest.to_string(),
                        expected: "an address in 0..=0xFFFF".into(),
                    })?;
                Ok(Stmt::Org(value as u16))
            }
            ".word" => {
                let values: Vec<String> = rest.split(',').map(|v| v.trim().to_string()).collect();
                if values.iter().any(String::is_empty) {
                    return Err(EncodingError::OperandCount {
                        mnemonic: ".word".into(),
                        expected: "at least 1",
                        found: values.iter().filter(|v| !v.is_empty()).count(),
                    });
                }
                Ok(Stmt::Word(values))
            }
            _ => Err(EncodingError::UnknownDirective(dir.to_string())),
        };
    }
    let mut parts = s
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .map(str::to_string);
    let mnemonic = parts.next().unwrap_or_default();
    if let Some(name) = mnemonic.strip_suffix(':') {
        return Err(EncodingError::LabelNotAlone(name.to_string()));
    }
    Ok(Stmt::Instr {
        mnemonic,
        operands: parts.collect(),
    })
}

/// Decimal (optionally signed), `0x`/`0X` hex or `$` hex, with an optional leading `#`.
pub(crate) fn parse_number(token: &str) -> Option<i64> {
    let t = token.trim();
    let t = t.strip_prefix('#').unwrap_or(t);
    let (neg, t) = match t.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, t.strip_prefix('+').unwrap_or(t)),
    };
    let magnitude = if let Some(hex) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        parse_digits(hex, 16)?
    } else if let Some(hex) = t.strip_prefix('$') {
        parse_digits(hex, 16)?
    } else {
        parse_digits(t, 10)?
    };
    Some(if neg { -magnitude } else { magnitude })
}

fn parse_digits(digits: &str, radix: u32) -> Option<i64> {
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    i64::from_str_radix(digits, radix).ok()
}

pub(crate) fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '.' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers() {
        assert_eq!(parse_number("42"), Some(42));
        assert_eq!(parse_number("-16"), Some(-16));
        assert_eq!(parse_number("0x7FFF"), Some(0x7FFF));
        assert_eq!(parse_number("0X7fff"), Some(0x7FFF));
        assert_eq!(parse_number("$200"), Some(0x200));
        assert_eq!(parse_number("#5"), Some(5));
        assert_eq!(parse_number("0x"), None);
        assert_eq!(parse_number("12ab"), None);
        assert_eq!(parse_number("loop"), None);
    }

    #[test]
    fn statements() {
        assert_eq!(parse_line("   ; just a comment"), Ok(Stmt::Empty));
        assert_eq!(parse_line(""), Ok(Stmt::Empty));
        assert_eq!(parse_line("fib_loop:  ; loop head"), Ok(Stmt::Label("fib_loop".into())));
        assert_eq!(parse_line(".ORG $0200"), Ok(Stmt::Org(0x200)));
        assert_eq!(
            parse_line(".word 1, 0x2,end"),
            Ok(Stmt::Word(vec!["1".into(), "0x2".into(), "end".into()]))
        );
        assert_eq!(
            parse_line("  ST   R0, R3, 0     ; store"),
            Ok(Stmt::Instr {
                mnemonic: "ST".into(),
                operands: vec!["R0".into(), "R3".into(), "0".into()],
            })
        );
    }

    #[test]
    fn malformed_statements() {
        assert!(matches!(parse_line(".org"), Err(EncodingError::InvalidImmediate { .. })));
        assert!(matches!(parse_line(".org 0x10000"), Err(EncodingError::InvalidImmediate { .. })));
        assert!(matches!(parse_line(".byte 1"), Err(EncodingError::UnknownDirective(_))));
        assert!(matches!(parse_line(".word 1,,2"), Err(EncodingError::OperandCount { .. })));
        assert!(matches!(parse_line("9lives:"), Err(EncodingError::InvalidLabel(_))));
        assert_eq!(
            parse_line("loop: NOP"),
            Err(EncodingError::LabelNotAlone("loop".into()))
        );
    }
}
