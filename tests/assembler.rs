use deep16::{assemble, EncodingError, MemoryChange};
use pretty_assertions::assert_eq;

const PROGRAM: &str = "\
start:
    ldi 0x0040
    mov sp, r0
    lsi r1, -3
loop:
    add r1, 1
    jnz loop
    st r1, fp, 2
    setz
    halt
";

fn only_error(src: &str) -> (usize, EncodingError) {
    let res = assemble(src);
    assert!(!res.success);
    assert_eq!(res.errors.len(), 1, "{:?}", res.error_messages());
    (res.errors[0].line, res.errors[0].error.clone())
}

#[test]
fn mnemonics_and_registers_ignore_case() {
    let lower = assemble(PROGRAM);
    let upper = assemble(&PROGRAM.to_uppercase());
    let mixed = assemble(&PROGRAM.replace("ldi", "LdI").replace("sp", "Sp"));
    assert!(lower.success, "{:?}", lower.error_messages());
    assert_eq!(lower.memory, upper.memory);
    assert_eq!(lower.memory, mixed.memory);
    assert_eq!(lower.errors, upper.errors);
}

#[test]
fn assembly_is_deterministic() {
    let a = assemble(PROGRAM);
    let b = assemble(PROGRAM);
    assert_eq!(a.memory, b.memory);
    assert_eq!(a.symbols, b.symbols);
    assert_eq!(a.listing, b.listing);
}

#[test]
fn symbols_bind_to_word_addresses() {
    let res = assemble(PROGRAM);
    assert_eq!(res.symbols.get("start"), Some(&0));
    assert_eq!(res.symbols.get("loop"), Some(&3));
    assert_eq!(res.symbols.len(), 2);
}

#[test]
fn branch_range_boundaries() {
    // Forward: the branch at 0 reaches 256 (offset 255) but not 257 (offset 256).
    let fwd = |pad: usize| format!("JZ far\n.org {}\nfar:\nHALT\n", pad);
    assert!(assemble(&fwd(256)).success);
    let (line, err) = only_error(&fwd(257));
    assert_eq!(line, 1);
    assert_eq!(err, EncodingError::BranchRangeExceeded { offset: 256 });

    // Backward: a branch at 255 reaches 0 (offset -256) but one at 256 does not.
    let back = |at: usize| format!("top:\nNOP\n.org {at}\nJNZ top\n");
    assert!(assemble(&back(255)).success);
    let (line, err) = only_error(&back(256));
    assert_eq!(line, 4);
    assert_eq!(err, EncodingError::BranchRangeExceeded { offset: -257 });
}

#[test]
fn unknown_instruction_is_contained() {
    let res = assemble("NOP\nFROB R1, R2\nLSI R1, 1\nJZ nowhere\nHALT\n");
    assert_eq!(res.errors.len(), 2);
    assert_eq!(res.errors[0].line, 2);
    assert_eq!(
        res.errors[0].error,
        EncodingError::UnknownInstruction("FROB".into())
    );
    assert_eq!(res.errors[1].line, 4);
    assert_eq!(
        res.errors[1].error,
        EncodingError::UnknownLabel("nowhere".into())
    );
    // Lines after the failures are still assembled, at unshifted addresses.
    assert_eq!(res.memory[2], 0b1111110_0001_00001);
    assert_eq!(res.memory[4], 0xFFFF);
}

#[test]
fn bare_declared_label_is_a_no_op() {
    let res = assemble("NOP\nhere\nhere:\nHALT\n");
    assert!(res.success, "{:?}", res.error_messages());
    assert_eq!(res.symbols.get("here"), Some(&1));
    assert_eq!(res.memory[1], 0xFFFF);
}

#[test]
fn word_directive_values() {
    let res = assemble(".org 0x100\ntable:\n.word 1, -1, 0xBEEF, table, end\nend:\n");
    assert!(res.success, "{:?}", res.error_messages());
    assert_eq!(&res.memory[0x100..0x105], &[1, 0xFFFF, 0xBEEF, 0x100, 0x105]);
    assert_eq!(res.memory_changes().len(), 5);
}

#[test]
fn org_can_overlap_and_later_writes_win() {
    let res = assemble(".word 1, 2, 3\n.org 1\n.word 9\n");
    assert!(res.success);
    assert_eq!(&res.memory[0..3], &[1, 9, 3]);
    assert_eq!(
        res.memory_changes(),
        vec![
            MemoryChange { address: 0, value: 1 },
            MemoryChange { address: 1, value: 2 },
            MemoryChange { address: 2, value: 3 },
            MemoryChange { address: 1, value: 9 },
        ]
    );
}

#[test]
fn operand_errors() {
    assert!(matches!(
        only_error("ADD R16, R1\n").1,
        EncodingError::UnknownRegister(r) if r == "R16"
    ));
    assert!(matches!(
        only_error("ADD R1, 16\n").1,
        EncodingError::InvalidImmediate { .. }
    ));
    assert!(matches!(
        only_error("LSI R1, 16\n").1,
        EncodingError::InvalidImmediate { .. }
    ));
    assert!(matches!(
        only_error("LDI 0x8000\n").1,
        EncodingError::InvalidImmediate { .. }
    ));
    assert_eq!(only_error("SET 16\n").1, EncodingError::FlagIndexOutOfRange(16));
    assert!(matches!(
        only_error("MOV R1\n").1,
        EncodingError::OperandCount { found: 1, .. }
    ));
    assert!(matches!(
        only_error(".frob 1\n").1,
        EncodingError::UnknownDirective(_)
    ));
    assert!(matches!(
        only_error("1abc:\n").1,
        EncodingError::InvalidLabel(_)
    ));
}

#[test]
fn errors_are_ordered_by_line() {
    let res = assemble("JZ missing\nx:\nx:\nFROB\n");
    let lines: Vec<usize> = res.errors.iter().map(|e| e.line).collect();
    assert_eq!(lines, vec![1, 3, 4]);
    assert_eq!(res.listing.len(), 4);
}

#[test]
fn listing_reports_addresses_and_words() {
    let res = assemble(PROGRAM);
    let rows: Vec<(usize, Option<u16>, usize)> = res
        .listing
        .iter()
        .map(|e| (e.line, e.address, e.words.len()))
        .collect();
    assert_eq!(
        rows,
        vec![
            (1, Some(0), 0),
            (2, Some(0), 1),
            (3, Some(1), 1),
            (4, Some(2), 1),
            (5, Some(3), 0),
            (6, Some(3), 1),
            (7, Some(4), 1),
            (8, Some(5), 1),
            (9, Some(6), 1),
            (10, Some(7), 1),
        ]
    );
}

#[test]
fn word_values_truncate_to_sixteen_bits() {
    let res = assemble(".word 0x12345, 65536\n.word -32769\n.word 0xFFFF\n");
    assert!(res.success, "{:?}", res.error_messages());
    assert_eq!(&res.memory[0..4], &[0x2345, 0x0000, 0x7FFF, 0xFFFF]);
}

#[test]
fn bare_label_sizing_agrees_when_declaration_fails() {
    // `lbl:` lands past the top of memory, so it never binds; the bare `lbl`
    // line is still a zero-size no-op in both passes.
    let res = assemble(".org 0xFFFF\nNOP\nlbl:\nlbl\n");
    let lines: Vec<usize> = res.errors.iter().map(|e| e.line).collect();
    assert_eq!(lines, vec![3]);
    assert!(matches!(res.errors[0].error, EncodingError::AddressOverflow(0x10000)));
    assert!(res.listing[3].words.is_empty());
    assert_eq!(res.listing[3].error, None);
}

#[test]
fn label_sharing_a_line_is_reported_once() {
    let (line, err) = only_error("loop: NOP\n");
    assert_eq!(line, 1);
    assert_eq!(err, EncodingError::LabelNotAlone("loop".into()));
}
