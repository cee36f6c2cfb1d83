use deep16::{assemble, Reg, Simulator};

fn run(src: &str) -> Simulator {
    let res = assemble(src);
    assert!(res.success, "{:?}", res.error_messages());
    let mut sim = Simulator::default();
    sim.load_changes(&res.memory_changes());
    let outcome = sim.run(1_000);
    assert!(outcome.halted, "program did not halt");
    sim
}

fn r1(sim: &Simulator) -> u16 {
    sim.cpu.reg(Reg::new(1).unwrap())
}

/// Sets R1 to 2 when the branch is taken, 1 otherwise.
fn taken(setup: &str, branch: &str) -> bool {
    let src = format!(
        "{setup}\n    {branch} yes\n    LSI R1, 1\n    HALT\nyes:\n    LSI R1, 2\n    HALT\n"
    );
    r1(&run(&src)) == 2
}

#[test]
fn zero_conditions() {
    let zero = "LSI R0, 3\nSUB R0, 3";
    let nonzero = "LSI R0, 3\nSUB R0, 2";
    assert!(taken(zero, "JZ"));
    assert!(!taken(nonzero, "JZ"));
    assert!(taken(nonzero, "JNZ"));
    assert!(!taken(zero, "JNZ"));
}

#[test]
fn carry_conditions() {
    let carry = "LSI R0, -1\nADD R0, 1";
    let no_carry = "LSI R0, 1\nADD R0, 1";
    assert!(taken(carry, "JC"));
    assert!(!taken(no_carry, "JC"));
    assert!(taken(no_carry, "JNC"));
    assert!(!taken(carry, "JNC"));
}

#[test]
fn negative_conditions() {
    let neg = "LSI R0, -1\nADD R0, 0";
    let pos = "LSI R0, 1\nADD R0, 0";
    assert!(taken(neg, "JN"));
    assert!(!taken(pos, "JN"));
    assert!(taken(pos, "JNN"));
    assert!(!taken(neg, "JNN"));
}

#[test]
fn overflow_conditions() {
    let ovf = "LDI 0x7FFF\nADD R0, 1";
    let no_ovf = "LDI 0x7FFE\nADD R0, 1";
    assert!(taken(ovf, "JO"));
    assert!(!taken(no_ovf, "JO"));
    assert!(taken(no_ovf, "JNO"));
    assert!(!taken(ovf, "JNO"));
}

#[test]
fn backward_loop_counts_down() {
    let sim = run("    LSI R2, 5\n    LSI R1, 0\nloop:\n    ADD R1, 2\n    SUB R2, 1\n    JNZ loop\n    HALT\n");
    assert_eq!(r1(&sim), 10);
    assert_eq!(sim.cpu.reg(Reg::new(2).unwrap()), 0);
}

#[test]
fn numeric_offset_is_relative_to_next_word() {
    // PC after the branch is 2, so an offset of 1 lands on 3.
    let sim = run("    SETZ\n    JZ 1\n    LSI R1, 1\n    LSI R1, 3\n    HALT\n");
    assert_eq!(r1(&sim), 3);
}
