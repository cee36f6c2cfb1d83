use deep16::cpu::Flow;
use deep16::decoder::{AluOp, Instr, Operand};
use deep16::exec::IntExecutor;
use deep16::isa::deep16::Deep16Codec;
use deep16::{Bus, Cpu, CpuConfig, Memory, Reg};

#[test]
fn ldi_then_mov_sets_stack_pointer() {
    let mut mem = Memory::new();
    let mut cpu = Cpu::new(CpuConfig::default());
    let dec = Deep16Codec::new();
    let exec = IntExecutor;

    mem.write(0, dec.encode(&Instr::Ldi { imm: 0x1234 }).unwrap());
    mem.write(
        1,
        dec.encode(&Instr::Mov {
            rd: Reg::SP,
            rs: Reg::R0,
            imm: 2,
        })
        .unwrap(),
    );

    assert_eq!(cpu.step(&mut mem, &dec, &exec), Flow::Continue);
    assert_eq!(cpu.reg(Reg::R0), 0x1234);
    assert_eq!(cpu.pc(), 1);
    assert_eq!(cpu.step(&mut mem, &dec, &exec), Flow::Continue);
    assert_eq!(cpu.reg(Reg::SP), 0x1236);
    assert_eq!(cpu.pc(), 2);
}

#[test]
fn add_immediate_updates_register_and_flags() {
    let mut mem = Memory::new();
    let mut cpu = Cpu::new(CpuConfig::default());
    let dec = Deep16Codec::new();
    let exec = IntExecutor;

    let r3 = Reg::new(3).unwrap();
    cpu.set_reg(r3, 41);
    mem.write(
        0,
        dec.encode(&Instr::Alu {
            op: AluOp::Add,
            rd: r3,
            src: Operand::Imm(1),
            write: true,
        })
        .unwrap(),
    );
    cpu.step(&mut mem, &dec, &exec);
    assert_eq!(cpu.reg(r3), 42);
    assert!(cpu.psw.is_empty());
}

#[test]
fn mov_into_pc_redirects_control() {
    let mut mem = Memory::new();
    let mut cpu = Cpu::new(CpuConfig::default());
    let dec = Deep16Codec::new();
    let exec = IntExecutor;

    let r5 = Reg::new(5).unwrap();
    cpu.set_reg(r5, 0x0100);
    mem.write(
        0,
        dec.encode(&Instr::Mov {
            rd: Reg::PC,
            rs: r5,
            imm: 0,
        })
        .unwrap(),
    );
    cpu.step(&mut mem, &dec, &exec);
    assert_eq!(cpu.pc(), 0x0100);
}
