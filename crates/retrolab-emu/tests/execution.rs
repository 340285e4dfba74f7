//! Assemble-then-run scenarios: each program is compiled with
//! `retrolab_asm`, loaded onto a bare `retrolab_vm::Cpu`, and stepped
//! until the opcode at the current PC is `00` (an implicit stop, since
//! unwritten RAM reads back as zero past the end of the loaded ROM).

use retrolab_asm::assemble;
use retrolab_vm::cpu::Cpu;
use retrolab_vm::registers::Reg;

fn run_one_file(source: &str) -> Cpu {
    let out = assemble(&[("main.s".to_string(), source.to_string())]);
    assert!(out.is_ok(), "{source} failed to assemble: {:?}", out.error);
    let mut cpu = Cpu::new();
    cpu.load_rom(&out.binary);
    while cpu.memory.read8(cpu.registers.pc()) != 0x00 {
        cpu.step().unwrap();
    }
    cpu
}

#[test]
fn mov_immediate_into_register() {
    let cpu = run_one_file("mov A, 0x12");
    assert_eq!(cpu.registers.get(Reg::A), 0x12);
    assert_eq!(cpu.registers.pc(), 3);
}

#[test]
fn add_reports_unsigned_carry_via_overflow_register() {
    let cpu = run_one_file("mov A, 40\nmov B, -30\nadd A, B");
    assert_eq!(cpu.registers.get(Reg::A), 10);
    assert_eq!(cpu.registers.get(Reg::Ov), 1);
}

#[test]
fn signed_division_truncates_toward_zero() {
    let cpu = run_one_file("mov B, 50\nmov A, -6\ndiv$ B, A");
    assert_eq!(cpu.registers.get(Reg::B), 0x10000 - 8);
}

#[test]
fn add_overflow_from_near_word_wraparound() {
    let cpu = run_one_file("mov A, 0xFFFE\nmov B, 5\nadd A, B");
    assert_eq!(cpu.registers.get(Reg::A), 3);
    assert_eq!(cpu.registers.get(Reg::Ov), 1);
}

#[test]
fn interrupt_dispatch_preempts_the_next_instruction_fetch() {
    // The queued interrupt is drained by `step()` before it fetches the
    // opcode at the post-`int` PC, so `mov B, 1` never runs: the
    // handler's own `mov A, XT` does, then falls through into the
    // (unreachable without the jump) `D:` label.
    let cpu = run_one_file(
        "ivec 0x18, L\n\
         int 0x18, 0x1234\n\
         mov B, 1\n\
         jmp D\n\
         L:\n\
         mov A, XT\n\
         D:",
    );
    assert_eq!(cpu.registers.get(Reg::A), 0x1234);
    assert_eq!(cpu.registers.get(Reg::B), 0);
}

#[test]
fn pushw_popw_round_trip_through_explicit_sp() {
    let cpu = run_one_file("mov SP, 0xFF\npushw 0x1234\npopw A");
    assert_eq!(cpu.registers.sp(), 0xFF);
    assert_eq!(cpu.registers.get(Reg::A), 0x1234);
}
