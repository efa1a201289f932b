//! Instruction-level behaviour of the ARM7TDMI core.

use arm7tdmi::{Arm7tdmi, C, Condition, I, LR, Mode, PC, Psr, SP, Z};
use emu_core::{Bus, Cpu, SimpleBus, Ticks};

const PROGRAM: u32 = 0x100;

/// Load ARM words at `PROGRAM` and point PC there.
fn setup_arm(bus: &mut SimpleBus, cpu: &mut Arm7tdmi, program: &[u32]) {
    for (i, op) in program.iter().enumerate() {
        bus.write32(PROGRAM + i as u32 * 4, *op);
    }
    cpu.regs.r[PC] = PROGRAM;
}

/// Load Thumb halfwords at `PROGRAM`, enter Thumb state and point PC there.
fn setup_thumb(bus: &mut SimpleBus, cpu: &mut Arm7tdmi, program: &[u16]) {
    for (i, op) in program.iter().enumerate() {
        bus.write16(PROGRAM + i as u32 * 2, *op);
    }
    cpu.regs.set_thumb(true);
    cpu.regs.r[PC] = PROGRAM;
}

fn run(cpu: &mut Arm7tdmi, bus: &mut SimpleBus, steps: usize) {
    for _ in 0..steps {
        cpu.step(bus);
    }
}

#[test]
fn test_arm_mov_add_str() {
    let mut bus = SimpleBus::new(0x1000);
    let mut cpu = Arm7tdmi::new();

    let program = [
        0xE3A0_0005, // MOV r0, #5
        0xE3A0_1003, // MOV r1, #3
        0xE080_0001, // ADD r0, r0, r1
        0xE582_0000, // STR r0, [r2]
    ];
    setup_arm(&mut bus, &mut cpu, &program);
    cpu.regs.r[2] = 0x800;
    run(&mut cpu, &mut bus, 4);

    assert_eq!(bus.read32(0x800), 8, "stored word should be 5 + 3");
}

#[test]
fn test_thumb_mov_add_str() {
    let mut bus = SimpleBus::new(0x1000);
    let mut cpu = Arm7tdmi::new();

    let program = [
        0x200A, // MOV r0, #10
        0x3005, // ADD r0, #5
        0x6008, // STR r0, [r1]
    ];
    setup_thumb(&mut bus, &mut cpu, &program);
    cpu.regs.r[1] = 0x800;
    run(&mut cpu, &mut bus, 3);

    assert_eq!(bus.read32(0x800), 15, "stored word should be 10 + 5");
}

#[test]
fn test_add_with_register_shift() {
    let mut bus = SimpleBus::new(0x1000);
    let mut cpu = Arm7tdmi::new();

    // ADD r0, r0, r1, LSL r2
    setup_arm(&mut bus, &mut cpu, &[0xE080_0211]);
    cpu.regs.r[0] = 1;
    cpu.regs.r[1] = 1;
    cpu.regs.r[2] = 4;
    let ticks = cpu.step(&mut bus);

    assert_eq!(cpu.regs.r[0], 17);
    assert_eq!(ticks, Ticks::new(2), "register-specified shift costs an extra cycle");
}

#[test]
fn test_movs_rrx() {
    let mut bus = SimpleBus::new(0x1000);
    let mut cpu = Arm7tdmi::new();

    // MOVS r0, r1, RRX
    setup_arm(&mut bus, &mut cpu, &[0xE1B0_0061]);
    cpu.regs.r[1] = 2;
    cpu.regs.set_flag(C, true);
    cpu.step(&mut bus);

    assert_eq!(cpu.regs.r[0], 0x8000_0001);
    assert!(!cpu.regs.flag(C), "carry takes the old bit 0");
}

#[test]
fn test_mla() {
    let mut bus = SimpleBus::new(0x1000);
    let mut cpu = Arm7tdmi::new();

    // MLA r0, r1, r2, r3
    setup_arm(&mut bus, &mut cpu, &[0xE020_3291]);
    cpu.regs.r[1] = 2;
    cpu.regs.r[2] = 5;
    cpu.regs.r[3] = 3;
    let ticks = cpu.step(&mut bus);

    assert_eq!(cpu.regs.r[0], 13);
    assert_eq!(ticks, Ticks::new(2));
}

#[test]
fn test_smull_negative_result() {
    let mut bus = SimpleBus::new(0x1000);
    let mut cpu = Arm7tdmi::new();

    // SMULL r2, r3, r0, r1
    setup_arm(&mut bus, &mut cpu, &[0xE0C3_2190]);
    cpu.regs.r[0] = 2;
    cpu.regs.r[1] = 0xFFFF_FFFF;
    let ticks = cpu.step(&mut bus);

    assert_eq!(cpu.regs.r[2], 0xFFFF_FFFE, "low word of -2");
    assert_eq!(cpu.regs.r[3], 0xFFFF_FFFF, "high word of -2");
    assert_eq!(ticks, Ticks::new(4));
}

#[test]
fn test_smlal_accumulates() {
    let mut bus = SimpleBus::new(0x1000);
    let mut cpu = Arm7tdmi::new();

    // SMLALS r2, r3, r0, r1
    setup_arm(&mut bus, &mut cpu, &[0xE0F3_2190]);
    cpu.regs.r[0] = 2;
    cpu.regs.r[1] = 0xFFFF_FFFF;
    cpu.regs.r[2] = 2;
    cpu.regs.r[3] = 0;
    let ticks = cpu.step(&mut bus);

    assert_eq!(cpu.regs.r[2], 0);
    assert_eq!(cpu.regs.r[3], 0);
    assert!(cpu.regs.flag(Z));
    assert_eq!(ticks, Ticks::new(5));
}

#[test]
fn test_halfword_and_signed_loads() {
    let mut bus = SimpleBus::new(0x1000);
    let mut cpu = Arm7tdmi::new();

    bus.write16(0x800, 0xFF80);
    let program = [
        0xE1D1_00B0, // LDRH r0, [r1]
        0xE1D1_20D0, // LDRSB r2, [r1]
        0xE1D1_30F0, // LDRSH r3, [r1]
    ];
    setup_arm(&mut bus, &mut cpu, &program);
    cpu.regs.r[1] = 0x800;
    run(&mut cpu, &mut bus, 3);

    assert_eq!(cpu.regs.r[0], 0x0000_FF80);
    assert_eq!(cpu.regs.r[2], 0xFFFF_FF80);
    assert_eq!(cpu.regs.r[3], 0xFFFF_FF80);
}

#[test]
fn test_strh_post_indexed() {
    let mut bus = SimpleBus::new(0x1000);
    let mut cpu = Arm7tdmi::new();

    // STRH r2, [r3], #-2
    setup_arm(&mut bus, &mut cpu, &[0xE043_20B2]);
    cpu.regs.r[2] = 0xABCD_1234;
    cpu.regs.r[3] = 0x800;
    cpu.step(&mut bus);

    assert_eq!(bus.read16(0x800), 0x1234);
    assert_eq!(cpu.regs.r[3], 0x7FE, "post-indexing always writes back");
}

#[test]
fn test_thumb_long_branch_with_link() {
    let mut bus = SimpleBus::new(0x4000);
    let mut cpu = Arm7tdmi::new();

    let program = [
        0xF001, // BL (high part): LR = PC + 0x1000
        0xF802, // BL (low part): PC = LR + 4
    ];
    setup_thumb(&mut bus, &mut cpu, &program);

    cpu.step(&mut bus);
    assert_eq!(cpu.regs.r[LR], 0x1104, "intermediate LR holds the partial target");
    assert_eq!(cpu.regs.r[PC], 0x102);

    cpu.step(&mut bus);
    assert_eq!(cpu.regs.r[PC], 0x1108);
    assert_eq!(cpu.regs.r[LR], 0x105, "return address is marked as Thumb");
}

#[test]
fn test_arm_push_pop_pc() {
    let mut bus = SimpleBus::new(0x1000);
    let mut cpu = Arm7tdmi::new();

    let program = [
        0xE92D_4001, // PUSH {r0, lr}
        0xE3A0_0000, // MOV r0, #0
        0xE8BD_8001, // POP {r0, pc}
    ];
    setup_arm(&mut bus, &mut cpu, &program);
    cpu.regs.r[SP] = 0x900;
    cpu.regs.r[0] = 0x77;
    cpu.regs.r[LR] = 0x200;
    run(&mut cpu, &mut bus, 3);

    assert_eq!(cpu.regs.r[0], 0x77);
    assert_eq!(cpu.regs.r[PC], 0x200);
    assert_eq!(cpu.regs.r[SP], 0x900);
}

#[test]
fn test_swi_and_return() {
    let mut bus = SimpleBus::new(0x1000);
    let mut cpu = Arm7tdmi::new();

    // Handler at the SWI vector: MOVS PC, LR
    bus.write32(0x08, 0xE1B0_F00E);
    setup_arm(&mut bus, &mut cpu, &[0xEF00_0000]);
    cpu.regs.set_flag(Z, true);
    cpu.regs.r[SP] = 0x0300_7F00;
    cpu.regs.set_banked_sp(Mode::Supervisor, 0x0300_7FE0);

    cpu.step(&mut bus);
    assert_eq!(cpu.mode(), Some(Mode::Supervisor));
    assert_eq!(cpu.regs.r[PC], 0x08);
    assert_eq!(cpu.regs.r[LR], 0x104);
    assert_eq!(cpu.regs.r[SP], 0x0300_7FE0);
    assert!(cpu.regs.flag(I));

    cpu.step(&mut bus);
    assert_eq!(cpu.mode(), Some(Mode::System));
    assert_eq!(cpu.regs.r[PC], 0x104);
    assert_eq!(cpu.regs.r[SP], 0x0300_7F00);
    assert!(cpu.regs.flag(Z), "flags restored from SPSR");
    assert!(!cpu.regs.flag(I));
}

#[test]
fn test_irq_entry_and_return() {
    let mut bus = SimpleBus::new(0x1000);
    let mut cpu = Arm7tdmi::new();

    // Handler at the IRQ vector: SUBS PC, LR, #4
    bus.write32(0x18, 0xE25E_F004);
    let program = [
        0xE3A0_0001, // MOV r0, #1
        0xE3A0_1002, // MOV r1, #2
    ];
    setup_arm(&mut bus, &mut cpu, &program);

    cpu.step(&mut bus);
    bus.set_irq(true);
    let ticks = cpu.step(&mut bus);

    assert_eq!(ticks, Ticks::new(3), "IRQ entry penalty");
    assert_eq!(cpu.mode(), Some(Mode::Irq));
    assert_eq!(cpu.regs.r[PC], 0x18);
    assert_eq!(cpu.regs.r[LR], 0x104, "LR holds the PC at entry");
    assert_eq!(cpu.regs.spsr(), Some(0x1F));
    assert_eq!(cpu.regs.r[1], 0, "preempted instruction did not run");

    bus.set_irq(false);
    cpu.step(&mut bus);
    assert_eq!(cpu.mode(), Some(Mode::System));
    assert_eq!(cpu.regs.r[PC], 0x100, "SUBS PC, LR, #4 lands one word before LR");

    run(&mut cpu, &mut bus, 2);
    assert_eq!(cpu.regs.r[0], 1);
    assert_eq!(cpu.regs.r[1], 2);
}

#[test]
fn test_irq_links_prior_pc() {
    let mut bus = SimpleBus::new(0x1000);
    let mut cpu = Arm7tdmi::new();
    cpu.regs.r[PC] = 0x100;
    bus.set_irq(true);

    cpu.step(&mut bus);

    assert_eq!(cpu.regs.r[LR], 0x100);
    assert_eq!(cpu.regs.r[PC], 0x18);
}

#[test]
fn test_irq_from_thumb_returns_to_thumb() {
    let mut bus = SimpleBus::new(0x1000);
    let mut cpu = Arm7tdmi::new();

    bus.write32(0x18, 0xE25E_F004);
    setup_thumb(&mut bus, &mut cpu, &[0x2001, 0x2102]);
    cpu.step(&mut bus);
    bus.set_irq(true);
    cpu.step(&mut bus);

    assert!(!cpu.regs.thumb(), "handler runs in ARM state");
    assert_eq!(cpu.regs.spsr().map(|s| Psr(s).thumb()), Some(true));

    assert_eq!(cpu.regs.r[LR], 0x102);

    bus.set_irq(false);
    cpu.step(&mut bus);
    assert!(cpu.regs.thumb());
    assert_eq!(cpu.regs.r[PC], 0x0FE);
    // 0x0FE holds 0x0000 (LSL r0, r0, #0), then the program resumes.
    run(&mut cpu, &mut bus, 3);
    assert_eq!(cpu.regs.r[0], 1);
    assert_eq!(cpu.regs.r[1], 2);
}

#[test]
fn test_banked_registers_survive_round_trip() {
    let mut cpu = Arm7tdmi::new();
    cpu.reset(0x0800_0000, false);
    cpu.regs.r[LR] = 0xAAAA;
    cpu.regs.r[12] = 0x1212;

    cpu.regs.switch_mode(Mode::Irq);
    assert_eq!(cpu.regs.r[SP], 0x0300_7FA0);
    cpu.regs.r[LR] = 0xBBBB;
    cpu.regs.switch_mode(Mode::Supervisor);
    assert_eq!(cpu.regs.r[SP], 0x0300_7FE0);
    cpu.regs.switch_mode(Mode::System);

    assert_eq!(cpu.regs.r[SP], 0x0300_7F00);
    assert_eq!(cpu.regs.r[LR], 0xAAAA);
    assert_eq!(cpu.regs.r[12], 0x1212, "r12 is never banked");
}

#[test]
fn test_reset_is_idempotent() {
    let mut bus = SimpleBus::new(0x1000);
    let mut cpu = Arm7tdmi::new();
    cpu.reset(0x100, false);
    let first = cpu.registers();

    setup_arm(&mut bus, &mut cpu, &[0xE3A0_0005, 0xEF00_0000]);
    run(&mut cpu, &mut bus, 2);
    cpu.reset(0x100, false);
    let second = cpu.registers();
    cpu.reset(0x100, false);

    assert_eq!(first, second);
    assert_eq!(second, cpu.registers());
    assert_eq!(cpu.cycles(), Ticks::ZERO);
}

#[test]
fn test_step_cycles_reports_elapsed() {
    let mut bus = SimpleBus::new(0x1000);
    let mut cpu = Arm7tdmi::new();

    // B . (branch to self)
    setup_arm(&mut bus, &mut cpu, &[0xEAFF_FFFE]);
    let elapsed = cpu.step_cycles(&mut bus, Ticks::new(10));

    assert_eq!(elapsed, Ticks::new(10));
    assert_eq!(cpu.pc(), PROGRAM);
}

#[test]
fn test_condition_table() {
    use arm7tdmi::{N, V};

    let cases = [
        (Condition::Eq, Z, true),
        (Condition::Ne, Z, false),
        (Condition::Cs, C, true),
        (Condition::Cc, 0, true),
        (Condition::Mi, N, true),
        (Condition::Pl, N, false),
        (Condition::Vs, V, true),
        (Condition::Vc, V, false),
        (Condition::Hi, C, true),
        (Condition::Ls, C | Z, true),
        (Condition::Ge, N | V, true),
        (Condition::Lt, V, true),
        (Condition::Gt, 0, true),
        (Condition::Le, Z, true),
        (Condition::Al, 0, true),
        (Condition::Nv, 0, false),
    ];
    for (condition, flags, expected) in cases {
        assert_eq!(
            condition.passes(Psr(flags)),
            expected,
            "{condition:?} with flags {flags:#010X}"
        );
    }
}
