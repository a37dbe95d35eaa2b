use kiwiboy_core::error::StepError;
use kiwiboy_core::gameboy::{GameBoy, Options};
use kiwiboy_core::registers::{FLAG_C, FLAG_N, FLAG_Z, Flags};

/// Console in the power-on state with `program` loaded at 0x0000 and the
/// power-on VBlank request cleared so nothing dispatches unasked.
fn gameboy(program: &[u8]) -> GameBoy {
    let mut gb = GameBoy::new(Options::default()).expect("console builds");
    gb.interrupts().borrow_mut().write_if(0);
    gb.mmu.load(0x0000, program);
    gb
}

#[test]
fn add_a_a_without_carries() {
    let mut gb = gameboy(&[0x87]);
    gb.cpu.regs.a = 0x07;
    let cycles = gb.step().unwrap();
    assert_eq!(cycles, 4);
    assert_eq!(gb.cpu.regs.a, 0x0E);
    assert_eq!(gb.cpu.regs.f.bits(), 0);
}

#[test]
fn add_a_b_sets_half_and_full_carry() {
    let mut gb = gameboy(&[0x80]);
    gb.cpu.regs.a = 0xFC;
    gb.cpu.regs.b = 0x09;
    gb.step().unwrap();
    assert_eq!(gb.cpu.regs.a, 0x05);
    assert!(gb.cpu.regs.f.half_carry());
    assert!(gb.cpu.regs.f.carry());
    assert!(!gb.cpu.regs.f.zero());
    assert!(!gb.cpu.regs.f.subtract());
}

#[test]
fn sub_sets_subtract_and_borrow() {
    let mut gb = gameboy(&[0x90]);
    gb.cpu.regs.a = 0x10;
    gb.cpu.regs.b = 0x20;
    gb.step().unwrap();
    assert_eq!(gb.cpu.regs.a, 0xF0);
    assert_eq!(gb.cpu.regs.f.bits(), FLAG_N | FLAG_C);
}

#[test]
fn add_hl_half_carry_uses_bit_11() {
    // ADD HL,BC with HL=0x0FFF, BC=0x0001 carries out of bit 11 only.
    let mut gb = gameboy(&[0x09]);
    gb.cpu.regs.set_hl(0x0FFF);
    gb.cpu.regs.set_bc(0x0001);
    let cycles = gb.step().unwrap();
    assert_eq!(cycles, 8);
    assert_eq!(gb.cpu.regs.get_hl(), 0x1000);
    assert!(gb.cpu.regs.f.half_carry());
    assert!(!gb.cpu.regs.f.carry());
}

#[test]
fn add_hl_carry_wraps() {
    let mut gb = gameboy(&[0x29]);
    gb.cpu.regs.set_hl(0x8000);
    gb.step().unwrap();
    assert_eq!(gb.cpu.regs.get_hl(), 0x0000);
    assert!(gb.cpu.regs.f.carry());
    assert!(!gb.cpu.regs.f.half_carry());
}

#[test]
fn jp_nz_not_taken_costs_the_short_path() {
    let mut gb = gameboy(&[0xC2, 0x34, 0x12]);
    gb.cpu.regs.f = Flags::from(FLAG_Z);
    let cycles = gb.step().unwrap();
    assert_eq!(cycles, 12);
    assert_eq!(gb.cpu.regs.pc, 0x0003);
}

#[test]
fn jp_nz_taken_costs_the_long_path() {
    let mut gb = gameboy(&[0xC2, 0x34, 0x12]);
    let cycles = gb.step().unwrap();
    assert_eq!(cycles, 16);
    assert_eq!(gb.cpu.regs.pc, 0x1234);
}

#[test]
fn jr_conditional_offsets_from_the_next_instruction() {
    let mut gb = gameboy(&[0x28, 0x02]);
    gb.cpu.regs.f = Flags::from(FLAG_Z);
    let cycles = gb.step().unwrap();
    assert_eq!(cycles, 12);
    assert_eq!(gb.cpu.regs.pc, 0x0004);

    let mut gb = gameboy(&[0x28, 0x02]);
    let cycles = gb.step().unwrap();
    assert_eq!(cycles, 8);
    assert_eq!(gb.cpu.regs.pc, 0x0002);
}

#[test]
fn call_pushes_return_address_and_ret_pops_it() {
    let mut gb = gameboy(&[0xCD, 0x10, 0x00]);
    gb.cpu.regs.sp = 0xFFFE;
    gb.mmu.load(0x0010, &[0xC9]);

    let cycles = gb.step().unwrap();
    assert_eq!(cycles, 24);
    assert_eq!(gb.cpu.regs.pc, 0x0010);
    assert_eq!(gb.cpu.regs.sp, 0xFFFC);
    // High byte above low byte, SP predecremented per push.
    assert_eq!(gb.mmu.read8(0xFFFC), 0x03);
    assert_eq!(gb.mmu.read8(0xFFFD), 0x00);

    let cycles = gb.step().unwrap();
    assert_eq!(cycles, 16);
    assert_eq!(gb.cpu.regs.pc, 0x0003);
    assert_eq!(gb.cpu.regs.sp, 0xFFFE);
}

#[test]
fn conditional_ret_cycle_split() {
    let mut gb = gameboy(&[0xC0]);
    gb.cpu.regs.sp = 0xFFFC;
    gb.mmu.write16(0xFFFC, 0x0200);
    let cycles = gb.step().unwrap();
    assert_eq!(cycles, 20);
    assert_eq!(gb.cpu.regs.pc, 0x0200);

    let mut gb = gameboy(&[0xC0]);
    gb.cpu.regs.f = Flags::from(FLAG_Z);
    let cycles = gb.step().unwrap();
    assert_eq!(cycles, 8);
    assert_eq!(gb.cpu.regs.pc, 0x0001);
}

#[test]
fn push_bc_pop_af_clears_flag_low_nibble() {
    let mut gb = gameboy(&[0xC5, 0xF1]);
    gb.cpu.regs.sp = 0xFFFE;
    gb.cpu.regs.set_bc(0x12FF);
    gb.step().unwrap();
    gb.step().unwrap();
    assert_eq!(gb.cpu.regs.get_af(), 0x12F0);
    assert_eq!(gb.cpu.regs.sp, 0xFFFE);
}

#[test]
fn inc_hl_memory_wraps_and_flags() {
    let mut gb = gameboy(&[0x34]);
    gb.cpu.regs.set_hl(0xC000);
    gb.mmu.load(0xC000, &[0xFF]);
    let cycles = gb.step().unwrap();
    assert_eq!(cycles, 12);
    assert_eq!(gb.mmu.read8(0xC000), 0x00);
    assert!(gb.cpu.regs.f.zero());
    assert!(gb.cpu.regs.f.half_carry());
    assert!(!gb.cpu.regs.f.subtract());
}

#[test]
fn ld_hl_sp_offset_flags_come_from_the_low_byte_add() {
    let mut gb = gameboy(&[0xF8, 0x01]);
    gb.cpu.regs.sp = 0x000F;
    let cycles = gb.step().unwrap();
    assert_eq!(cycles, 12);
    assert_eq!(gb.cpu.regs.get_hl(), 0x0010);
    assert!(gb.cpu.regs.f.half_carry());
    assert!(!gb.cpu.regs.f.carry());
    assert!(!gb.cpu.regs.f.zero());
}

#[test]
fn swap_a_via_cb_prefix() {
    let mut gb = gameboy(&[0xCB, 0x37]);
    gb.cpu.regs.a = 0xF0;
    let cycles = gb.step().unwrap();
    assert_eq!(cycles, 8);
    assert_eq!(gb.cpu.regs.a, 0x0F);
    assert_eq!(gb.cpu.regs.f.bits(), 0);
}

#[test]
fn bit_7_h_reports_through_zero() {
    let mut gb = gameboy(&[0xCB, 0x7C]);
    gb.cpu.regs.h = 0x80;
    gb.step().unwrap();
    assert!(!gb.cpu.regs.f.zero());
    assert!(gb.cpu.regs.f.half_carry());

    let mut gb = gameboy(&[0xCB, 0x7C]);
    gb.cpu.regs.h = 0x00;
    gb.step().unwrap();
    assert!(gb.cpu.regs.f.zero());
}

#[test]
fn rlc_hl_costs_the_memory_variant() {
    let mut gb = gameboy(&[0xCB, 0x06]);
    gb.cpu.regs.set_hl(0xC000);
    gb.mmu.load(0xC000, &[0x80]);
    let cycles = gb.step().unwrap();
    assert_eq!(cycles, 16);
    assert_eq!(gb.mmu.read8(0xC000), 0x01);
    assert!(gb.cpu.regs.f.carry());
}

#[test]
fn reti_returns_and_enables_ime() {
    let mut gb = gameboy(&[0xD9]);
    gb.cpu.regs.sp = 0xC0FE;
    gb.mmu.write16(0xC0FE, 0x1234);
    let cycles = gb.step().unwrap();
    assert_eq!(cycles, 16);
    assert_eq!(gb.cpu.regs.pc, 0x1234);
    assert!(gb.cpu.ime);
}

#[test]
fn undefined_opcode_is_a_fatal_decode_error() {
    let mut gb = gameboy(&[0xD3]);
    assert_eq!(
        gb.step(),
        Err(StepError::UnknownOpcode {
            opcode: 0xD3,
            prefixed: false,
            addr: 0x0000,
        })
    );
}

#[test]
fn halt_stops_until_an_enabled_line_is_requested() {
    let mut gb = gameboy(&[0x76, 0x00]);
    gb.interrupts().borrow_mut().write_ie(0x04);

    gb.step().unwrap();
    assert!(gb.cpu.halted);
    assert_eq!(gb.cpu.regs.pc, 0x0001);

    // Still halted: nothing is requested.
    let cycles = gb.step().unwrap();
    assert_eq!(cycles, 4);
    assert!(gb.cpu.halted);

    // An enabled, requested line releases halt even with IME clear; without
    // IME there is no jump to the vector.
    gb.interrupts().borrow_mut().request_timer();
    gb.step().unwrap();
    assert!(!gb.cpu.halted);
    assert_eq!(gb.cpu.regs.pc, 0x0001);
}

#[test]
fn halted_cpu_services_interrupts_when_ime_is_set() {
    let mut gb = gameboy(&[0x76]);
    gb.cpu.regs.sp = 0xC100;
    gb.cpu.ime = true;
    gb.interrupts().borrow_mut().write_ie(0x04);
    gb.step().unwrap();
    assert!(gb.cpu.halted);

    gb.interrupts().borrow_mut().request_timer();
    let cycles = gb.step().unwrap();
    assert_eq!(cycles, 24);
    assert_eq!(gb.cpu.regs.pc, 0x0050);
    assert!(!gb.cpu.halted);
    assert!(!gb.cpu.ime);
}

#[test]
fn interrupt_service_takes_the_highest_priority_line() {
    let mut gb = gameboy(&[0x00]);
    gb.cpu.regs.sp = 0xC100;
    gb.cpu.ime = true;
    {
        let mut ints = gb.interrupts().borrow_mut();
        ints.write_ie(0x05); // VBlank + Timer
        ints.request_vblank();
        ints.request_timer();
    }

    let cycles = gb.step().unwrap();
    // NOP plus the dispatch cost.
    assert_eq!(cycles, 24);
    assert_eq!(gb.cpu.regs.pc, 0x0040);
    assert!(!gb.cpu.ime);
    // Return address pushed high byte first, SP predecremented per push.
    assert_eq!(gb.cpu.regs.sp, 0xC0FE);
    assert_eq!(gb.mmu.read8(0xC0FE), 0x01);
    assert_eq!(gb.mmu.read8(0xC0FF), 0x00);
    // Only VBlank's requested bit is cleared; Timer stays pending.
    assert_eq!(gb.mmu.read8(0xFF0F) & 0x1F, 0x04);
}

#[test]
fn ei_takes_effect_after_the_following_instruction() {
    let mut gb = gameboy(&[0xFB, 0x00, 0x00]);
    gb.cpu.regs.sp = 0xC100;
    {
        let mut ints = gb.interrupts().borrow_mut();
        ints.write_ie(0x01);
        ints.request_vblank();
    }

    // EI itself does not service.
    let cycles = gb.step().unwrap();
    assert_eq!(cycles, 4);
    assert_eq!(gb.cpu.regs.pc, 0x0001);

    // The instruction after EI runs, then the interrupt dispatches.
    let cycles = gb.step().unwrap();
    assert_eq!(cycles, 24);
    assert_eq!(gb.cpu.regs.pc, 0x0040);
}

#[test]
fn di_cancels_a_pending_enable() {
    let mut gb = gameboy(&[0xFB, 0xF3, 0x00]);
    {
        let mut ints = gb.interrupts().borrow_mut();
        ints.write_ie(0x01);
        ints.request_vblank();
    }
    gb.step().unwrap(); // EI
    gb.step().unwrap(); // DI
    gb.step().unwrap(); // NOP: no dispatch
    assert!(!gb.cpu.ime);
    assert_eq!(gb.cpu.regs.pc, 0x0003);
}

#[test]
fn stop_enters_the_low_power_state() {
    let mut gb = gameboy(&[0x10, 0x00]);
    let cycles = gb.step().unwrap();
    assert_eq!(cycles, 4);
    assert!(gb.cpu.halted);
    assert_eq!(gb.cpu.regs.pc, 0x0002);
}

#[test]
fn cycle_counter_accumulates() {
    let mut gb = gameboy(&[0x00, 0x06, 0x12, 0xC3, 0x00, 0x01]);
    gb.step().unwrap(); // NOP, 4
    gb.step().unwrap(); // LD B,d8, 8
    gb.step().unwrap(); // JP a16, 16
    assert_eq!(gb.cpu.cycles, 28);
    assert_eq!(gb.cpu.regs.b, 0x12);
    assert_eq!(gb.cpu.regs.pc, 0x0100);
}
