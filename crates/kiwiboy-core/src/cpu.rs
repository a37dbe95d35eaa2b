use std::cell::RefCell;

use crate::error::StepError;
use crate::hardware::Model;
use crate::interrupts::Interrupts;
use crate::mmu::Mmu;
use crate::opcodes::{OpcodeTable, PREFIX};
use crate::registers::{FLAG_C, FLAG_H, FLAG_N, FLAG_Z, Flags, Registers};

// Dispatching to an interrupt vector costs two stack pushes plus three
// internal machine cycles on top of the interrupted instruction.
const INTERRUPT_DISPATCH_CYCLES: u32 = 20;

// A halted CPU still consumes one machine cycle per step.
const HALT_STEP_CYCLES: u32 = 4;

/// The CPU execution engine: fetch, decode, execute, then poll interrupts.
///
/// The engine is either running or halted; HALT (and STOP) enter the halted
/// state, and an enabled-and-requested interrupt line leaves it. All cycle
/// costs come from the decode table so the orchestrator can advance
/// peripherals by the exact amount this step consumed.
pub struct Cpu {
    pub regs: Registers,
    pub ime: bool,
    ime_enable_delay: u8,
    pub halted: bool,
    /// Total cycles executed since construction.
    pub cycles: u64,
}

impl Cpu {
    /// CPU with all registers zeroed, ready to execute a boot ROM at 0x0000.
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            ime: false,
            ime_enable_delay: 0,
            halted: false,
            cycles: 0,
        }
    }

    /// CPU initialized to the documented post-boot register state for the
    /// selected hardware model, for starting emulation at the cartridge
    /// entry point without a boot ROM.
    pub fn post_boot(model: Model) -> Self {
        Self {
            regs: Registers::post_boot(model),
            ..Self::new()
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    #[inline]
    fn f(&self) -> u8 {
        self.regs.f.bits()
    }

    #[inline]
    fn set_f(&mut self, bits: u8) {
        self.regs.f = Flags::from(bits);
    }

    #[inline(always)]
    fn fetch8(&mut self, mmu: &mut Mmu) -> u8 {
        let val = mmu.read8(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        val
    }

    #[inline(always)]
    fn fetch16(&mut self, mmu: &mut Mmu) -> u16 {
        let lo = self.fetch8(mmu) as u16;
        let hi = self.fetch8(mmu) as u16;
        (hi << 8) | lo
    }

    fn push_stack(&mut self, mmu: &mut Mmu, val: u16) {
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        mmu.write8(self.regs.sp, (val >> 8) as u8);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        mmu.write8(self.regs.sp, val as u8);
    }

    fn pop_stack(&mut self, mmu: &mut Mmu) -> u16 {
        let lo = mmu.read8(self.regs.sp) as u16;
        self.regs.sp = self.regs.sp.wrapping_add(1);
        let hi = mmu.read8(self.regs.sp) as u16;
        self.regs.sp = self.regs.sp.wrapping_add(1);
        (hi << 8) | lo
    }

    /// Read the register selected by the standard 3-bit encoding; index 6 is
    /// the (HL) memory operand.
    fn read_reg(&mut self, mmu: &mut Mmu, index: u8) -> u8 {
        match index {
            0 => self.regs.b,
            1 => self.regs.c,
            2 => self.regs.d,
            3 => self.regs.e,
            4 => self.regs.h,
            5 => self.regs.l,
            6 => mmu.read8(self.regs.get_hl()),
            7 => self.regs.a,
            _ => unreachable!(),
        }
    }

    fn write_reg(&mut self, mmu: &mut Mmu, index: u8, val: u8) {
        match index {
            0 => self.regs.b = val,
            1 => self.regs.c = val,
            2 => self.regs.d = val,
            3 => self.regs.e = val,
            4 => self.regs.h = val,
            5 => self.regs.l = val,
            6 => {
                let addr = self.regs.get_hl();
                mmu.write8(addr, val);
            }
            7 => self.regs.a = val,
            _ => unreachable!(),
        }
    }

    /// 16-bit register pair selected by bits 5-4 of the opcode; index 3 is SP.
    fn read_pair(&self, index: u8) -> u16 {
        match index {
            0 => self.regs.get_bc(),
            1 => self.regs.get_de(),
            2 => self.regs.get_hl(),
            3 => self.regs.sp,
            _ => unreachable!(),
        }
    }

    fn write_pair(&mut self, index: u8, val: u16) {
        match index {
            0 => self.regs.set_bc(val),
            1 => self.regs.set_de(val),
            2 => self.regs.set_hl(val),
            3 => self.regs.sp = val,
            _ => unreachable!(),
        }
    }

    /// Pair selection for PUSH/POP, where index 3 is AF instead of SP.
    fn read_pair_af(&self, index: u8) -> u16 {
        match index {
            0 => self.regs.get_bc(),
            1 => self.regs.get_de(),
            2 => self.regs.get_hl(),
            3 => self.regs.get_af(),
            _ => unreachable!(),
        }
    }

    fn write_pair_af(&mut self, index: u8, val: u16) {
        match index {
            0 => self.regs.set_bc(val),
            1 => self.regs.set_de(val),
            2 => self.regs.set_hl(val),
            // Writing AF can never set the unused low nibble of F.
            3 => self.regs.set_af(val),
            _ => unreachable!(),
        }
    }

    /// Branch condition selected by bits 4-3 of the opcode: NZ, Z, NC, C.
    fn condition(&self, index: u8) -> bool {
        match index {
            0 => self.f() & FLAG_Z == 0,
            1 => self.f() & FLAG_Z != 0,
            2 => self.f() & FLAG_C == 0,
            3 => self.f() & FLAG_C != 0,
            _ => unreachable!(),
        }
    }

    /// Formatted CPU state string for debugging.
    pub fn debug_state(&self) -> String {
        format!(
            "AF:{:04X} BC:{:04X} DE:{:04X} HL:{:04X} PC:{:04X} SP:{:04X} CY:{}",
            self.regs.get_af(),
            self.regs.get_bc(),
            self.regs.get_de(),
            self.regs.get_hl(),
            self.regs.pc,
            self.regs.sp,
            self.cycles
        )
    }

    /// Execute one instruction, poll interrupts, and return the total cycles
    /// consumed. An undefined opcode is fatal; the caller decides whether to
    /// stop the session.
    pub fn step(
        &mut self,
        table: &OpcodeTable,
        mmu: &mut Mmu,
        ints: &RefCell<Interrupts>,
    ) -> Result<u32, StepError> {
        if self.halted {
            let mut cycles = HALT_STEP_CYCLES;
            cycles += self.dispatch_interrupts(mmu, ints);
            self.cycles += cycles as u64;
            return Ok(cycles);
        }

        let enable_after = self.ime_enable_delay == 1;

        let addr = self.regs.pc;
        let mut byte = self.fetch8(mmu);
        let prefixed = byte == PREFIX;
        if prefixed {
            byte = self.fetch8(mmu);
        }
        let Some(instr) = table.instruction_from_byte(addr, byte, prefixed) else {
            return Err(StepError::UnknownOpcode {
                opcode: byte,
                prefixed,
                addr,
            });
        };
        #[cfg(feature = "cpu-trace")]
        log::trace!(target: "cpu", "{instr} | {}", self.debug_state());

        let taken = if prefixed {
            self.execute_cb(byte, mmu);
            true
        } else {
            self.execute(byte, mmu)
        };

        let mut cycles = if taken {
            instr.opcode.cycles
        } else {
            instr.opcode.cycles_not_taken.unwrap_or(instr.opcode.cycles)
        } as u32;

        if enable_after && self.ime_enable_delay > 0 {
            self.ime = true;
        }
        if self.ime_enable_delay > 0 {
            self.ime_enable_delay -= 1;
        }

        cycles += self.dispatch_interrupts(mmu, ints);
        self.cycles += cycles as u64;
        Ok(cycles)
    }

    /// Service the highest-priority enabled-and-requested line, if any.
    ///
    /// An enabled pending line always releases the halted state; the jump to
    /// the vector happens only when IME is set. Returns the extra cycles
    /// consumed (zero when nothing was dispatched).
    fn dispatch_interrupts(&mut self, mmu: &mut Mmu, ints: &RefCell<Interrupts>) -> u32 {
        let vector = {
            let mut ctrl = ints.borrow_mut();
            if ctrl.next_request().is_none() {
                return 0;
            }
            self.halted = false;
            if !self.ime {
                return 0;
            }
            match ctrl.consume_request() {
                Some(line) => {
                    self.ime = false;
                    line.vector()
                }
                None => return 0,
            }
        };
        // Controller borrow is released: the pushes below may land on the IE
        // register through the bus.
        self.push_stack(mmu, self.regs.pc);
        self.regs.pc = vector;
        INTERRUPT_DISPATCH_CYCLES
    }

    /// Dispatch one unprefixed opcode. Returns whether a conditional branch
    /// was taken (unconditional instructions always count as taken).
    fn execute(&mut self, opcode: u8, mmu: &mut Mmu) -> bool {
        match opcode {
            0x00 => {}
            // LD rr,d16
            0x01 | 0x11 | 0x21 | 0x31 => {
                let val = self.fetch16(mmu);
                self.write_pair((opcode >> 4) & 0x03, val);
            }
            0x02 => {
                mmu.write8(self.regs.get_bc(), self.regs.a);
            }
            // INC rr
            0x03 | 0x13 | 0x23 | 0x33 => {
                let index = (opcode >> 4) & 0x03;
                self.write_pair(index, self.read_pair(index).wrapping_add(1));
            }
            // INC r
            0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x34 | 0x3C => {
                let r = (opcode >> 3) & 0x07;
                let old = self.read_reg(mmu, r);
                let res = old.wrapping_add(1);
                self.write_reg(mmu, r, res);
                self.set_f(
                    (self.f() & FLAG_C)
                        | if res == 0 { FLAG_Z } else { 0 }
                        | if (old & 0x0F) + 1 > 0x0F { FLAG_H } else { 0 },
                );
            }
            // DEC r
            0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x35 | 0x3D => {
                let r = (opcode >> 3) & 0x07;
                let old = self.read_reg(mmu, r);
                let res = old.wrapping_sub(1);
                self.write_reg(mmu, r, res);
                self.set_f(
                    (self.f() & FLAG_C)
                        | FLAG_N
                        | if res == 0 { FLAG_Z } else { 0 }
                        | if old & 0x0F == 0 { FLAG_H } else { 0 },
                );
            }
            // LD r,d8
            0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x36 | 0x3E => {
                let val = self.fetch8(mmu);
                self.write_reg(mmu, (opcode >> 3) & 0x07, val);
            }
            0x07 => {
                let carry = self.regs.a & 0x80 != 0;
                self.regs.a = self.regs.a.rotate_left(1);
                self.set_f(if carry { FLAG_C } else { 0 });
            }
            0x08 => {
                let addr = self.fetch16(mmu);
                mmu.write16(addr, self.regs.sp);
            }
            // ADD HL,rr
            0x09 | 0x19 | 0x29 | 0x39 => {
                let val = self.read_pair((opcode >> 4) & 0x03);
                let hl = self.regs.get_hl();
                let res = hl.wrapping_add(val);
                self.set_f(
                    (self.f() & FLAG_Z)
                        | if ((hl & 0x0FFF) + (val & 0x0FFF)) & 0x1000 != 0 {
                            FLAG_H
                        } else {
                            0
                        }
                        | if (hl as u32 + val as u32) > 0xFFFF {
                            FLAG_C
                        } else {
                            0
                        },
                );
                self.regs.set_hl(res);
            }
            0x0A => {
                self.regs.a = mmu.read8(self.regs.get_bc());
            }
            // DEC rr
            0x0B | 0x1B | 0x2B | 0x3B => {
                let index = (opcode >> 4) & 0x03;
                self.write_pair(index, self.read_pair(index).wrapping_sub(1));
            }
            0x0F => {
                let carry = self.regs.a & 0x01 != 0;
                self.regs.a = self.regs.a.rotate_right(1);
                self.set_f(if carry { FLAG_C } else { 0 });
            }
            0x10 => {
                // STOP: consume the pad byte and enter the low-power state.
                let _ = self.fetch8(mmu);
                self.halted = true;
            }
            0x12 => {
                mmu.write8(self.regs.get_de(), self.regs.a);
            }
            0x17 => {
                let carry = self.regs.a & 0x80 != 0;
                let carry_in = if self.f() & FLAG_C != 0 { 1 } else { 0 };
                self.regs.a = (self.regs.a << 1) | carry_in;
                self.set_f(if carry { FLAG_C } else { 0 });
            }
            0x18 => {
                let offset = self.fetch8(mmu) as i8;
                self.regs.pc = self.regs.pc.wrapping_add(offset as u16);
            }
            0x1A => {
                self.regs.a = mmu.read8(self.regs.get_de());
            }
            0x1F => {
                let carry = self.regs.a & 0x01 != 0;
                let carry_in: u8 = if self.f() & FLAG_C != 0 { 1 } else { 0 };
                self.regs.a = (self.regs.a >> 1) | (carry_in << 7);
                self.set_f(if carry { FLAG_C } else { 0 });
            }
            // JR cc,r8
            0x20 | 0x28 | 0x30 | 0x38 => {
                let offset = self.fetch8(mmu) as i8;
                if !self.condition((opcode >> 3) & 0x03) {
                    return false;
                }
                self.regs.pc = self.regs.pc.wrapping_add(offset as u16);
            }
            0x22 => {
                let addr = self.regs.get_hl();
                mmu.write8(addr, self.regs.a);
                self.regs.set_hl(addr.wrapping_add(1));
            }
            0x27 => {
                let mut correction = 0u8;
                let mut carry = false;
                if self.f() & FLAG_H != 0 || (self.f() & FLAG_N == 0 && self.regs.a & 0x0F > 9) {
                    correction |= 0x06;
                }
                if self.f() & FLAG_C != 0 || (self.f() & FLAG_N == 0 && self.regs.a > 0x99) {
                    correction |= 0x60;
                    carry = true;
                }
                if self.f() & FLAG_N == 0 {
                    self.regs.a = self.regs.a.wrapping_add(correction);
                } else {
                    self.regs.a = self.regs.a.wrapping_sub(correction);
                }
                self.set_f(
                    if self.regs.a == 0 { FLAG_Z } else { 0 }
                        | (self.f() & FLAG_N)
                        | if carry { FLAG_C } else { 0 },
                );
            }
            0x2A => {
                let addr = self.regs.get_hl();
                self.regs.a = mmu.read8(addr);
                self.regs.set_hl(addr.wrapping_add(1));
            }
            0x2F => {
                self.regs.a ^= 0xFF;
                self.set_f((self.f() & (FLAG_Z | FLAG_C)) | FLAG_N | FLAG_H);
            }
            0x32 => {
                let addr = self.regs.get_hl();
                mmu.write8(addr, self.regs.a);
                self.regs.set_hl(addr.wrapping_sub(1));
            }
            0x37 => {
                self.set_f((self.f() & FLAG_Z) | FLAG_C);
            }
            0x3A => {
                let addr = self.regs.get_hl();
                self.regs.a = mmu.read8(addr);
                self.regs.set_hl(addr.wrapping_sub(1));
            }
            0x3F => {
                self.set_f((self.f() & FLAG_Z) | if self.f() & FLAG_C != 0 { 0 } else { FLAG_C });
            }
            0x76 => {
                self.halted = true;
            }
            // LD r,r'
            opcode @ 0x40..=0x7F => {
                let val = self.read_reg(mmu, opcode & 0x07);
                self.write_reg(mmu, (opcode >> 3) & 0x07, val);
            }
            // ALU A,r
            opcode @ 0x80..=0xBF => {
                let val = self.read_reg(mmu, opcode & 0x07);
                self.alu((opcode >> 3) & 0x07, val);
            }
            // RET cc
            0xC0 | 0xC8 | 0xD0 | 0xD8 => {
                if !self.condition((opcode >> 3) & 0x03) {
                    return false;
                }
                self.regs.pc = self.pop_stack(mmu);
            }
            // POP rr
            0xC1 | 0xD1 | 0xE1 | 0xF1 => {
                let val = self.pop_stack(mmu);
                self.write_pair_af((opcode >> 4) & 0x03, val);
            }
            // JP cc,a16
            0xC2 | 0xCA | 0xD2 | 0xDA => {
                let addr = self.fetch16(mmu);
                if !self.condition((opcode >> 3) & 0x03) {
                    return false;
                }
                self.regs.pc = addr;
            }
            0xC3 => {
                self.regs.pc = self.fetch16(mmu);
            }
            // CALL cc,a16
            0xC4 | 0xCC | 0xD4 | 0xDC => {
                let addr = self.fetch16(mmu);
                if !self.condition((opcode >> 3) & 0x03) {
                    return false;
                }
                self.push_stack(mmu, self.regs.pc);
                self.regs.pc = addr;
            }
            // PUSH rr
            0xC5 | 0xD5 | 0xE5 | 0xF5 => {
                let val = self.read_pair_af((opcode >> 4) & 0x03);
                self.push_stack(mmu, val);
            }
            // ALU A,d8
            0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => {
                let val = self.fetch8(mmu);
                self.alu((opcode >> 3) & 0x07, val);
            }
            // RST
            0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
                self.push_stack(mmu, self.regs.pc);
                self.regs.pc = (opcode & 0x38) as u16;
            }
            0xC9 => {
                self.regs.pc = self.pop_stack(mmu);
            }
            0xCD => {
                let addr = self.fetch16(mmu);
                self.push_stack(mmu, self.regs.pc);
                self.regs.pc = addr;
            }
            0xD9 => {
                self.regs.pc = self.pop_stack(mmu);
                self.ime = true;
            }
            0xE0 => {
                let offset = self.fetch8(mmu);
                mmu.write8(0xFF00 | offset as u16, self.regs.a);
            }
            0xE2 => {
                mmu.write8(0xFF00 | self.regs.c as u16, self.regs.a);
            }
            0xE8 => {
                let val = self.fetch8(mmu) as i8 as i16 as u16;
                let sp = self.regs.sp;
                self.set_f(
                    if (sp & 0x0F) + (val & 0x0F) > 0x0F {
                        FLAG_H
                    } else {
                        0
                    } | if (sp & 0xFF) + (val & 0xFF) > 0xFF {
                        FLAG_C
                    } else {
                        0
                    },
                );
                self.regs.sp = sp.wrapping_add(val);
            }
            0xE9 => {
                self.regs.pc = self.regs.get_hl();
            }
            0xEA => {
                let addr = self.fetch16(mmu);
                mmu.write8(addr, self.regs.a);
            }
            0xF0 => {
                let offset = self.fetch8(mmu);
                self.regs.a = mmu.read8(0xFF00 | offset as u16);
            }
            0xF2 => {
                self.regs.a = mmu.read8(0xFF00 | self.regs.c as u16);
            }
            0xF3 => {
                self.ime = false;
                self.ime_enable_delay = 0;
            }
            0xF8 => {
                let val = self.fetch8(mmu) as i8 as i16 as u16;
                let sp = self.regs.sp;
                self.set_f(
                    if (sp & 0x0F) + (val & 0x0F) > 0x0F {
                        FLAG_H
                    } else {
                        0
                    } | if (sp & 0xFF) + (val & 0xFF) > 0xFF {
                        FLAG_C
                    } else {
                        0
                    },
                );
                self.regs.set_hl(sp.wrapping_add(val));
            }
            0xF9 => {
                self.regs.sp = self.regs.get_hl();
            }
            0xFA => {
                let addr = self.fetch16(mmu);
                self.regs.a = mmu.read8(addr);
            }
            0xFB => {
                self.ime_enable_delay = 2;
            }
            _ => {
                // Undefined encodings never reach execution; decode rejects
                // them first.
                unreachable!("undefined opcode {opcode:02X} escaped decode");
            }
        }
        true
    }

    /// 8-bit accumulator arithmetic/logic selected by bits 5-3 of the opcode:
    /// ADD, ADC, SUB, SBC, AND, XOR, OR, CP.
    fn alu(&mut self, index: u8, val: u8) {
        let a = self.regs.a;
        match index {
            0 => {
                let (res, carry) = a.overflowing_add(val);
                self.set_f(
                    if res == 0 { FLAG_Z } else { 0 }
                        | if (a & 0x0F) + (val & 0x0F) > 0x0F {
                            FLAG_H
                        } else {
                            0
                        }
                        | if carry { FLAG_C } else { 0 },
                );
                self.regs.a = res;
            }
            1 => {
                let carry_in = if self.f() & FLAG_C != 0 { 1 } else { 0 };
                let (res1, carry1) = a.overflowing_add(val);
                let (res, carry2) = res1.overflowing_add(carry_in);
                self.set_f(
                    if res == 0 { FLAG_Z } else { 0 }
                        | if (a & 0x0F) + (val & 0x0F) + carry_in > 0x0F {
                            FLAG_H
                        } else {
                            0
                        }
                        | if carry1 || carry2 { FLAG_C } else { 0 },
                );
                self.regs.a = res;
            }
            2 => {
                let (res, borrow) = a.overflowing_sub(val);
                self.set_f(
                    FLAG_N
                        | if res == 0 { FLAG_Z } else { 0 }
                        | if (a & 0x0F) < (val & 0x0F) { FLAG_H } else { 0 }
                        | if borrow { FLAG_C } else { 0 },
                );
                self.regs.a = res;
            }
            3 => {
                let carry_in = if self.f() & FLAG_C != 0 { 1 } else { 0 };
                let (res1, borrow1) = a.overflowing_sub(val);
                let (res, borrow2) = res1.overflowing_sub(carry_in);
                self.set_f(
                    FLAG_N
                        | if res == 0 { FLAG_Z } else { 0 }
                        | if (a & 0x0F) < (val & 0x0F) + carry_in {
                            FLAG_H
                        } else {
                            0
                        }
                        | if borrow1 || borrow2 { FLAG_C } else { 0 },
                );
                self.regs.a = res;
            }
            4 => {
                self.regs.a &= val;
                self.set_f(if self.regs.a == 0 { FLAG_Z } else { 0 } | FLAG_H);
            }
            5 => {
                self.regs.a ^= val;
                self.set_f(if self.regs.a == 0 { FLAG_Z } else { 0 });
            }
            6 => {
                self.regs.a |= val;
                self.set_f(if self.regs.a == 0 { FLAG_Z } else { 0 });
            }
            7 => {
                let res = a.wrapping_sub(val);
                self.set_f(
                    FLAG_N
                        | if res == 0 { FLAG_Z } else { 0 }
                        | if (a & 0x0F) < (val & 0x0F) { FLAG_H } else { 0 }
                        | if a < val { FLAG_C } else { 0 },
                );
            }
            _ => unreachable!(),
        }
    }

    /// Dispatch one CB-prefixed opcode: rotates/shifts/SWAP, BIT, RES, SET.
    fn execute_cb(&mut self, opcode: u8, mmu: &mut Mmu) {
        let r = opcode & 0x07;
        match opcode {
            0x00..=0x3F => {
                let val = self.read_reg(mmu, r);
                let carry_in: u8 = if self.f() & FLAG_C != 0 { 1 } else { 0 };
                let (res, carry) = match opcode >> 3 {
                    0 => (val.rotate_left(1), val & 0x80 != 0),
                    1 => (val.rotate_right(1), val & 0x01 != 0),
                    2 => ((val << 1) | carry_in, val & 0x80 != 0),
                    3 => ((val >> 1) | (carry_in << 7), val & 0x01 != 0),
                    4 => (val << 1, val & 0x80 != 0),
                    5 => ((val >> 1) | (val & 0x80), val & 0x01 != 0),
                    6 => (val.rotate_left(4), false),
                    7 => (val >> 1, val & 0x01 != 0),
                    _ => unreachable!(),
                };
                self.write_reg(mmu, r, res);
                self.set_f(if res == 0 { FLAG_Z } else { 0 } | if carry { FLAG_C } else { 0 });
            }
            0x40..=0x7F => {
                let bit = (opcode - 0x40) >> 3;
                let val = self.read_reg(mmu, r);
                self.set_f(
                    (self.f() & FLAG_C)
                        | FLAG_H
                        | if val & (1 << bit) == 0 { FLAG_Z } else { 0 },
                );
            }
            0x80..=0xBF => {
                let bit = (opcode - 0x80) >> 3;
                let val = self.read_reg(mmu, r) & !(1 << bit);
                self.write_reg(mmu, r, val);
            }
            0xC0..=0xFF => {
                let bit = (opcode - 0xC0) >> 3;
                let val = self.read_reg(mmu, r) | (1 << bit);
                self.write_reg(mmu, r, val);
            }
        }
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}
