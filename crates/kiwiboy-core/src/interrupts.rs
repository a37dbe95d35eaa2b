use bitflags::bitflags;

use crate::mmu::{BusDevice, ReadOutcome, WriteOutcome};

/// Requested-set register (IF).
pub const IF_ADDR: u16 = 0xFF0F;
/// Enabled-set register (IE).
pub const IE_ADDR: u16 = 0xFFFF;

// Interrupt vectors (gbdev.io/pandocs/Interrupts.html)
const VECTOR_VBLANK: u16 = 0x40;
const VECTOR_STAT: u16 = 0x48;
const VECTOR_TIMER: u16 = 0x50;
const VECTOR_SERIAL: u16 = 0x58;
const VECTOR_JOYPAD: u16 = 0x60;

bitflags! {
    /// The five interrupt lines as they appear in the low bits of IE/IF.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct InterruptFlags: u8 {
        const VBLANK = 1 << 0;
        const STAT   = 1 << 1;
        const TIMER  = 1 << 2;
        const SERIAL = 1 << 3;
        const JOYPAD = 1 << 4;
    }
}

/// One interrupt line, in dispatch-priority order (highest first).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InterruptLine {
    VBlank,
    Stat,
    Timer,
    Serial,
    Joypad,
}

impl InterruptLine {
    /// Fixed, total priority order. Simultaneous requests resolve in this
    /// order; software depends on it.
    pub const PRIORITY: [InterruptLine; 5] = [
        InterruptLine::VBlank,
        InterruptLine::Stat,
        InterruptLine::Timer,
        InterruptLine::Serial,
        InterruptLine::Joypad,
    ];

    pub const fn mask(self) -> InterruptFlags {
        match self {
            InterruptLine::VBlank => InterruptFlags::VBLANK,
            InterruptLine::Stat => InterruptFlags::STAT,
            InterruptLine::Timer => InterruptFlags::TIMER,
            InterruptLine::Serial => InterruptFlags::SERIAL,
            InterruptLine::Joypad => InterruptFlags::JOYPAD,
        }
    }

    pub const fn vector(self) -> u16 {
        match self {
            InterruptLine::VBlank => VECTOR_VBLANK,
            InterruptLine::Stat => VECTOR_STAT,
            InterruptLine::Timer => VECTOR_TIMER,
            InterruptLine::Serial => VECTOR_SERIAL,
            InterruptLine::Joypad => VECTOR_JOYPAD,
        }
    }
}

/// The interrupt controller: an enabled set and a requested set over the five
/// lines, bus-mapped at IE/IF.
///
/// Peripherals raise requests through the per-line setters; the CPU consumes
/// them in priority order during its interrupt poll.
pub struct Interrupts {
    enabled: InterruptFlags,
    /// Upper three bits of IE have no lines behind them but are writable
    /// storage on hardware; preserved so software reads back what it wrote.
    ie_upper: u8,
    requested: InterruptFlags,
}

impl Interrupts {
    pub fn new() -> Self {
        Self {
            enabled: InterruptFlags::empty(),
            ie_upper: 0,
            // VBlank is already pending when control passes to the cartridge.
            requested: InterruptFlags::VBLANK,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Raise a request on `line`. Idempotent.
    pub fn request(&mut self, line: InterruptLine) {
        self.requested |= line.mask();
    }

    pub fn request_vblank(&mut self) {
        self.request(InterruptLine::VBlank);
    }

    pub fn request_stat(&mut self) {
        self.request(InterruptLine::Stat);
    }

    pub fn request_timer(&mut self) {
        self.request(InterruptLine::Timer);
    }

    pub fn request_serial(&mut self) {
        self.request(InterruptLine::Serial);
    }

    pub fn request_joypad(&mut self) {
        self.request(InterruptLine::Joypad);
    }

    /// Highest-priority line that is both enabled and requested, if any.
    pub fn next_request(&self) -> Option<InterruptLine> {
        let pending = self.enabled & self.requested;
        InterruptLine::PRIORITY
            .into_iter()
            .find(|line| pending.contains(line.mask()))
    }

    /// As [`next_request`](Self::next_request), but clears the returned
    /// line's requested bit. Call at most once per interrupt service.
    pub fn consume_request(&mut self) -> Option<InterruptLine> {
        let line = self.next_request()?;
        self.requested &= !line.mask();
        Some(line)
    }

    /// IF as seen on the bus: the upper bits have no backing lines and read
    /// high.
    pub fn read_if(&self) -> u8 {
        0xE0 | self.requested.bits()
    }

    pub fn write_if(&mut self, value: u8) {
        self.requested = InterruptFlags::from_bits_truncate(value);
    }

    pub fn read_ie(&self) -> u8 {
        self.ie_upper | self.enabled.bits()
    }

    pub fn write_ie(&mut self, value: u8) {
        self.enabled = InterruptFlags::from_bits_truncate(value);
        self.ie_upper = value & 0xE0;
    }
}

impl Default for Interrupts {
    fn default() -> Self {
        Self::new()
    }
}

impl BusDevice for Interrupts {
    fn on_read(&mut self, addr: u16) -> ReadOutcome {
        match addr {
            IF_ADDR => ReadOutcome::Replace(self.read_if()),
            IE_ADDR => ReadOutcome::Replace(self.read_ie()),
            _ => panic!("interrupt controller read outside IE/IF: {addr:#06X}"),
        }
    }

    fn on_write(&mut self, addr: u16, value: u8) -> WriteOutcome {
        match addr {
            IF_ADDR => {
                self.write_if(value);
                WriteOutcome::Block
            }
            IE_ADDR => {
                self.write_ie(value);
                WriteOutcome::Block
            }
            _ => panic!("interrupt controller write outside IE/IF: {addr:#06X}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> Interrupts {
        let mut ints = Interrupts::new();
        // Drop the power-on VBlank request so tests start from a clean slate.
        ints.write_if(0);
        ints
    }

    #[test]
    fn priority_order_is_fixed() {
        let mut ints = fresh();
        ints.write_ie(0x1F);
        ints.request_joypad();
        ints.request_timer();
        assert_eq!(ints.next_request(), Some(InterruptLine::Timer));
        ints.request_vblank();
        assert_eq!(ints.next_request(), Some(InterruptLine::VBlank));
    }

    #[test]
    fn consume_clears_only_the_returned_line() {
        let mut ints = fresh();
        ints.write_ie(0x1F);
        ints.request_vblank();
        ints.request_timer();
        assert_eq!(ints.consume_request(), Some(InterruptLine::VBlank));
        assert_eq!(ints.read_if() & 0x1F, InterruptFlags::TIMER.bits());
        assert_eq!(ints.consume_request(), Some(InterruptLine::Timer));
        assert_eq!(ints.consume_request(), None);
    }

    #[test]
    fn disabled_lines_are_never_returned() {
        let mut ints = fresh();
        ints.write_ie(InterruptFlags::SERIAL.bits());
        ints.request_timer();
        assert_eq!(ints.next_request(), None);
        ints.request_serial();
        assert_eq!(ints.next_request(), Some(InterruptLine::Serial));
    }

    #[test]
    fn request_is_idempotent() {
        let mut ints = fresh();
        ints.write_ie(0x1F);
        ints.request_timer();
        ints.request_timer();
        assert_eq!(ints.consume_request(), Some(InterruptLine::Timer));
        assert_eq!(ints.next_request(), None);
    }

    #[test]
    fn if_upper_bits_read_high() {
        let mut ints = fresh();
        assert_eq!(ints.read_if(), 0xE0);
        ints.write_if(0xFF);
        assert_eq!(ints.read_if(), 0xFF);
        assert_eq!(ints.read_if() & 0x1F, 0x1F);
    }

    #[test]
    fn ie_stores_written_upper_bits() {
        let mut ints = fresh();
        ints.write_ie(0xA5);
        assert_eq!(ints.read_ie(), 0xA5);
    }

    #[test]
    fn power_on_state_has_vblank_pending() {
        let ints = Interrupts::new();
        assert_eq!(ints.read_if(), 0xE1);
    }

    #[test]
    #[should_panic(expected = "interrupt controller read outside IE/IF")]
    fn read_outside_capability_panics() {
        let mut ints = fresh();
        let _ = ints.on_read(0xFF00);
    }
}
