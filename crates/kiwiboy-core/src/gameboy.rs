use std::cell::RefCell;
use std::io::{Read, Write};
use std::rc::Rc;

use crate::cpu::Cpu;
use crate::error::{BuildError, StepError};
use crate::hardware::Model;
use crate::interrupts::{IE_ADDR, IF_ADDR, Interrupts};
use crate::mmu::{BusDevice, HandlerHandle, MemoryRegion, Mmu};
use crate::opcodes::OpcodeTable;

/// Contract for time-sensitive peripherals.
///
/// The orchestrator calls `step` exactly once per CPU step with the cycle
/// count the CPU just consumed, so no peripheral ever lags or leads by more
/// than one step. Peripherals raise interrupts through the controller they
/// are handed; they never touch the IE/IF bits directly, and they must not
/// access the bus from inside `step`.
pub trait Peripheral: BusDevice {
    fn step(&mut self, cycles: u32, interrupts: &mut Interrupts);
}

/// Cartridge collaborator interface. Bank switching, RTC, and save-file
/// layout all live behind it, outside the core.
pub trait Cartridge: Peripheral {
    fn load(&mut self, reader: &mut dyn Read) -> std::io::Result<()>;
    fn save(&self, writer: &mut dyn Write) -> std::io::Result<()>;
    fn load_save(&mut self, reader: &mut dyn Read) -> std::io::Result<()>;
}

/// Console construction options.
#[derive(Clone, Copy, Debug, Default)]
pub struct Options {
    pub model: Model,
    /// Requires a model that supports it; validated at construction.
    pub double_speed: bool,
}

/// The console: CPU, bus, interrupt controller, and the ordered peripheral
/// list, advanced in lockstep one step at a time.
///
/// Peripherals are stepped in attachment order; attach them in the canonical
/// hardware order (cartridge/MBC, DMA, PPU, timer, serial) so bus-visible
/// effects land before the next CPU fetch observes them. Attaching and
/// detaching anything must happen strictly between steps.
pub struct GameBoy {
    pub cpu: Cpu,
    pub mmu: Mmu,
    interrupts: Rc<RefCell<Interrupts>>,
    opcodes: OpcodeTable,
    peripherals: Vec<Rc<RefCell<dyn Peripheral>>>,
    cartridge: Option<Rc<RefCell<dyn Cartridge>>>,
    model: Model,
    double_speed: bool,
    post_boot: bool,
}

impl std::fmt::Debug for GameBoy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameBoy")
            .field("peripherals", &self.peripherals.len())
            .field("model", &self.model)
            .field("double_speed", &self.double_speed)
            .field("post_boot", &self.post_boot)
            .finish_non_exhaustive()
    }
}

impl GameBoy {
    /// Console in the power-on state (zeroed registers), ready to execute a
    /// boot ROM at 0x0000.
    pub fn new(options: Options) -> Result<Self, BuildError> {
        Self::build(options, false)
    }

    /// Console in the documented post-boot state (PC = 0x0100, SP = 0xFFFE),
    /// for running cartridges without a boot ROM.
    pub fn new_post_boot(options: Options) -> Result<Self, BuildError> {
        Self::build(options, true)
    }

    fn build(options: Options, post_boot: bool) -> Result<Self, BuildError> {
        if options.double_speed && !options.model.supports_double_speed() {
            return Err(BuildError::UnsupportedFeature {
                model: options.model,
            });
        }
        let opcodes = OpcodeTable::load()?;

        let mut mmu = Mmu::new();
        let interrupts = Rc::new(RefCell::new(Interrupts::new()));
        mmu.add_handler(MemoryRegion::single(IF_ADDR), interrupts.clone());
        mmu.add_handler(MemoryRegion::single(IE_ADDR), interrupts.clone());

        let cpu = if post_boot {
            Cpu::post_boot(options.model)
        } else {
            Cpu::new()
        };

        Ok(Self {
            cpu,
            mmu,
            interrupts,
            opcodes,
            peripherals: Vec::new(),
            cartridge: None,
            model: options.model,
            double_speed: options.double_speed,
            post_boot,
        })
    }

    pub fn model(&self) -> Model {
        self.model
    }

    pub fn double_speed(&self) -> bool {
        self.double_speed
    }

    /// The interrupt controller, for wiring peripherals that raise requests
    /// outside their `step` callback.
    pub fn interrupts(&self) -> &Rc<RefCell<Interrupts>> {
        &self.interrupts
    }

    /// Register a peripheral over the bus regions it claims and append it to
    /// the step list. Attachment order is step order.
    pub fn attach_peripheral<P: Peripheral + 'static>(
        &mut self,
        device: Rc<RefCell<P>>,
        regions: &[MemoryRegion],
    ) -> Vec<HandlerHandle> {
        let handles = regions
            .iter()
            .map(|&region| {
                let handler: Rc<RefCell<dyn BusDevice>> = device.clone();
                self.mmu.add_handler(region, handler)
            })
            .collect();
        let stepped: Rc<RefCell<dyn Peripheral>> = device;
        self.peripherals.push(stepped);
        handles
    }

    /// As [`attach_peripheral`](Self::attach_peripheral), additionally wiring
    /// the device as the target of the cartridge pass-throughs.
    pub fn attach_cartridge<C: Cartridge + 'static>(
        &mut self,
        cartridge: Rc<RefCell<C>>,
        regions: &[MemoryRegion],
    ) -> Vec<HandlerHandle> {
        let handles = self.attach_peripheral(cartridge.clone(), regions);
        let cart: Rc<RefCell<dyn Cartridge>> = cartridge;
        self.cartridge = Some(cart);
        handles
    }

    /// Register a bare bus handler (e.g. a debugger) without adding it to the
    /// step list.
    pub fn attach_handler(
        &mut self,
        region: MemoryRegion,
        device: Rc<RefCell<dyn BusDevice>>,
    ) -> HandlerHandle {
        self.mmu.add_handler(region, device)
    }

    pub fn detach_handler(&mut self, handle: HandlerHandle) {
        self.mmu.remove_handler(handle);
    }

    /// Read a cartridge image through the attached cartridge collaborator.
    pub fn load_cartridge(&mut self, reader: &mut dyn Read) -> std::io::Result<()> {
        match &self.cartridge {
            Some(cart) => cart.borrow_mut().load(reader),
            None => Err(no_cartridge()),
        }
    }

    pub fn save(&self, writer: &mut dyn Write) -> std::io::Result<()> {
        match &self.cartridge {
            Some(cart) => cart.borrow().save(writer),
            None => Err(no_cartridge()),
        }
    }

    pub fn load_save(&mut self, reader: &mut dyn Read) -> std::io::Result<()> {
        match &self.cartridge {
            Some(cart) => cart.borrow_mut().load_save(reader),
            None => Err(no_cartridge()),
        }
    }

    /// Advance the machine by one instruction: step the CPU, then every
    /// peripheral with the same cycle delta. Returns the cycles consumed.
    pub fn step(&mut self) -> Result<u32, StepError> {
        let cycles = self.cpu.step(&self.opcodes, &mut self.mmu, &self.interrupts)?;
        let mut interrupts = self.interrupts.borrow_mut();
        for peripheral in &self.peripherals {
            peripheral.borrow_mut().step(cycles, &mut interrupts);
        }
        Ok(cycles)
    }

    /// Restore registers and interrupt state to their construction-time
    /// values. Attached peripherals, handler registrations, and backing
    /// memory are preserved.
    pub fn reset(&mut self) {
        self.cpu = if self.post_boot {
            Cpu::post_boot(self.model)
        } else {
            Cpu::new()
        };
        self.interrupts.borrow_mut().reset();
    }
}

fn no_cartridge() -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::NotConnected, "no cartridge attached")
}
