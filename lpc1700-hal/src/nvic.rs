//! # Interrupt controller module
//!
//! The [InterruptController] wraps the NVIC banks and the priority related parts of the SCB.
//! Interrupt sources are addressed with typed identifiers: [Interrupt] for the device specific
//! sources and [Exception] for the core exceptions, combined by [IrqSource] where an operation
//! accepts both. The typed identifiers replace the raw signed interrupt numbers of the
//! hardware manuals, the only remaining conversion points are [Interrupt::try_from] for raw
//! device ids and [Exception::irqn] for the signed core numbering.
use arbitrary_int::u5;

use lpc1700::{
    nvic::{MmioNvic, Nvic},
    scb::{Aircr, MmioScb, Scb, VECTKEY},
};

/// Number of priority bits implemented by the LPC1700 family.
pub const PRIORITY_BITS: usize = 5;
/// The priority value occupies the upper implemented bits of its 8-bit field.
pub const PRIORITY_SHIFT: usize = 8 - PRIORITY_BITS;

pub const HIGHEST_PRIORITY: u5 = u5::new(0);
/// Largest priority value, least urgent.
pub const LOWEST_PRIORITY: u5 = u5::new((1 << PRIORITY_BITS) - 1);

/// Number of implemented device interrupt sources.
pub const NUM_DEVICE_INTERRUPTS: usize = 35;

/// Core exceptions with their signed interrupt numbers.
///
/// These are always enabled and cannot be gated through the NVIC enable banks. Only a subset
/// has configurable priority, see [Self::priority_slot].
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
#[repr(i8)]
pub enum Exception {
    NonMaskableInt = -14,
    HardFault = -13,
    MemManage = -12,
    BusFault = -11,
    UsageFault = -10,
    SvCall = -5,
    DebugMonitor = -4,
    PendSv = -2,
    SysTick = -1,
}

impl Exception {
    /// Signed interrupt number of this exception.
    #[inline]
    pub const fn irqn(&self) -> i8 {
        *self as i8
    }

    /// Index of this exception into the system handler priority byte table.
    ///
    /// Returns [None] for the exceptions without backing priority storage, their priority is
    /// fixed by the hardware.
    pub const fn priority_slot(&self) -> Option<usize> {
        match self {
            Exception::NonMaskableInt | Exception::HardFault => None,
            _ => Some(((*self as i8 as u8 as usize) & 0xF) - 4),
        }
    }
}

/// Device specific interrupt sources of the LPC1700 family.
#[derive(Debug, Eq, PartialEq, Clone, Copy, num_enum::TryFromPrimitive, num_enum::IntoPrimitive)]
#[repr(u8)]
pub enum Interrupt {
    Wdt = 0,
    Timer0 = 1,
    Timer1 = 2,
    Timer2 = 3,
    Timer3 = 4,
    Uart0 = 5,
    Uart1 = 6,
    Uart2 = 7,
    Uart3 = 8,
    Pwm1 = 9,
    I2c0 = 10,
    I2c1 = 11,
    I2c2 = 12,
    Spi = 13,
    Ssp0 = 14,
    Ssp1 = 15,
    Pll0 = 16,
    Rtc = 17,
    Eint0 = 18,
    Eint1 = 19,
    Eint2 = 20,
    Eint3 = 21,
    Adc = 22,
    Bod = 23,
    Usb = 24,
    Can = 25,
    Gpdma = 26,
    I2s = 27,
    Ethernet = 28,
    Rit = 29,
    MotorPwm = 30,
    Qei = 31,
    Pll1 = 32,
    UsbActivity = 33,
    CanActivity = 34,
}

/// Interrupt source wrapper for the operations which accept both core exceptions and device
/// interrupts.
#[derive(Debug, Clone, Copy)]
pub enum IrqSource {
    Core(Exception),
    Device(Interrupt),
}

impl From<Exception> for IrqSource {
    fn from(value: Exception) -> Self {
        IrqSource::Core(value)
    }
}

impl From<Interrupt> for IrqSource {
    fn from(value: Interrupt) -> Self {
        IrqSource::Device(value)
    }
}

/// The requested core exception has no backing priority storage.
#[derive(Debug, thiserror::Error)]
#[error("core exception {0:?} has no priority slot")]
pub struct NoPrioritySlot(pub Exception);

/// Compute the AIRCR value which requests a system level reset while keeping the priority
/// grouping configuration intact.
pub fn reset_request(previous: Aircr) -> Aircr {
    let mut value = Aircr::new_with_raw_value(0);
    value.set_vectkey(VECTKEY);
    value.set_prigroup(previous.prigroup());
    value.set_sysresetreq(true);
    value
}

/// Higher-level interrupt controller for the LPC1700 family.
///
/// Enable, pending and active state of the device interrupt sources lives in bit-packed banks
/// addressed by `id / 32` and `id % 32`. Set and clear operations target separate
/// write-one-to-set and write-one-to-clear banks, so two different sources can be updated
/// concurrently from foreground and handler context without a read-modify-write race. Updates
/// to the same source still have to be serialized by the caller.
pub struct InterruptController {
    pub nvic: MmioNvic<'static>,
    pub scb: MmioScb<'static>,
}

impl InterruptController {
    /// Create the interrupt controller from the MMIO handles of the NVIC and SCB blocks.
    #[inline]
    pub const fn new(nvic: MmioNvic<'static>, scb: MmioScb<'static>) -> Self {
        Self { nvic, scb }
    }

    /// Create the interrupt controller with the fixed MMIO instances.
    ///
    /// # Safety
    ///
    /// This circumvents ownership checks. It is mainly intended to be used inside interrupt
    /// handlers.
    #[inline]
    pub unsafe fn steal() -> Self {
        Self {
            nvic: unsafe { Nvic::new_mmio_fixed() },
            scb: unsafe { Scb::new_mmio_fixed() },
        }
    }

    const fn bank_and_mask(irq: Interrupt) -> (usize, u32) {
        let raw = irq as usize;
        (raw >> 5, 1 << (raw & 0x1F))
    }

    /// Enable a device interrupt source.
    #[inline]
    pub fn enable(&mut self, irq: Interrupt) {
        let (bank, mask) = Self::bank_and_mask(irq);
        // Unwrap okay, bank index of a typed source is always valid.
        self.nvic.write_iser(bank, mask).unwrap();
    }

    /// Disable a device interrupt source.
    #[inline]
    pub fn disable(&mut self, irq: Interrupt) {
        let (bank, mask) = Self::bank_and_mask(irq);
        // Unwrap okay, bank index of a typed source is always valid.
        self.nvic.write_icer(bank, mask).unwrap();
    }

    /// Mark a device interrupt source pending. Setting an already pending source has no
    /// further effect.
    #[inline]
    pub fn set_pending(&mut self, irq: Interrupt) {
        let (bank, mask) = Self::bank_and_mask(irq);
        // Unwrap okay, bank index of a typed source is always valid.
        self.nvic.write_ispr(bank, mask).unwrap();
    }

    /// Retract the pending state of a device interrupt source. Idempotent.
    #[inline]
    pub fn clear_pending(&mut self, irq: Interrupt) {
        let (bank, mask) = Self::bank_and_mask(irq);
        // Unwrap okay, bank index of a typed source is always valid.
        self.nvic.write_icpr(bank, mask).unwrap();
    }

    /// Read the pending bit of a device interrupt source.
    #[inline]
    pub fn is_pending(&self, irq: Interrupt) -> bool {
        let (bank, mask) = Self::bank_and_mask(irq);
        // Unwrap okay, bank index of a typed source is always valid.
        self.nvic.read_ispr(bank).unwrap() & mask != 0
    }

    /// Read the active bit of a device interrupt source.
    #[inline]
    pub fn is_active(&self, irq: Interrupt) -> bool {
        let (bank, mask) = Self::bank_and_mask(irq);
        // Unwrap okay, bank index of a typed source is always valid.
        self.nvic.read_iabr(bank).unwrap() & mask != 0
    }

    /// Set the priority of an interrupt source.
    ///
    /// A lower numerical value means a higher urgency. The value is stored left-aligned in the
    /// upper [PRIORITY_BITS] bits of the priority byte. Core exceptions without priority
    /// storage are rejected.
    pub fn set_priority(&mut self, source: IrqSource, priority: u5) -> Result<(), NoPrioritySlot> {
        let byte = priority.value() << PRIORITY_SHIFT;
        match source {
            IrqSource::Core(exception) => {
                let slot = exception.priority_slot().ok_or(NoPrioritySlot(exception))?;
                // Unwrap okay, slot index is always valid.
                self.scb.write_shp(slot, byte).unwrap();
            }
            IrqSource::Device(irq) => {
                // Unwrap okay, byte index of a typed source is always valid.
                self.nvic.write_ip(irq as usize, byte).unwrap();
            }
        }
        Ok(())
    }

    /// Read back the priority of an interrupt source.
    ///
    /// This returns the value as aligned to the implemented priority bits, information below
    /// the implemented width is not retained by the hardware.
    pub fn priority(&self, source: IrqSource) -> Result<u5, NoPrioritySlot> {
        let byte = match source {
            IrqSource::Core(exception) => {
                let slot = exception.priority_slot().ok_or(NoPrioritySlot(exception))?;
                // Unwrap okay, slot index is always valid.
                self.scb.read_shp(slot).unwrap()
            }
            // Unwrap okay, byte index of a typed source is always valid.
            IrqSource::Device(irq) => self.nvic.read_ip(irq as usize).unwrap(),
        };
        Ok(u5::new(byte >> PRIORITY_SHIFT))
    }

    /// Trigger a device interrupt from software.
    #[inline]
    pub fn trigger(&mut self, irq: Interrupt) {
        self.nvic.write_stir(u8::from(irq) as u32);
    }

    /// De-initialize the device interrupt state to its reset defaults.
    ///
    /// All implemented device sources are disabled, their pending bits cleared and their
    /// priorities reset to the least urgent value. Core exceptions are untouched.
    pub fn deinit(&mut self) {
        log::debug!("de-initializing NVIC device interrupt state");
        let bank_masks: [u32; 2] = [u32::MAX, (1 << (NUM_DEVICE_INTERRUPTS - 32)) - 1];
        for (bank, mask) in bank_masks.iter().enumerate() {
            // Unwrap okay, valid indexes.
            self.nvic.write_icer(bank, *mask).unwrap();
            self.nvic.write_icpr(bank, *mask).unwrap();
        }
        for idx in 0..NUM_DEVICE_INTERRUPTS {
            // Unwrap okay, valid index.
            self.nvic
                .write_ip(idx, LOWEST_PRIORITY.value() << PRIORITY_SHIFT)
                .unwrap();
        }
    }

    /// Enable the IRQ exception of the Cortex-M core by calling [cortex_m::interrupt::enable].
    ///
    /// # Safety
    ///
    /// Do not call this in a critical section.
    pub unsafe fn enable_interrupts(&self) {
        unsafe {
            cortex_m::interrupt::enable();
        }
    }

    /// Disable the IRQ exception of the Cortex-M core by calling
    /// [cortex_m::interrupt::disable].
    pub fn disable_interrupts(&self) {
        cortex_m::interrupt::disable();
    }

    /// Request a system level reset.
    ///
    /// All outstanding memory accesses are completed by an explicit barrier before the request
    /// is issued and before the processor stalls waiting for it to take effect. This function
    /// never returns.
    pub fn system_reset(&mut self) -> ! {
        log::debug!("issuing system reset request");
        cortex_m::asm::dsb();
        let previous = self.scb.read_aircr();
        self.scb.write_aircr(reset_request(previous));
        cortex_m::asm::dsb();
        loop {
            cortex_m::asm::nop();
        }
    }
}
