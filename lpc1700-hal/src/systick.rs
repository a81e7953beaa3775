//! # System tick timer module
//!
//! The [SysTick] driver programs the 24-bit countdown register which asserts the SysTick core
//! exception on every wrap. The counter can run from the processor clock or from the external
//! STCLK reference.
use arbitrary_int::u24;

use lpc1700::systick::{ClockSource, MAX_RELOAD, MmioSysTick};

use crate::nvic::{Exception, InterruptController, IrqSource, LOWEST_PRIORITY};
use crate::time::{Hertz, Milliseconds};

/// The requested tick count does not fit the 24-bit countdown register or is zero.
#[derive(Debug, thiserror::Error)]
#[error("invalid reload value {0}, valid range is [1, 2^24 - 1]")]
pub struct InvalidReloadValue(pub u64);

/// High-level system tick timer driver.
pub struct SysTick {
    regs: MmioSysTick<'static>,
}

impl SysTick {
    /// Create a peripheral driver from the MMIO SysTick block.
    #[inline]
    pub const fn new(regs: MmioSysTick<'static>) -> Self {
        Self { regs }
    }

    /// Create the driver with the fixed MMIO instance.
    ///
    /// # Safety
    ///
    /// This circumvents ownership checks. It is mainly intended to be used inside interrupt
    /// handlers.
    #[inline]
    pub unsafe fn steal() -> Self {
        Self {
            regs: unsafe { lpc1700::systick::SysTick::new_mmio_fixed() },
        }
    }

    /// Configure and start the timer from the processor core clock.
    ///
    /// `ticks` is the number of clock cycles between two interrupts. The timer counts down
    /// through zero, so the reload register is programmed with `ticks - 1`. The current value
    /// is zeroed, the priority of the SysTick exception is set to the least urgent value and
    /// both counting and interrupt generation are enabled.
    ///
    /// An out of range tick count is rejected without touching any register.
    pub fn configure(
        &mut self,
        ticks: u32,
        irq_ctrl: &mut InterruptController,
    ) -> Result<(), InvalidReloadValue> {
        self.program(ticks as u64, ClockSource::Core, irq_ctrl)
    }

    /// Configure and start the timer from the processor core clock for a given period.
    pub fn configure_internal(
        &mut self,
        core_clock: Hertz,
        period: Milliseconds,
        irq_ctrl: &mut InterruptController,
    ) -> Result<(), InvalidReloadValue> {
        let ticks = (core_clock.raw() as u64 / 1000) * period.ticks() as u64;
        self.program(ticks, ClockSource::Core, irq_ctrl)
    }

    /// Configure and start the timer from the external STCLK reference clock.
    ///
    /// The tick count is computed from the reference clock frequency and the requested
    /// interrupt period.
    pub fn configure_external(
        &mut self,
        reference_clock: Hertz,
        period: Milliseconds,
        irq_ctrl: &mut InterruptController,
    ) -> Result<(), InvalidReloadValue> {
        let ticks = (reference_clock.raw() as u64 / 1000) * period.ticks() as u64;
        self.program(ticks, ClockSource::External, irq_ctrl)
    }

    fn program(
        &mut self,
        ticks: u64,
        clock_source: ClockSource,
        irq_ctrl: &mut InterruptController,
    ) -> Result<(), InvalidReloadValue> {
        if ticks == 0 || ticks > MAX_RELOAD as u64 {
            return Err(InvalidReloadValue(ticks));
        }
        log::debug!("starting system tick timer with a period of {} ticks", ticks);
        self.regs.modify_rvr(|mut reload| {
            reload.set_value(u24::new(ticks as u32 - 1));
            reload
        });
        // The priority slot of the SysTick exception always exists.
        irq_ctrl
            .set_priority(IrqSource::Core(Exception::SysTick), LOWEST_PRIORITY)
            .unwrap();
        // Any write clears the counter, the reload value is taken over on the next cycle.
        self.regs.modify_cvr(|mut current| {
            current.set_value(u24::new(0));
            current
        });
        self.regs.modify_csr(|mut csr| {
            csr.set_clock_source(clock_source);
            csr.set_tick_interrupt(true);
            csr.set_enable(true);
            csr
        });
        Ok(())
    }

    /// Gate the counter on or off without touching the rest of the configuration.
    #[inline]
    pub fn set_enabled(&mut self, enabled: bool) {
        self.regs.modify_csr(|mut csr| {
            csr.set_enable(enabled);
            csr
        });
    }

    /// Gate interrupt generation on wrap on or off.
    #[inline]
    pub fn set_interrupt_enabled(&mut self, enabled: bool) {
        self.regs.modify_csr(|mut csr| {
            csr.set_tick_interrupt(enabled);
            csr
        });
    }

    /// Raw read of the countdown register.
    #[inline]
    pub fn current_value(&self) -> u32 {
        self.regs.read_cvr().value().value()
    }

    /// Read the latched wrap indicator.
    #[inline]
    pub fn count_flag(&self) -> bool {
        self.regs.read_csr().count_flag()
    }

    /// Clear the latched wrap indicator.
    #[inline]
    pub fn clear_count_flag(&mut self) {
        self.regs.modify_csr(|mut csr| {
            csr.set_count_flag(false);
            csr
        });
    }
}

/// Polled delay provider running the timer from the core clock.
///
/// The tick rate is derived from the calibration register, which encodes a 10 ms period of
/// the core clock. A device which does not provide a calibration value reads 0 there, in
/// which case no delay can be derived and this implementation panics.
impl embedded_hal::delay::DelayNs for SysTick {
    fn delay_ns(&mut self, ns: u32) {
        // Take over the timer for a polled delay. 24 bits per chunk keeps the math within the
        // counter width for any core clock the family supports.
        self.regs.modify_csr(|mut csr| {
            csr.set_enable(false);
            csr.set_tick_interrupt(false);
            csr.set_clock_source(ClockSource::Core);
            csr
        });
        let ticks_per_ms = self.regs.read_calib().tenms().value() as u64 / 10;
        assert!(
            ticks_per_ms > 0,
            "calibration value is unknown, the delay tick rate can not be derived"
        );
        let mut remaining = (ns as u64 * ticks_per_ms) / 1_000_000;
        while remaining > 0 {
            let chunk = remaining.min(MAX_RELOAD as u64 - 1) as u32;
            self.regs.modify_rvr(|mut reload| {
                reload.set_value(u24::new(chunk));
                reload
            });
            self.regs.modify_cvr(|mut current| {
                current.set_value(u24::new(0));
                current
            });
            self.clear_count_flag();
            self.set_enabled(true);
            while !self.count_flag() {}
            self.set_enabled(false);
            remaining -= chunk as u64;
        }
    }
}
