//! # System tick timer register module.
use arbitrary_int::u24;
use static_assertions::const_assert_eq;

pub const SYSTICK_BASE_ADDR: usize = super::SCS_BASE_ADDR + 0x10;

/// Maximum reload value of the 24-bit countdown register.
pub const MAX_RELOAD: u32 = 0x00FF_FFFF;

/// Clock source feeding the countdown register.
#[bitbybit::bitenum(u1, exhaustive = true)]
#[derive(Debug, PartialEq, Eq)]
pub enum ClockSource {
    /// External reference clock (STCLK).
    External = 0,
    /// Processor core clock.
    Core = 1,
}

/// Control and Status Register.
#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct ControlAndStatus {
    /// Latched when the counter wraps through zero. Cleared by software.
    #[bit(16, rw)]
    count_flag: bool,
    #[bit(2, rw)]
    clock_source: ClockSource,
    /// Assert the SysTick exception on wrap.
    #[bit(1, rw)]
    tick_interrupt: bool,
    #[bit(0, rw)]
    enable: bool,
}

/// Reload Value Register.
#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct ReloadValue {
    #[bits(0..=23, rw)]
    value: u24,
}

/// Current Value Register. Any write clears the counter.
#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct CurrentValue {
    #[bits(0..=23, rw)]
    value: u24,
}

/// Calibration Value Register.
#[bitbybit::bitfield(u32, debug)]
pub struct Calibration {
    /// Set if no external reference clock is provided.
    #[bit(31, r)]
    noref: bool,
    /// Set if the 10 ms calibration value is inexact.
    #[bit(30, r)]
    skew: bool,
    /// Reload value yielding a 10 ms period, or 0 if unknown.
    #[bits(0..=23, r)]
    tenms: u24,
}

/// System tick timer registers.
#[derive(derive_mmio::Mmio)]
#[repr(C)]
pub struct SysTick {
    /// Control and Status Register.
    pub csr: ControlAndStatus,
    /// Reload Value Register.
    pub rvr: ReloadValue,
    /// Current Value Register.
    pub cvr: CurrentValue,
    /// Calibration Value Register.
    #[mmio(PureRead)]
    pub calib: Calibration,
}

const_assert_eq!(core::mem::size_of::<SysTick>(), 0x10);

impl SysTick {
    /// Create a new SysTick MMIO instance at the fixed address of the system control space.
    ///
    /// # Safety
    ///
    /// This API can be used to potentially create a driver to the same peripheral structure
    /// from multiple threads. The user must ensure that concurrent accesses are safe and do not
    /// interfere with each other.
    #[inline]
    pub const unsafe fn new_mmio_fixed() -> MmioSysTick<'static> {
        unsafe { Self::new_mmio_at(SYSTICK_BASE_ADDR) }
    }
}
