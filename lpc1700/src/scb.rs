//! # SCB (System Control Block) register module.
use arbitrary_int::u3;
use static_assertions::const_assert_eq;

pub const SCB_BASE_ADDR: usize = super::SCS_BASE_ADDR + 0xD00;

/// Key which must be written to the upper half of [Aircr] for the write to take effect.
///
/// Reads of the register return 0xFA05 in that field instead.
pub const VECTKEY: u16 = 0x05FA;

/// Application Interrupt and Reset Control Register.
#[bitbybit::bitfield(u32, debug)]
pub struct Aircr {
    /// Write-protection key field. Writes are ignored unless this holds [VECTKEY].
    #[bits(16..=31, rw)]
    vectkey: u16,
    #[bit(15, r)]
    big_endian: bool,
    /// Priority grouping position. Must be preserved across reset requests.
    #[bits(8..=10, rw)]
    prigroup: u3,
    /// Asserting this bit requests a system level reset.
    #[bit(2, rw)]
    sysresetreq: bool,
    #[bit(1, rw)]
    vectclractive: bool,
    #[bit(0, rw)]
    vectreset: bool,
}

/// System Control Block registers.
///
/// Only the subset relevant for interrupt priority handling and reset control is given
/// dedicated field types, the remaining words are kept as raw registers.
#[derive(derive_mmio::Mmio)]
#[repr(C)]
pub struct Scb {
    /// CPUID Base Register.
    #[mmio(PureRead)]
    pub cpuid: u32,
    /// Interrupt Control and State Register.
    pub icsr: u32,
    /// Vector Table Offset Register.
    pub vtor: u32,
    /// Application Interrupt and Reset Control Register.
    pub aircr: Aircr,
    /// System Control Register.
    pub scr: u32,
    /// Configuration and Control Register.
    pub ccr: u32,
    /// System Handler Priority Registers, one byte per priority-capable core exception.
    pub shp: [u8; 12],
    /// System Handler Control and State Register.
    pub shcsr: u32,
    /// Configurable Fault Status Register.
    pub cfsr: u32,
    /// HardFault Status Register.
    pub hfsr: u32,
    /// Debug Fault Status Register.
    pub dfsr: u32,
    /// MemManage Fault Address Register.
    pub mmfar: u32,
    /// BusFault Address Register.
    pub bfar: u32,
    /// Auxiliary Fault Status Register.
    pub afsr: u32,
}

const_assert_eq!(core::mem::size_of::<Scb>(), 0x40);

impl Scb {
    /// Create a new SCB MMIO instance at the fixed address of the system control space.
    ///
    /// # Safety
    ///
    /// This API can be used to potentially create a driver to the same peripheral structure
    /// from multiple threads. The user must ensure that concurrent accesses are safe and do not
    /// interfere with each other.
    #[inline]
    pub const unsafe fn new_mmio_fixed() -> MmioScb<'static> {
        unsafe { Self::new_mmio_at(SCB_BASE_ADDR) }
    }
}
