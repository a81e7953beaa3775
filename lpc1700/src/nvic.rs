//! # NVIC (Nested Vectored Interrupt Controller) register module.
use static_assertions::const_assert_eq;

pub const NVIC_BASE_ADDR: usize = super::SCS_BASE_ADDR + 0x100;

/// Number of 32-bit banks in each of the enable, pending and active register arrays.
///
/// A source with number N lives in bank `N / 32`, bit `N % 32`.
pub const NUM_BANKS: usize = 8;
/// Number of per-source priority bytes.
pub const NUM_PRIO_BYTES: usize = 240;

/// NVIC registers.
///
/// The enable, pending and active state of up to 256 device interrupt sources is packed into
/// arrays of 32-bit banks. Enable and pending state is split into separate write-one-to-set and
/// write-one-to-clear banks, so a single source can be updated without a read-modify-write cycle
/// on the shared word.
#[derive(derive_mmio::Mmio)]
#[repr(C)]
pub struct Nvic {
    /// Interrupt Set-Enable Registers.
    pub iser: [u32; NUM_BANKS],
    _reserved_0: [u32; 24],
    /// Interrupt Clear-Enable Registers.
    pub icer: [u32; NUM_BANKS],
    _reserved_1: [u32; 24],
    /// Interrupt Set-Pending Registers.
    pub ispr: [u32; NUM_BANKS],
    _reserved_2: [u32; 24],
    /// Interrupt Clear-Pending Registers.
    pub icpr: [u32; NUM_BANKS],
    _reserved_3: [u32; 24],
    /// Interrupt Active Bit Registers.
    // TODO: Mark read-only as soon as that works for arrays.
    pub iabr: [u32; NUM_BANKS],
    _reserved_4: [u32; 56],
    /// Interrupt Priority Registers, one byte per device interrupt source.
    ///
    /// Only the upper implemented priority bits of each byte are writable in hardware, the
    /// low bits always read as zero.
    pub ip: [u8; NUM_PRIO_BYTES],
    _reserved_5: [u32; 644],
    /// Software Trigger Interrupt Register.
    pub stir: u32,
}

const_assert_eq!(core::mem::size_of::<Nvic>(), 0xE04);

impl Nvic {
    /// Create a new NVIC MMIO instance at the fixed address of the system control space.
    ///
    /// # Safety
    ///
    /// This API can be used to potentially create a driver to the same peripheral structure
    /// from multiple threads. The user must ensure that concurrent accesses are safe and do not
    /// interfere with each other.
    #[inline]
    pub const unsafe fn new_mmio_fixed() -> MmioNvic<'static> {
        unsafe { Self::new_mmio_at(NVIC_BASE_ADDR) }
    }
}
