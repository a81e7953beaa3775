//! # PAC for the core peripherals of the NXP LPC1700 MCU family
//!
//! This crate models the memory-mapped register blocks of the Cortex-M3 system control space
//! (NVIC, SCB, SysTick) and the LPC1700 general purpose DMA controller. The register structures
//! are bit-exact renditions of the hardware layout, so all offsets are checked with compile-time
//! size assertions.
//!
//! The generated `Mmio` wrappers perform volatile accesses through a raw base pointer. They can
//! be pointed at the fixed peripheral addresses via the `new_mmio_fixed` constructors, or at any
//! other address (for example a RAM-backed register block in host tests) via `new_mmio_at`.
#![no_std]

use core::sync::atomic::{AtomicBool, Ordering};

pub mod gpdma;
pub mod nvic;
pub mod scb;
pub mod systick;

/// System Control Space base address of the Cortex-M3 core.
pub const SCS_BASE_ADDR: usize = 0xE000_E000;

static PERIPHERALS_TAKEN: AtomicBool = AtomicBool::new(false);

/// Singleton structure owning the MMIO handles for all modeled peripheral blocks.
pub struct Peripherals {
    pub nvic: nvic::MmioNvic<'static>,
    pub scb: scb::MmioScb<'static>,
    pub systick: systick::MmioSysTick<'static>,
    pub gpdma: gpdma::MmioGpdma<'static>,
}

impl Peripherals {
    /// Take the peripherals singleton.
    ///
    /// This returns [None] on every call after the first one.
    pub fn take() -> Option<Self> {
        if PERIPHERALS_TAKEN.swap(true, Ordering::SeqCst) {
            return None;
        }
        Some(unsafe { Self::steal() })
    }

    /// Create the peripherals structure, circumventing the singleton check.
    ///
    /// # Safety
    ///
    /// This API can be used to create multiple driver handles to the same peripheral blocks.
    /// The user must ensure that concurrent accesses are safe and do not interfere with each
    /// other.
    pub unsafe fn steal() -> Self {
        unsafe {
            Self {
                nvic: nvic::Nvic::new_mmio_fixed(),
                scb: scb::Scb::new_mmio_fixed(),
                systick: systick::SysTick::new_mmio_fixed(),
                gpdma: gpdma::Gpdma::new_mmio_fixed(),
            }
        }
    }
}
