//! # HAL for the core peripherals of the NXP LPC1700 MCU family
//!
//! This crate is an additional hardware abstraction on top of the [lpc1700] peripheral access
//! API. It is the result of reading the datasheet for the device and encoding a type-safe layer
//! over the raw PAC. The drivers own the MMIO handles of their register blocks, so tests can
//! hand in handles which point at RAM-backed register blocks instead of the real peripherals.
//!
//! The following drivers are provided:
//!
//! - [nvic::InterruptController]: interrupt enable, pending, active and priority handling for
//!   the device interrupt sources and the priority-capable core exceptions.
//! - [systick::SysTick]: the system tick countdown timer.
//! - [gpdma::Gpdma]: the eight channel general purpose DMA controller, including memory
//!   resident linked list descriptor chains.
#![no_std]

pub mod gpdma;
pub mod nvic;
pub mod prelude;
pub mod systick;
pub mod time;

pub use lpc1700 as pac;

#[cfg(test)]
pub(crate) mod test_support;

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("peripheral singleton was already taken")]
    PeripheralsAlreadyTaken,
}

/// Utility function to take the peripherals and bring up the drivers of this crate in one go.
///
/// The interrupt controller is left with all device sources disabled and the GPDMA controller
/// is enabled with all latched channel flags discarded.
pub fn init() -> Result<(nvic::InterruptController, systick::SysTick, gpdma::Gpdma), InitError> {
    let periphs = lpc1700::Peripherals::take().ok_or(InitError::PeripheralsAlreadyTaken)?;
    let mut irq_ctrl = nvic::InterruptController::new(periphs.nvic, periphs.scb);
    irq_ctrl.deinit();
    let systick = systick::SysTick::new(periphs.systick);
    let mut dma = gpdma::Gpdma::new(periphs.gpdma);
    dma.init();
    Ok((irq_ctrl, systick, dma))
}
