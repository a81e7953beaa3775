//! Support code for driving the drivers against RAM-backed register blocks.
//!
//! The MMIO handles of the PAC can be pointed at any address, so the tests place zeroed
//! register blocks in heap memory. Plain memory does not replicate the write-one-to-set and
//! write-one-to-clear coupling between the hardware banks, the small models in this module
//! apply that coupling explicitly. Tests call `settle` after every driver operation, mirroring
//! what the hardware does immediately on the register write.
use core::mem::MaybeUninit;

use lpc1700::gpdma::{MmioChannel, MmioGpdma, NUM_CHANNELS};
use lpc1700::nvic::{MmioNvic, NUM_BANKS};

/// Zeroed instance of a PAC register block.
///
/// All blocks consist of plain integers and bitfield wrappers over them, so the all-zero bit
/// pattern is a valid value.
pub fn zeroed<T>() -> T {
    unsafe { MaybeUninit::zeroed().assume_init() }
}

/// Model of the NVIC bank coupling.
///
/// The shadow words accumulate the write-one-to-set semantics of the enable and pending banks
/// across multiple driver writes, the clear banks are folded in and reset on every settle.
pub struct NvicModel {
    enabled: [u32; NUM_BANKS],
    pending: [u32; NUM_BANKS],
}

impl NvicModel {
    pub fn new() -> Self {
        Self {
            enabled: [0; NUM_BANKS],
            pending: [0; NUM_BANKS],
        }
    }

    pub fn settle(&mut self, nvic: &mut MmioNvic<'_>) {
        for bank in 0..NUM_BANKS {
            self.enabled[bank] |= nvic.read_iser(bank).unwrap();
            self.enabled[bank] &= !nvic.read_icer(bank).unwrap();
            nvic.write_icer(bank, 0).unwrap();
            nvic.write_iser(bank, self.enabled[bank]).unwrap();

            self.pending[bank] |= nvic.read_ispr(bank).unwrap();
            self.pending[bank] &= !nvic.read_icpr(bank).unwrap();
            nvic.write_icpr(bank, 0).unwrap();
            nvic.write_ispr(bank, self.pending[bank]).unwrap();
        }
    }
}

/// Access the register block of a channel by index.
pub fn channel_block<'a>(regs: &'a mut MmioGpdma<'_>, index: usize) -> MmioChannel<'a> {
    match index {
        0 => regs.ch0(),
        1 => regs.ch1(),
        2 => regs.ch2(),
        3 => regs.ch3(),
        4 => regs.ch4(),
        5 => regs.ch5(),
        6 => regs.ch6(),
        7 => regs.ch7(),
        _ => panic!("invalid channel index {index}"),
    }
}

/// Model of the GPDMA status surface.
///
/// The unmasked flag shadows are latched by [Self::complete_channel] and
/// [Self::fail_channel] and released by the write-one-to-clear registers. The masked views
/// and the enabled channel summary are derived from the shadows and the per-channel
/// configuration words on every settle.
pub struct GpdmaModel {
    raw_tc: u32,
    raw_err: u32,
}

impl GpdmaModel {
    pub fn new() -> Self {
        Self {
            raw_tc: 0,
            raw_err: 0,
        }
    }

    pub fn settle(&mut self, regs: &mut MmioGpdma<'_>) {
        self.raw_tc &= !regs.read_int_tc_clear();
        regs.write_int_tc_clear(0);
        self.raw_err &= !regs.read_int_err_clr();
        regs.write_int_err_clr(0);

        let mut enabled = 0;
        let mut tc_unmasked = 0;
        let mut err_unmasked = 0;
        for index in 0..NUM_CHANNELS {
            let config = channel_block(regs, index).read_config();
            if config.enable() {
                enabled |= 1 << index;
            }
            if config.tc_interrupt_unmask() {
                tc_unmasked |= 1 << index;
            }
            if config.err_interrupt_unmask() {
                err_unmasked |= 1 << index;
            }
        }
        regs.write_enbld_chns(enabled);
        regs.write_raw_int_tc_stat(self.raw_tc);
        regs.write_raw_int_err_stat(self.raw_err);
        let tc_masked = self.raw_tc & tc_unmasked;
        let err_masked = self.raw_err & err_unmasked;
        regs.write_int_tc_stat(tc_masked);
        regs.write_int_err_stat(err_masked);
        regs.write_int_stat(tc_masked | err_masked);
    }

    /// Latch the terminal count of a channel and auto-disable it, the hardware behavior when
    /// a transfer or a descriptor chain completes.
    pub fn complete_channel(&mut self, regs: &mut MmioGpdma<'_>, index: usize) {
        self.raw_tc |= 1 << index;
        channel_block(regs, index).modify_config(|mut config| {
            config.set_enable(false);
            config
        });
        self.settle(regs);
    }

    /// Latch the error flag of a channel and auto-disable it.
    pub fn fail_channel(&mut self, regs: &mut MmioGpdma<'_>, index: usize) {
        self.raw_err |= 1 << index;
        channel_block(regs, index).modify_config(|mut config| {
            config.set_enable(false);
            config
        });
        self.settle(regs);
    }
}
