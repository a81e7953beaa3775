//! # General purpose DMA controller module
//!
//! The [Gpdma] driver manages the eight transfer channels of the controller. A channel is
//! programmed once with [Gpdma::setup] and gated on with [Gpdma::set_enabled]. Completion and
//! error state is latched per channel in the status surface of the controller and stays
//! asserted until it is explicitly acknowledged with [Gpdma::clear_interrupt]. An
//! unacknowledged flag keeps the aggregate interrupt line high, so a completion can not be
//! lost between handler invocations.
//!
//! Chained transfers are described by memory resident linked list descriptors, see the [lli]
//! module.
pub mod lli;

use arbitrary_int::{Number, u5, u12};

use lpc1700::gpdma::{
    BurstSize, ChannelControl, ChannelConfig as ChannelConfigReg, MmioChannel, MmioGpdma,
    TransferType, TransferWidth,
};

/// Channel bit mask covering all eight channels.
const ALL_CHANNELS_MASK: u32 = 0xFF;

/// DMA channel identifier.
///
/// Channel 0 has the highest bus arbitration priority and channel 7 the lowest. The priority
/// is fixed by the channel number and not separately configurable.
#[derive(Debug, Eq, PartialEq, Clone, Copy, num_enum::TryFromPrimitive, num_enum::IntoPrimitive)]
#[repr(u8)]
pub enum Channel {
    Ch0 = 0,
    Ch1 = 1,
    Ch2 = 2,
    Ch3 = 3,
    Ch4 = 4,
    Ch5 = 5,
    Ch6 = 6,
    Ch7 = 7,
}

impl Channel {
    #[inline]
    pub const fn mask(self) -> u32 {
        1 << self as u32
    }
}

/// Peripheral request lines of the DMA request multiplexer.
///
/// Request lines 8 to 15 are shared between the UARTs and the timer match outputs, the system
/// control block selects which of the two is routed. This driver addresses them by their UART
/// function.
#[derive(Debug, Eq, PartialEq, Clone, Copy, num_enum::TryFromPrimitive, num_enum::IntoPrimitive)]
#[repr(u8)]
pub enum RequestLine {
    Ssp0Tx = 0,
    Ssp0Rx = 1,
    Ssp1Tx = 2,
    Ssp1Rx = 3,
    Adc = 4,
    I2sChannel0 = 5,
    I2sChannel1 = 6,
    Dac = 7,
    Uart0Tx = 8,
    Uart0Rx = 9,
    Uart1Tx = 10,
    Uart1Rx = 11,
    Uart2Tx = 12,
    Uart2Rx = 13,
    Uart3Tx = 14,
    Uart3Rx = 15,
}

impl RequestLine {
    /// Data register address of the peripheral behind this request line.
    pub const fn register_address(self) -> u32 {
        match self {
            RequestLine::Ssp0Tx | RequestLine::Ssp0Rx => 0x4008_8008,
            RequestLine::Ssp1Tx | RequestLine::Ssp1Rx => 0x4003_0008,
            RequestLine::Adc => 0x4003_4004,
            RequestLine::I2sChannel0 => 0x400A_8008,
            RequestLine::I2sChannel1 => 0x400A_800C,
            RequestLine::Dac => 0x4008_C000,
            RequestLine::Uart0Tx | RequestLine::Uart0Rx => 0x4000_C000,
            RequestLine::Uart1Tx | RequestLine::Uart1Rx => 0x4001_0000,
            RequestLine::Uart2Tx | RequestLine::Uart2Rx => 0x4009_8000,
            RequestLine::Uart3Tx | RequestLine::Uart3Rx => 0x4009_C000,
        }
    }

    /// Burst size matching the FIFO depth of the peripheral behind this request line.
    pub const fn burst_size(self) -> BurstSize {
        match self {
            RequestLine::Ssp0Tx
            | RequestLine::Ssp0Rx
            | RequestLine::Ssp1Tx
            | RequestLine::Ssp1Rx
            | RequestLine::Adc
            | RequestLine::I2sChannel0
            | RequestLine::I2sChannel1 => BurstSize::Four,
            _ => BurstSize::Single,
        }
    }

    /// Transfer unit width of the peripheral data register.
    pub const fn width(self) -> TransferWidth {
        match self {
            RequestLine::Adc
            | RequestLine::I2sChannel0
            | RequestLine::I2sChannel1
            | RequestLine::Dac => TransferWidth::Word,
            _ => TransferWidth::Byte,
        }
    }
}

/// Transfer topology together with the addressing information relevant for it.
///
/// An end of the transfer which is a peripheral is named by its [RequestLine], the data
/// register address, burst size and width for it come from the request line lookup. An end
/// which is memory carries its address directly. This makes it impossible to pass an address
/// for a peripheral end or a request line for a memory end.
#[derive(Debug, Clone, Copy)]
pub enum TransferKind {
    /// Memory to memory transfer. The transfer unit width applies to both sides.
    MemoryToMemory {
        src: u32,
        dst: u32,
        width: TransferWidth,
    },
    MemoryToPeripheral { src: u32, dst: RequestLine },
    PeripheralToMemory { src: RequestLine, dst: u32 },
    PeripheralToPeripheral { src: RequestLine, dst: RequestLine },
}

impl TransferKind {
    pub const fn transfer_type(&self) -> TransferType {
        match self {
            TransferKind::MemoryToMemory { .. } => TransferType::MemoryToMemory,
            TransferKind::MemoryToPeripheral { .. } => TransferType::MemoryToPeripheral,
            TransferKind::PeripheralToMemory { .. } => TransferType::PeripheralToMemory,
            TransferKind::PeripheralToPeripheral { .. } => TransferType::PeripheralToPeripheral,
        }
    }
}

/// Channel setup parameters for [Gpdma::setup].
#[derive(Debug, Clone, Copy)]
pub struct TransferConfig {
    pub channel: Channel,
    /// Number of transfer units.
    pub transfer_size: u32,
    pub kind: TransferKind,
    /// Address of the first linked list descriptor of a chained transfer, or 0 for a
    /// single-shot transfer described by the channel registers alone.
    pub linked_list: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    /// The channel is currently enabled. It must be disabled before it can be reconfigured.
    #[error("channel {0:?} is currently enabled")]
    ChannelEnabled(Channel),
    #[error("transfer size {0} exceeds the 12-bit hardware limit")]
    TransferSizeTooLarge(u32),
}

/// Status views of the interrupt surface, addressed per channel.
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub enum StatusKind {
    /// Combined masked terminal count and error interrupt.
    Interrupt,
    /// Masked terminal count interrupt.
    TerminalCount,
    /// Masked error interrupt.
    Error,
    /// Unmasked terminal count status.
    RawTerminalCount,
    /// Unmasked error status.
    RawError,
    /// Channel enable bit as seen by the controller.
    EnabledChannel,
}

/// Latched flags which software can acknowledge.
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub enum ClearKind {
    TerminalCount,
    Error,
}

/// High-level GPDMA controller driver.
pub struct Gpdma {
    pub regs: MmioGpdma<'static>,
}

impl Gpdma {
    /// Create the driver from the MMIO handle of the controller block.
    #[inline]
    pub const fn new(regs: MmioGpdma<'static>) -> Self {
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
            regs: unsafe { lpc1700::gpdma::Gpdma::new_mmio_fixed() },
        }
    }

    /// Enable the controller and discard any latched per-channel flags.
    pub fn init(&mut self) {
        log::debug!("enabling GPDMA controller");
        self.regs.modify_config(|mut config| {
            config.set_enable(true);
            config
        });
        self.regs.write_int_tc_clear(ALL_CHANNELS_MASK);
        self.regs.write_int_err_clr(ALL_CHANNELS_MASK);
    }

    fn channel_regs(&mut self, channel: Channel) -> MmioChannel<'_> {
        match channel {
            Channel::Ch0 => self.regs.ch0(),
            Channel::Ch1 => self.regs.ch1(),
            Channel::Ch2 => self.regs.ch2(),
            Channel::Ch3 => self.regs.ch3(),
            Channel::Ch4 => self.regs.ch4(),
            Channel::Ch5 => self.regs.ch5(),
            Channel::Ch6 => self.regs.ch6(),
            Channel::Ch7 => self.regs.ch7(),
        }
    }

    /// Program a channel.
    ///
    /// The channel is not started by this call, [Self::set_enabled] gates it on once the
    /// transfer memory is in place. A channel which is currently enabled is rejected without
    /// touching any of its registers, it has to be disabled first.
    pub fn setup(&mut self, config: &TransferConfig) -> Result<(), SetupError> {
        if self.regs.read_enbld_chns() & config.channel.mask() != 0 {
            return Err(SetupError::ChannelEnabled(config.channel));
        }
        if config.transfer_size > u12::MAX.value() as u32 {
            return Err(SetupError::TransferSizeTooLarge(config.transfer_size));
        }
        log::debug!(
            "setting up DMA channel {:?} for {:?}",
            config.channel,
            config.kind
        );
        // Acknowledge stale latched flags of this channel before it is reprogrammed.
        self.regs.write_int_tc_clear(config.channel.mask());
        self.regs.write_int_err_clr(config.channel.mask());

        let mut control = ChannelControl::new_with_raw_value(0);
        control.set_transfer_size(u12::new(config.transfer_size as u16));
        control.set_tc_interrupt(true);
        let mut src_line = u5::new(0);
        let mut dst_line = u5::new(0);
        let (src_addr, dest_addr) = match config.kind {
            TransferKind::MemoryToMemory { src, dst, width } => {
                control.set_src_burst_size(BurstSize::ThirtyTwo);
                control.set_dst_burst_size(BurstSize::ThirtyTwo);
                control.set_src_width(width);
                control.set_dst_width(width);
                control.set_src_increment(true);
                control.set_dst_increment(true);
                (src, dst)
            }
            TransferKind::MemoryToPeripheral { src, dst } => {
                control.set_src_burst_size(dst.burst_size());
                control.set_dst_burst_size(dst.burst_size());
                control.set_src_width(dst.width());
                control.set_dst_width(dst.width());
                control.set_src_increment(true);
                dst_line = u5::new(u8::from(dst));
                (src, dst.register_address())
            }
            TransferKind::PeripheralToMemory { src, dst } => {
                control.set_src_burst_size(src.burst_size());
                control.set_dst_burst_size(src.burst_size());
                control.set_src_width(src.width());
                control.set_dst_width(src.width());
                control.set_dst_increment(true);
                src_line = u5::new(u8::from(src));
                (src.register_address(), dst)
            }
            TransferKind::PeripheralToPeripheral { src, dst } => {
                control.set_src_burst_size(src.burst_size());
                control.set_dst_burst_size(dst.burst_size());
                control.set_src_width(src.width());
                control.set_dst_width(dst.width());
                src_line = u5::new(u8::from(src));
                dst_line = u5::new(u8::from(dst));
                (src.register_address(), dst.register_address())
            }
        };

        let transfer_type = config.kind.transfer_type();
        let linked_list = config.linked_list;
        let mut channel_regs = self.channel_regs(config.channel);
        channel_regs.write_src_addr(src_addr);
        channel_regs.write_dest_addr(dest_addr);
        channel_regs.write_lli(linked_list);
        channel_regs.write_control(control);
        let mut channel_config = ChannelConfigReg::new_with_raw_value(0);
        channel_config.set_transfer_type(transfer_type);
        channel_config.set_src_peripheral(src_line);
        channel_config.set_dest_peripheral(dst_line);
        channel_config.set_tc_interrupt_unmask(true);
        channel_config.set_err_interrupt_unmask(true);
        channel_regs.write_config(channel_config);
        Ok(())
    }

    /// Gate a channel on or off.
    ///
    /// Enabling a channel with a non-zero linked list head makes the hardware advance through
    /// the descriptor chain until it reaches a zero next pointer. The channel disables itself
    /// when the transfer or chain completes.
    ///
    /// Disabling a live channel cancels it immediately. Data already moved stays where it is,
    /// there is no accounting of how much of the transfer completed.
    pub fn set_enabled(&mut self, channel: Channel, enabled: bool) {
        self.channel_regs(channel).modify_config(|mut config| {
            config.set_enable(enabled);
            config
        });
    }

    /// Read the enable bit of a channel from the controller summary register.
    #[inline]
    pub fn is_enabled(&self, channel: Channel) -> bool {
        self.regs.read_enbld_chns() & channel.mask() != 0
    }

    /// Read one per-channel bit of the status surface.
    ///
    /// Pure read, latched flags are not affected.
    pub fn status(&self, kind: StatusKind, channel: Channel) -> bool {
        let word = match kind {
            StatusKind::Interrupt => self.regs.read_int_stat(),
            StatusKind::TerminalCount => self.regs.read_int_tc_stat(),
            StatusKind::Error => self.regs.read_int_err_stat(),
            StatusKind::RawTerminalCount => self.regs.read_raw_int_tc_stat(),
            StatusKind::RawError => self.regs.read_raw_int_err_stat(),
            StatusKind::EnabledChannel => self.regs.read_enbld_chns(),
        };
        word & channel.mask() != 0
    }

    /// Acknowledge a latched flag of one channel.
    pub fn clear_interrupt(&mut self, kind: ClearKind, channel: Channel) {
        match kind {
            ClearKind::TerminalCount => self.regs.write_int_tc_clear(channel.mask()),
            ClearKind::Error => self.regs.write_int_err_clr(channel.mask()),
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::gpdma::lli::DescriptorTable;
    use crate::test_support::{GpdmaModel, channel_block, zeroed};
    use lpc1700::gpdma::Gpdma as GpdmaRegs;
    use std::boxed::Box;

    fn harness() -> (Gpdma, GpdmaModel) {
        let block: &'static mut GpdmaRegs = Box::leak(Box::new(zeroed()));
        let addr = core::ptr::from_mut(block) as usize;
        let mut dma = Gpdma::new(unsafe { GpdmaRegs::new_mmio_at(addr) });
        dma.init();
        let mut model = GpdmaModel::new();
        model.settle(&mut dma.regs);
        (dma, model)
    }

    fn m2m_config(channel: Channel, size: u32) -> TransferConfig {
        TransferConfig {
            channel,
            transfer_size: size,
            kind: TransferKind::MemoryToMemory {
                src: 0x1000_0000,
                dst: 0x1000_1000,
                width: TransferWidth::Word,
            },
            linked_list: 0,
        }
    }

    #[test]
    fn init_enables_the_controller() {
        let (dma, _) = harness();
        assert!(dma.regs.read_config().enable());
    }

    #[test]
    fn m2m_setup_programs_the_channel() {
        let (mut dma, _) = harness();
        dma.setup(&m2m_config(Channel::Ch3, 16)).unwrap();
        let regs = dma.channel_regs(Channel::Ch3);
        assert_eq!(regs.read_src_addr(), 0x1000_0000);
        assert_eq!(regs.read_dest_addr(), 0x1000_1000);
        assert_eq!(regs.read_lli(), 0);
        let control = regs.read_control();
        assert_eq!(control.transfer_size().value(), 16);
        assert_eq!(control.src_burst_size(), BurstSize::ThirtyTwo);
        assert_eq!(control.dst_burst_size(), BurstSize::ThirtyTwo);
        assert_eq!(control.src_width().unwrap(), TransferWidth::Word);
        assert_eq!(control.dst_width().unwrap(), TransferWidth::Word);
        assert!(control.src_increment());
        assert!(control.dst_increment());
        assert!(control.tc_interrupt());
        let config = regs.read_config();
        assert_eq!(config.transfer_type().unwrap(), TransferType::MemoryToMemory);
        assert!(config.tc_interrupt_unmask());
        assert!(config.err_interrupt_unmask());
        // Setup never starts the channel.
        assert!(!config.enable());
    }

    #[test]
    fn peripheral_setup_uses_the_request_line_lookup() {
        let (mut dma, _) = harness();
        dma.setup(&TransferConfig {
            channel: Channel::Ch1,
            transfer_size: 32,
            kind: TransferKind::MemoryToPeripheral {
                src: 0x1000_2000,
                dst: RequestLine::Uart0Tx,
            },
            linked_list: 0,
        })
        .unwrap();
        let regs = dma.channel_regs(Channel::Ch1);
        assert_eq!(regs.read_src_addr(), 0x1000_2000);
        assert_eq!(regs.read_dest_addr(), RequestLine::Uart0Tx.register_address());
        let control = regs.read_control();
        assert_eq!(control.src_width().unwrap(), TransferWidth::Byte);
        assert_eq!(control.src_burst_size(), BurstSize::Single);
        assert!(control.src_increment());
        assert!(!control.dst_increment());
        let config = regs.read_config();
        assert_eq!(
            config.dest_peripheral().value(),
            u8::from(RequestLine::Uart0Tx)
        );
        assert_eq!(config.src_peripheral().value(), 0);
        assert_eq!(
            config.transfer_type().unwrap(),
            TransferType::MemoryToPeripheral
        );
    }

    #[test]
    fn chained_setup_programs_the_descriptor_head() {
        let (mut dma, mut model) = harness();
        let table: DescriptorTable<2> = DescriptorTable::new();
        let mut control = ChannelControl::new_with_raw_value(0);
        control.set_transfer_size(u12::new(8));
        control.set_src_width(TransferWidth::Word);
        control.set_dst_width(TransferWidth::Word);
        control.set_src_increment(true);
        control.set_dst_increment(true);
        table.set_segment(0, 0x1000_0400, 0x1000_0800, control);
        control.set_tc_interrupt(true);
        table.set_segment(1, 0x1000_0420, 0x1000_0820, control);
        table.link(0, 1);
        table.terminate(1);

        dma.setup(&TransferConfig {
            channel: Channel::Ch6,
            transfer_size: 8,
            kind: TransferKind::MemoryToMemory {
                src: 0x1000_0400,
                dst: 0x1000_0800,
                width: TransferWidth::Word,
            },
            linked_list: table.head_address(0),
        })
        .unwrap();

        // The channel points at the chain and the descriptors carry their next pointers.
        assert_eq!(
            dma.channel_regs(Channel::Ch6).read_lli(),
            table.head_address(0)
        );
        assert_eq!(table.descriptor(0).next(), table.head_address(1));
        assert_eq!(table.descriptor(1).next(), 0);
        assert!(!table.descriptor(0).control().tc_interrupt());
        assert!(table.descriptor(1).control().tc_interrupt());

        // The chain completes like a single-shot transfer: latched flag plus auto-disable.
        dma.set_enabled(Channel::Ch6, true);
        model.settle(&mut dma.regs);
        model.complete_channel(&mut dma.regs, 6);
        assert!(dma.status(StatusKind::TerminalCount, Channel::Ch6));
        assert!(!dma.status(StatusKind::EnabledChannel, Channel::Ch6));
    }

    #[test]
    fn oversized_transfer_is_rejected() {
        let (mut dma, _) = harness();
        assert!(matches!(
            dma.setup(&m2m_config(Channel::Ch0, 0x1000)),
            Err(SetupError::TransferSizeTooLarge(0x1000))
        ));
    }

    #[test]
    fn setup_on_live_channel_is_rejected_without_side_effects() {
        let (mut dma, mut model) = harness();
        dma.setup(&m2m_config(Channel::Ch2, 16)).unwrap();
        dma.set_enabled(Channel::Ch2, true);
        model.settle(&mut dma.regs);
        assert!(dma.is_enabled(Channel::Ch2));

        let src_before = dma.channel_regs(Channel::Ch2).read_src_addr();
        let control_before = dma.channel_regs(Channel::Ch2).read_control().raw_value();
        let result = dma.setup(&TransferConfig {
            channel: Channel::Ch2,
            transfer_size: 8,
            kind: TransferKind::MemoryToMemory {
                src: 0x2000_0000,
                dst: 0x2000_1000,
                width: TransferWidth::Byte,
            },
            linked_list: 0,
        });
        assert!(matches!(result, Err(SetupError::ChannelEnabled(Channel::Ch2))));
        // The live configuration is untouched by the rejected call.
        assert_eq!(dma.channel_regs(Channel::Ch2).read_src_addr(), src_before);
        assert_eq!(
            dma.channel_regs(Channel::Ch2).read_control().raw_value(),
            control_before
        );

        // After disabling the channel the same setup goes through.
        dma.set_enabled(Channel::Ch2, false);
        model.settle(&mut dma.regs);
        dma.setup(&m2m_config(Channel::Ch2, 8)).unwrap();
    }

    #[test]
    fn completion_latches_flags_and_auto_disables() {
        let (mut dma, mut model) = harness();
        dma.setup(&m2m_config(Channel::Ch3, 16)).unwrap();
        dma.set_enabled(Channel::Ch3, true);
        model.settle(&mut dma.regs);
        assert!(dma.status(StatusKind::EnabledChannel, Channel::Ch3));
        assert!(!dma.status(StatusKind::RawTerminalCount, Channel::Ch3));

        model.complete_channel(&mut dma.regs, 3);
        assert!(dma.status(StatusKind::RawTerminalCount, Channel::Ch3));
        assert!(dma.status(StatusKind::TerminalCount, Channel::Ch3));
        assert!(dma.status(StatusKind::Interrupt, Channel::Ch3));
        assert!(!dma.status(StatusKind::EnabledChannel, Channel::Ch3));
        // No crosstalk into the error surface or other channels.
        assert!(!dma.status(StatusKind::RawError, Channel::Ch3));
        assert!(!dma.status(StatusKind::RawTerminalCount, Channel::Ch2));

        // The flag stays latched until it is acknowledged.
        model.settle(&mut dma.regs);
        assert!(dma.status(StatusKind::RawTerminalCount, Channel::Ch3));

        dma.clear_interrupt(ClearKind::TerminalCount, Channel::Ch3);
        model.settle(&mut dma.regs);
        assert!(!dma.status(StatusKind::RawTerminalCount, Channel::Ch3));
        assert!(!dma.status(StatusKind::TerminalCount, Channel::Ch3));
        assert!(!dma.status(StatusKind::Interrupt, Channel::Ch3));
    }

    #[test]
    fn error_flags_are_acknowledged_independently() {
        let (mut dma, mut model) = harness();
        dma.setup(&m2m_config(Channel::Ch5, 4)).unwrap();
        dma.set_enabled(Channel::Ch5, true);
        model.settle(&mut dma.regs);

        model.fail_channel(&mut dma.regs, 5);
        assert!(dma.status(StatusKind::RawError, Channel::Ch5));
        assert!(dma.status(StatusKind::Error, Channel::Ch5));
        assert!(dma.status(StatusKind::Interrupt, Channel::Ch5));
        assert!(!dma.status(StatusKind::RawTerminalCount, Channel::Ch5));
        assert!(!dma.status(StatusKind::EnabledChannel, Channel::Ch5));

        dma.clear_interrupt(ClearKind::Error, Channel::Ch5);
        model.settle(&mut dma.regs);
        assert!(!dma.status(StatusKind::RawError, Channel::Ch5));
        assert!(!dma.status(StatusKind::Interrupt, Channel::Ch5));
    }

    #[test]
    fn masked_view_follows_the_unmask_bit() {
        let (mut dma, mut model) = harness();
        dma.setup(&m2m_config(Channel::Ch4, 4)).unwrap();
        // Mask the terminal count interrupt of the channel.
        channel_block(&mut dma.regs, 4).modify_config(|mut config| {
            config.set_tc_interrupt_unmask(false);
            config
        });
        dma.set_enabled(Channel::Ch4, true);
        model.settle(&mut dma.regs);

        model.complete_channel(&mut dma.regs, 4);
        // The raw view latches regardless, the masked view stays silent.
        assert!(dma.status(StatusKind::RawTerminalCount, Channel::Ch4));
        assert!(!dma.status(StatusKind::TerminalCount, Channel::Ch4));
        assert!(!dma.status(StatusKind::Interrupt, Channel::Ch4));
    }

    #[test]
    fn channel_priority_is_the_channel_number() {
        assert_eq!(u8::from(Channel::Ch0), 0);
        assert_eq!(u8::from(Channel::Ch7), 7);
        assert!(Channel::try_from(8).is_err());
    }
}
