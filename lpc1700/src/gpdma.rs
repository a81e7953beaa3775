//! # GPDMA (General Purpose DMA controller) register module.
use arbitrary_int::{u3, u5, u12};
use static_assertions::const_assert_eq;

pub const GPDMA_BASE_ADDR: usize = 0x5000_4000;

/// Number of independent transfer channels. Channel 0 has the highest hardware priority.
pub const NUM_CHANNELS: usize = 8;

/// Burst size encoding shared by the source and destination burst fields of [ChannelControl].
#[bitbybit::bitenum(u3, exhaustive = true)]
#[derive(Debug, PartialEq, Eq)]
pub enum BurstSize {
    Single = 0b000,
    Four = 0b001,
    Eight = 0b010,
    Sixteen = 0b011,
    ThirtyTwo = 0b100,
    SixtyFour = 0b101,
    OneHundredTwentyEight = 0b110,
    TwoHundredFiftySix = 0b111,
}

/// Transfer unit width encoding shared by the source and destination width fields of
/// [ChannelControl].
#[bitbybit::bitenum(u3, exhaustive = false)]
#[derive(Debug, PartialEq, Eq)]
pub enum TransferWidth {
    Byte = 0b000,
    Halfword = 0b001,
    Word = 0b010,
}

/// Transfer topology encoding of the [ChannelConfig] flow control field.
#[bitbybit::bitenum(u3, exhaustive = false)]
#[derive(Debug, PartialEq, Eq)]
pub enum TransferType {
    MemoryToMemory = 0b000,
    MemoryToPeripheral = 0b001,
    PeripheralToMemory = 0b010,
    PeripheralToPeripheral = 0b011,
}

/// DMA Configuration Register of the shared controller block.
#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct DmaConfig {
    /// AHB master endianness.
    #[bit(1, rw)]
    big_endian: bool,
    /// Controller enable. Must be set before any channel is enabled.
    #[bit(0, rw)]
    enable: bool,
}

/// Channel Control Register.
///
/// This word doubles as the control word of a memory-resident linked list descriptor, the
/// hardware loads it from there when it advances through a chain.
#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct ChannelControl {
    /// Raise the terminal count interrupt once this segment completes.
    #[bit(31, rw)]
    tc_interrupt: bool,
    /// AHB protection bits.
    #[bits(28..=30, rw)]
    protection: u3,
    /// Increment the destination address after each transfer unit.
    #[bit(27, rw)]
    dst_increment: bool,
    /// Increment the source address after each transfer unit.
    #[bit(26, rw)]
    src_increment: bool,
    #[bits(21..=23, rw)]
    dst_width: Option<TransferWidth>,
    #[bits(18..=20, rw)]
    src_width: Option<TransferWidth>,
    #[bits(15..=17, rw)]
    dst_burst_size: BurstSize,
    #[bits(12..=14, rw)]
    src_burst_size: BurstSize,
    /// Number of transfer units.
    #[bits(0..=11, rw)]
    transfer_size: u12,
}

/// Channel Configuration Register.
#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct ChannelConfig {
    /// Halt further requests while letting the active one drain.
    #[bit(18, rw)]
    halt: bool,
    /// Set by the hardware while data remains in the channel FIFO.
    #[bit(17, r)]
    active: bool,
    #[bit(16, rw)]
    lock: bool,
    /// Unmask the terminal count interrupt of this channel.
    #[bit(15, rw)]
    tc_interrupt_unmask: bool,
    /// Unmask the error interrupt of this channel.
    #[bit(14, rw)]
    err_interrupt_unmask: bool,
    #[bits(11..=13, rw)]
    transfer_type: Option<TransferType>,
    /// Request line of the destination peripheral, if the destination is a peripheral.
    #[bits(6..=10, rw)]
    dest_peripheral: u5,
    /// Request line of the source peripheral, if the source is a peripheral.
    #[bits(1..=5, rw)]
    src_peripheral: u5,
    /// Channel enable. Cleared by the hardware when a transfer or chain completes.
    #[bit(0, rw)]
    enable: bool,
}

/// Per-channel register block, repeated with a stride of 0x20 starting at offset 0x100.
#[derive(derive_mmio::Mmio)]
#[repr(C)]
pub struct Channel {
    /// Source address of the current segment.
    pub src_addr: u32,
    /// Destination address of the current segment.
    pub dest_addr: u32,
    /// Address of the next linked list descriptor, 0 for a single-shot transfer.
    pub lli: u32,
    /// Channel Control Register.
    pub control: ChannelControl,
    /// Channel Configuration Register.
    pub config: ChannelConfig,
    _reserved: [u32; 3],
}

const_assert_eq!(core::mem::size_of::<Channel>(), 0x20);

/// GPDMA registers.
///
/// The interrupt status surface is addressed by channel bit position across the low 8 bits of
/// each word. The clear registers are write-one-to-clear, latched flags are never cleared by a
/// read.
#[derive(derive_mmio::Mmio)]
#[repr(C)]
pub struct Gpdma {
    /// Masked status of the combined terminal count and error interrupt per channel.
    pub int_stat: u32,
    /// Masked terminal count interrupt status per channel.
    pub int_tc_stat: u32,
    /// Terminal count interrupt clear, write-one-to-clear.
    pub int_tc_clear: u32,
    /// Masked error interrupt status per channel.
    pub int_err_stat: u32,
    /// Error interrupt clear, write-one-to-clear.
    pub int_err_clr: u32,
    /// Unmasked terminal count status per channel.
    pub raw_int_tc_stat: u32,
    /// Unmasked error status per channel.
    pub raw_int_err_stat: u32,
    /// Enabled channels, one bit per channel.
    // TODO: Mark read-only as soon as the simulation helpers can poke RO registers.
    pub enbld_chns: u32,
    /// Software burst request per request line.
    pub soft_breq: u32,
    /// Software single request per request line.
    pub soft_sreq: u32,
    /// Software last burst request per request line.
    pub soft_lbreq: u32,
    /// Software last single request per request line.
    pub soft_lsreq: u32,
    /// DMA Configuration Register.
    pub config: DmaConfig,
    /// Request line synchronization disable per line.
    pub sync: u32,
    _reserved_0: [u32; 50],
    #[mmio(Inner)]
    pub ch0: Channel,
    #[mmio(Inner)]
    pub ch1: Channel,
    #[mmio(Inner)]
    pub ch2: Channel,
    #[mmio(Inner)]
    pub ch3: Channel,
    #[mmio(Inner)]
    pub ch4: Channel,
    #[mmio(Inner)]
    pub ch5: Channel,
    #[mmio(Inner)]
    pub ch6: Channel,
    #[mmio(Inner)]
    pub ch7: Channel,
}

const_assert_eq!(core::mem::size_of::<Gpdma>(), 0x200);

impl Gpdma {
    /// Create a new GPDMA MMIO instance at the fixed address of the AHB peripheral block.
    ///
    /// # Safety
    ///
    /// This API can be used to potentially create a driver to the same peripheral structure
    /// from multiple threads. The user must ensure that concurrent accesses are safe and do not
    /// interfere with each other.
    #[inline]
    pub const unsafe fn new_mmio_fixed() -> MmioGpdma<'static> {
        unsafe { Self::new_mmio_at(GPDMA_BASE_ADDR) }
    }
}
