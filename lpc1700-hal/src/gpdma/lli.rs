//! Linked list descriptors for chained DMA transfers.
//!
//! The controller follows a chain of memory resident descriptors, each one reloading the
//! channel source address, destination address, next pointer and control word when the
//! previous segment completes. A zero next pointer terminates the chain.
//!
//! [DescriptorTable] keeps a fixed arena of descriptors and links them by index, so user code
//! never computes descriptor addresses itself. The table must live at least as long as the
//! transfer that walks it, a static table is the usual choice.
use core::mem::size_of;

use lpc1700::gpdma::ChannelControl;
use static_assertions::const_assert_eq;
use vcell::VolatileCell;

/// One linked list item in the exact layout the controller fetches.
///
/// All words are volatile cells because the hardware reads them behind the compiler's back
/// while the chain is being walked.
#[repr(C)]
pub struct Descriptor {
    src_addr: VolatileCell<u32>,
    dest_addr: VolatileCell<u32>,
    next: VolatileCell<u32>,
    control: VolatileCell<u32>,
}

const_assert_eq!(size_of::<Descriptor>(), 16);

impl Descriptor {
    pub const fn new() -> Self {
        Self {
            src_addr: VolatileCell::new(0),
            dest_addr: VolatileCell::new(0),
            next: VolatileCell::new(0),
            control: VolatileCell::new(0),
        }
    }

    #[inline]
    pub fn src_addr(&self) -> u32 {
        self.src_addr.get()
    }

    #[inline]
    pub fn dest_addr(&self) -> u32 {
        self.dest_addr.get()
    }

    #[inline]
    pub fn next(&self) -> u32 {
        self.next.get()
    }

    #[inline]
    pub fn control(&self) -> ChannelControl {
        ChannelControl::new_with_raw_value(self.control.get())
    }
}

impl Default for Descriptor {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed arena of [Descriptor]s with index based chain building.
pub struct DescriptorTable<const SLOTS: usize> {
    descriptors: [Descriptor; SLOTS],
}

impl<const SLOTS: usize> DescriptorTable<SLOTS> {
    pub const fn new() -> Self {
        Self {
            descriptors: [const { Descriptor::new() }; SLOTS],
        }
    }

    #[inline]
    pub const fn len(&self) -> usize {
        SLOTS
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        SLOTS == 0
    }

    /// Fill one descriptor with the addresses and control word of a chain segment.
    ///
    /// The next pointer of the slot is left as it is, use [Self::link] or [Self::terminate]
    /// to set it.
    pub fn set_segment(&self, index: usize, src_addr: u32, dest_addr: u32, control: ChannelControl) {
        let descr = &self.descriptors[index];
        descr.src_addr.set(src_addr);
        descr.dest_addr.set(dest_addr);
        descr.control.set(control.raw_value());
    }

    /// Chain the descriptor at `from` to the one at `to`.
    pub fn link(&self, from: usize, to: usize) {
        let target = &self.descriptors[to] as *const Descriptor as u32;
        self.descriptors[from].next.set(target);
    }

    /// Mark the descriptor at `index` as the end of its chain.
    pub fn terminate(&self, index: usize) {
        self.descriptors[index].next.set(0);
    }

    /// Address of a descriptor, suitable as the linked list head of a channel setup.
    #[inline]
    pub fn head_address(&self, index: usize) -> u32 {
        &self.descriptors[index] as *const Descriptor as u32
    }

    #[inline]
    pub fn descriptor(&self, index: usize) -> &Descriptor {
        &self.descriptors[index]
    }
}

impl<const SLOTS: usize> Default for DescriptorTable<SLOTS> {
    fn default() -> Self {
        Self::new()
    }
}
