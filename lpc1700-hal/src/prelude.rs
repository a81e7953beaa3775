//! Prelude with the types most applications need.
pub use crate::gpdma::{Channel, Gpdma, RequestLine, TransferConfig, TransferKind};
pub use crate::nvic::{Exception, Interrupt, InterruptController, IrqSource};
pub use crate::systick::SysTick;
pub use crate::time::*;
