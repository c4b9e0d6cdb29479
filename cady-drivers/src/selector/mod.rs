//! Game selectors
//!
//! The selected game index is only changed when the apply button is
//! clicked; between clicks [`SelectorInput::read`] returns the last applied
//! value. The hardware variant is picked at startup from the board
//! configuration.

pub mod dip;
pub mod encoder;

pub use dip::DipSelector;
pub use encoder::EncoderSelector;

use cady_core::traits::SelectorInput;
use cady_hal::InputPin;

/// Either selector variant behind one type
pub enum AnySelector<P> {
    Encoder(EncoderSelector<P>),
    Dip(DipSelector<P>),
}

impl<P: InputPin> AnySelector<P> {
    /// Sample the hardware; returns the new value when one was applied
    pub fn update(&mut self, now_ms: u32) -> Option<u8> {
        match self {
            AnySelector::Encoder(selector) => selector.update(now_ms),
            AnySelector::Dip(selector) => selector.update(now_ms),
        }
    }
}

impl<P: InputPin> SelectorInput for AnySelector<P> {
    fn read(&self) -> u8 {
        match self {
            AnySelector::Encoder(selector) => selector.read(),
            AnySelector::Dip(selector) => selector.read(),
        }
    }
}
