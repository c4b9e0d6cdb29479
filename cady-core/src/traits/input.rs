//! Input collaborator traits

/// Trait for the front-panel button
///
/// Events latch until [`ButtonInput::clear_state`] is called, so a click
/// raised between two ticks is never lost.
pub trait ButtonInput {
    /// Button is currently held down
    fn pressed(&self) -> bool;

    /// A short press was released since the last clear
    fn clicked(&self) -> bool;

    /// Button has been held past the long-press threshold
    fn long_pressed(&self) -> bool;

    /// Clear latched events
    fn clear_state(&mut self);
}

/// Trait for the game selector
pub trait SelectorInput {
    /// Currently applied selection
    fn read(&self) -> u8;
}
