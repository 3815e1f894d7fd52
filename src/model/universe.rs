//! Input universe table entries

use tracing::debug;

/// Maps an inbound network universe to controller channels
///
/// `index` is the 1-based row in the controller's input table; zero
/// means the universe has not been placed yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputUniverse {
    pub index: u32,
    pub universe: u32,
    pub channels: u32,
    pub controller_start: u32,
}

impl InputUniverse {
    pub fn new(universe: u32, channels: u32) -> Self {
        Self {
            index: 0,
            universe,
            channels,
            controller_start: 0,
        }
    }

    pub fn controller_end(&self) -> u32 {
        (self.controller_start + self.channels).saturating_sub(1)
    }

    pub fn dump(&self) {
        debug!(
            "Index {} Uni {} UniSize {} ControllerStart {}",
            self.index, self.universe, self.channels, self.controller_start
        );
    }
}

/// Find the binding placed at table row `index`
pub fn by_index(universes: &[InputUniverse], index: u32) -> Option<&InputUniverse> {
    universes.iter().find(|u| u.index == index)
}

/// Find the binding for a network universe
pub fn by_universe_mut(
    universes: &mut [InputUniverse],
    universe: u32,
) -> Option<&mut InputUniverse> {
    universes.iter_mut().find(|u| u.universe == universe)
}
