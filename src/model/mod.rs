//! Controller-side configuration model
//!
//! State rebuilt on every upload pass:
//! - `PixelOutput` - one per physical port
//! - `SerialOutput` - the DMX output port
//! - `InputUniverse` - inbound universe table rows
//! - `SmartRemoteTable` - remotes per expansion board and bank

pub mod encode;
pub mod port;
pub mod serial;
pub mod smart;
pub mod universe;

pub use encode::{Direction, ExpansionType};
pub use port::PixelOutput;
pub use serial::SerialOutput;
pub use smart::{SmartRemote, SmartRemoteKind, SmartRemoteTable};
pub use universe::InputUniverse;
